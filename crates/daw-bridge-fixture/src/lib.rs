//! Control logic exported as `daw_bridge_*` C symbols.
//!
//! Exports every entry point except `daw_bridge_deactivate`, plus a few
//! `daw_bridge_fixture_*` accessors so tests can read back what the bridge
//! passed in. The `argv0` handed to `daw_bridge_startup` selects a mode:
//!
//! - [`FAIL_STARTUP`] - startup returns `false`
//! - [`NULL_INIT`] - `daw_bridge_init` returns null
//! - anything else - normal sessions

use std::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

pub const FAIL_STARTUP: &str = "fail-startup";

pub const NULL_INIT: &str = "null-init";

static NULL_INIT_MODE: AtomicBool = AtomicBool::new(false);

static LIVE_SESSIONS: AtomicI64 = AtomicI64::new(0);

/// Per-plugin state owned by the library between init and destroy.
#[derive(Debug, Default)]
pub struct Session {
    pub sample_rate: f64,
    pub max_frames: i64,
    pub ticks: u64,
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
unsafe fn session<'a>(plugin: *mut c_void) -> Option<&'a mut Session> {
    (plugin as *mut Session).as_mut()
}

/// # Safety
/// `argv0` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_startup(argv0: *const c_char) -> bool {
    let mode = if argv0.is_null() {
        String::new()
    } else {
        CStr::from_ptr(argv0).to_string_lossy().into_owned()
    };
    NULL_INIT_MODE.store(mode == NULL_INIT, Ordering::SeqCst);
    mode != FAIL_STARTUP
}

#[no_mangle]
pub extern "C" fn daw_bridge_init() -> *mut c_void {
    if NULL_INIT_MODE.load(Ordering::SeqCst) {
        return std::ptr::null_mut();
    }
    LIVE_SESSIONS.fetch_add(1, Ordering::SeqCst);
    Box::into_raw(Box::<Session>::default()).cast()
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_destroy(plugin: *mut c_void) {
    if !plugin.is_null() {
        drop(Box::from_raw(plugin as *mut Session));
        LIVE_SESSIONS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_activate(
    plugin: *mut c_void,
    sample_rate: f64,
    max_frames: i64,
) {
    if let Some(session) = session(plugin) {
        session.sample_rate = sample_rate;
        session.max_frames = max_frames;
    }
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_process(plugin: *mut c_void) {
    if let Some(session) = session(plugin) {
        session.ticks += 1;
    }
}

/// Sessions created and not yet destroyed.
#[no_mangle]
pub extern "C" fn daw_bridge_fixture_live_sessions() -> i64 {
    LIVE_SESSIONS.load(Ordering::SeqCst)
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_fixture_sample_rate(plugin: *mut c_void) -> f64 {
    session(plugin).map_or(0.0, |s| s.sample_rate)
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_fixture_max_frames(plugin: *mut c_void) -> i64 {
    session(plugin).map_or(0, |s| s.max_frames)
}

/// # Safety
/// `plugin` must come from `daw_bridge_init` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn daw_bridge_fixture_ticks(plugin: *mut c_void) -> u64 {
    session(plugin).map_or(0, |s| s.ticks)
}
