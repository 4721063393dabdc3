//! `clap_plugin` vtable over a boxed [`Plugin`].
//!
//! Main-thread callbacks look the pointer up in the live-instance registry
//! first, so a second `destroy` (or a call after it) is ignored. Audio-thread
//! callbacks trust the host and never lock. Every callback is panic-guarded.

use std::ffi::{c_char, c_void};
use std::ptr;

use clap_sys::plugin::{clap_plugin, clap_plugin_descriptor};
use clap_sys::process::{clap_process, clap_process_status, CLAP_PROCESS_CONTINUE};
use daw_bridge_core::Plugin;
use parking_lot::Mutex;

use super::ffi_guard::{guard_void, guard_with_default};

static LIVE_INSTANCES: Mutex<Vec<usize>> = Mutex::new(Vec::new());

pub(crate) struct ClapPlugin {
    raw: clap_plugin,
    plugin: Box<dyn Plugin>,
}

impl ClapPlugin {
    /// Boxes `plugin`, registers it as live and returns the pointer for the host.
    pub(crate) fn into_raw(
        desc: *const clap_plugin_descriptor,
        plugin: Box<dyn Plugin>,
    ) -> *const clap_plugin {
        let instance = Box::into_raw(Box::new(Self {
            raw: clap_plugin {
                desc,
                plugin_data: ptr::null_mut(),
                init: Some(init),
                destroy: Some(destroy),
                activate: Some(activate),
                deactivate: Some(deactivate),
                start_processing: Some(start_processing),
                stop_processing: Some(stop_processing),
                reset: Some(reset),
                process: Some(process),
                get_extension: Some(get_extension),
                on_main_thread: Some(on_main_thread),
            },
            plugin,
        }));

        // SAFETY: `instance` was just allocated and is uniquely owned here.
        unsafe {
            (*instance).raw.plugin_data = instance as *mut c_void;
            let raw = ptr::addr_of!((*instance).raw);
            LIVE_INSTANCES.lock().push(raw as usize);
            raw
        }
    }
}

pub(crate) fn live_count() -> usize {
    LIVE_INSTANCES.lock().len()
}

fn is_live(plugin: *const clap_plugin) -> bool {
    LIVE_INSTANCES.lock().contains(&(plugin as usize))
}

/// # Safety
/// `plugin` must be null or a pointer returned by [`ClapPlugin::into_raw`]
/// that has not been destroyed.
unsafe fn instance<'a>(plugin: *const clap_plugin) -> Option<&'a dyn Plugin> {
    let plugin = plugin.as_ref()?;
    let instance = (plugin.plugin_data as *const ClapPlugin).as_ref()?;
    Some(instance.plugin.as_ref())
}

/// Main-thread lookup: `None` for pointers that are not live.
unsafe fn live_instance<'a>(plugin: *const clap_plugin) -> Option<&'a dyn Plugin> {
    if !is_live(plugin) {
        tracing::warn!(ptr = ?plugin, "Host called a plugin that is not live");
        return None;
    }
    instance(plugin)
}

unsafe extern "C" fn init(plugin: *const clap_plugin) -> bool {
    guard_with_default("init", false, || {
        live_instance(plugin).is_some_and(|p| p.init().is_ok())
    })
}

unsafe extern "C" fn destroy(plugin: *const clap_plugin) {
    guard_void("destroy", || {
        let removed = {
            let mut live = LIVE_INSTANCES.lock();
            match live.iter().position(|p| *p == plugin as usize) {
                Some(index) => {
                    live.swap_remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            tracing::debug!(ptr = ?plugin, "Ignoring destroy of a plugin that is not live");
            return;
        }

        let instance = Box::from_raw((*plugin).plugin_data as *mut ClapPlugin);
        instance.plugin.destroy();
    })
}

unsafe extern "C" fn activate(
    plugin: *const clap_plugin,
    sample_rate: f64,
    min_frames_count: u32,
    max_frames_count: u32,
) -> bool {
    guard_with_default("activate", false, || {
        live_instance(plugin).is_some_and(|p| {
            p.activate(sample_rate, min_frames_count, max_frames_count)
                .is_ok()
        })
    })
}

unsafe extern "C" fn deactivate(plugin: *const clap_plugin) {
    guard_void("deactivate", || {
        if let Some(p) = live_instance(plugin) {
            let _ = p.deactivate();
        }
    })
}

unsafe extern "C" fn start_processing(plugin: *const clap_plugin) -> bool {
    guard_with_default("start_processing", false, || {
        instance(plugin).is_some_and(|p| p.start_processing().is_ok())
    })
}

unsafe extern "C" fn stop_processing(plugin: *const clap_plugin) {
    guard_void("stop_processing", || {
        if let Some(p) = instance(plugin) {
            let _ = p.stop_processing();
        }
    })
}

unsafe extern "C" fn reset(plugin: *const clap_plugin) {
    guard_void("reset", || {
        if let Some(p) = instance(plugin) {
            let _ = p.reset();
        }
    })
}

/// Always continues; a failed, skipped or panicking tick is not fatal for the host.
unsafe extern "C" fn process(
    plugin: *const clap_plugin,
    _process: *const clap_process,
) -> clap_process_status {
    guard_void("process", || {
        if let Some(p) = instance(plugin) {
            let _ = p.process();
        }
    });
    CLAP_PROCESS_CONTINUE
}

unsafe extern "C" fn get_extension(
    _plugin: *const clap_plugin,
    _id: *const c_char,
) -> *const c_void {
    ptr::null()
}

unsafe extern "C" fn on_main_thread(plugin: *const clap_plugin) {
    guard_void("on_main_thread", || {
        if let Some(p) = live_instance(plugin) {
            p.on_main_thread();
        }
    })
}
