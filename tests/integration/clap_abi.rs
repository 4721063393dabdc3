//! CLAP ABI integration tests
//!
//! Acts as a minimal host: resolves `clap_entry`, fetches the factory and
//! drives an instance through raw `clap_plugin` pointers.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::sync::{Mutex, MutexGuard, OnceLock};

use clap_sys::factory::plugin_factory::{clap_plugin_factory, CLAP_PLUGIN_FACTORY_ID};
use clap_sys::host::clap_host;
use clap_sys::plugin::clap_plugin;
use clap_sys::process::{clap_process, CLAP_PROCESS_CONTINUE};
use clap_sys::version::CLAP_VERSION;
use daw_bridge::clap::{clap_entry, live_instance_count};
use daw_bridge::EmbeddedRuntime;

use crate::helpers::*;

const PLUGIN_ID: &CStr = c"com.dancer.daw-bridge";

// Instances and the live registry are process-wide.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn test_host() -> clap_host {
    clap_host {
        clap_version: CLAP_VERSION,
        host_data: ptr::null_mut(),
        name: c"daw-bridge test host".as_ptr(),
        vendor: c"daw-bridge".as_ptr(),
        url: c"https://github.com/dancer/daw-bridge".as_ptr(),
        version: c"0.0.1".as_ptr(),
        get_extension: None,
        request_restart: None,
        request_process: None,
        request_callback: None,
    }
}

fn entry_init() -> bool {
    let path = std::env::temp_dir().join("daw-bridge-abi-test.clap");
    let path = CString::new(path.to_string_lossy().into_owned()).unwrap();
    unsafe { clap_entry.init.unwrap()(path.as_ptr()) }
}

fn factory() -> &'static clap_plugin_factory {
    static BOOTSTRAP: OnceLock<bool> = OnceLock::new();
    let ready = *BOOTSTRAP.get_or_init(|| {
        daw_bridge::register_program(control_program);
        entry_init()
    });
    assert!(ready, "clap_entry.init failed");

    let factory = unsafe { clap_entry.get_factory.unwrap()(CLAP_PLUGIN_FACTORY_ID.as_ptr()) };
    assert!(!factory.is_null());
    unsafe { &*(factory as *const clap_plugin_factory) }
}

fn create(
    factory: &clap_plugin_factory,
    host: &clap_host,
    id: *const c_char,
) -> *const clap_plugin {
    unsafe { factory.create_plugin.unwrap()(factory, host, id) }
}

/// Activates with the shared test rate and frame bounds.
unsafe fn activate(plugin: *const clap_plugin) -> bool {
    (*plugin).activate.unwrap()(plugin, TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES)
}

fn root_count() -> usize {
    daw_bridge::module::get().unwrap().bridge().runtime().root_count()
}

#[test]
fn test_entry_init_is_repeatable() {
    let _serial = serial();
    factory();
    assert!(entry_init());
    unsafe { clap_entry.deinit.unwrap()() };
    assert!(entry_init());
}

#[test]
fn test_get_factory_rejects_other_ids() {
    let _serial = serial();
    factory();
    let get_factory = clap_entry.get_factory.unwrap();
    assert!(unsafe { get_factory(c"clap.preset-discovery-factory/2".as_ptr()) }.is_null());
    assert!(unsafe { get_factory(ptr::null()) }.is_null());
}

#[test]
fn test_descriptor_enumeration() {
    let _serial = serial();
    let factory = factory();

    assert_eq!(unsafe { factory.get_plugin_count.unwrap()(factory) }, 1);

    let desc = unsafe { factory.get_plugin_descriptor.unwrap()(factory, 0) };
    assert!(!desc.is_null());
    let desc = unsafe { &*desc };
    assert_eq!(unsafe { CStr::from_ptr(desc.id) }, PLUGIN_ID);
    assert_eq!(unsafe { CStr::from_ptr(desc.name) }.to_str().unwrap(), "DAW Bridge");
    assert!(unsafe { factory.get_plugin_descriptor.unwrap()(factory, 1) }.is_null());
}

#[test]
fn test_create_rejects_bad_ids() {
    let _serial = serial();
    let factory = factory();
    let host = test_host();
    let before = live_instance_count();

    assert!(create(factory, &host, c"com.example.unknown".as_ptr()).is_null());
    assert!(create(factory, &host, ptr::null()).is_null());
    assert!(create(factory, &host, c"\xff\xfe".as_ptr()).is_null());
    assert_eq!(live_instance_count(), before);
}

#[test]
fn test_full_lifecycle() {
    let _serial = serial();
    let factory = factory();
    let host = test_host();
    let live_before = live_instance_count();

    let plugin = create(factory, &host, PLUGIN_ID.as_ptr());
    assert!(!plugin.is_null());
    assert_eq!(live_instance_count(), live_before + 1);

    let vtable = unsafe { &*plugin };
    assert_eq!(unsafe { CStr::from_ptr((*vtable.desc).id) }, PLUGIN_ID);

    unsafe {
        assert!(vtable.init.unwrap()(plugin));
        assert_eq!(root_count(), 1);
        assert!(activate(plugin));
        assert!(vtable.start_processing.unwrap()(plugin));

        let process: clap_process = std::mem::zeroed();
        for _ in 0..100 {
            assert_eq!(vtable.process.unwrap()(plugin, &process), CLAP_PROCESS_CONTINUE);
        }

        vtable.reset.unwrap()(plugin);
        vtable.stop_processing.unwrap()(plugin);
        vtable.deactivate.unwrap()(plugin);
        vtable.on_main_thread.unwrap()(plugin);
        assert!(vtable.get_extension.unwrap()(plugin, c"clap.params".as_ptr()).is_null());

        vtable.destroy.unwrap()(plugin);
    }

    assert_eq!(live_instance_count(), live_before);
    assert_eq!(root_count(), 0);
}

#[test]
fn test_process_outside_processing_still_continues() {
    let _serial = serial();
    let factory = factory();
    let host = test_host();

    let plugin = create(factory, &host, PLUGIN_ID.as_ptr());
    let vtable = unsafe { &*plugin };
    unsafe {
        assert!(vtable.init.unwrap()(plugin));
        assert!(activate(plugin));

        let process: clap_process = std::mem::zeroed();
        assert_eq!(vtable.process.unwrap()(plugin, &process), CLAP_PROCESS_CONTINUE);

        assert!(!activate(plugin));
        vtable.destroy.unwrap()(plugin);
    }
}

#[test]
fn test_double_destroy_is_absorbed() {
    let _serial = serial();
    let factory = factory();
    let host = test_host();
    let live_before = live_instance_count();

    let plugin = create(factory, &host, PLUGIN_ID.as_ptr());
    let (init, destroy) = {
        let vtable = unsafe { &*plugin };
        (vtable.init.unwrap(), vtable.destroy.unwrap())
    };

    unsafe {
        assert!(init(plugin));
        destroy(plugin);
        destroy(plugin);
        assert!(!init(plugin));
    }

    assert_eq!(live_instance_count(), live_before);
    assert_eq!(root_count(), 0);
}
