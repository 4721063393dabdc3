use std::ffi::{c_char, c_void, CStr};
use std::path::PathBuf;
use std::ptr;

use clap_sys::entry::clap_plugin_entry;
use clap_sys::factory::plugin_factory::CLAP_PLUGIN_FACTORY_ID;
use clap_sys::version::CLAP_VERSION;

use super::factory::FACTORY;
use super::ffi_guard::guard_with_default;
use crate::module;

/// Entry point the host resolves in the plugin bundle.
#[no_mangle]
#[allow(non_upper_case_globals)]
pub static clap_entry: clap_plugin_entry = clap_plugin_entry {
    clap_version: CLAP_VERSION,
    init: Some(entry_init),
    deinit: Some(entry_deinit),
    get_factory: Some(entry_get_factory),
};

unsafe extern "C" fn entry_init(plugin_path: *const c_char) -> bool {
    guard_with_default("clap_entry.init", false, || {
        let path = if plugin_path.is_null() {
            PathBuf::new()
        } else {
            PathBuf::from(CStr::from_ptr(plugin_path).to_string_lossy().into_owned())
        };
        module::init(&path)
    })
}

/// Does nothing. The runtime and module stay up until process exit, and a
/// later `init` returns the first outcome.
unsafe extern "C" fn entry_deinit() {}

unsafe extern "C" fn entry_get_factory(factory_id: *const c_char) -> *const c_void {
    guard_with_default("clap_entry.get_factory", ptr::null(), || {
        if factory_id.is_null() || module::get().is_none() {
            return ptr::null();
        }
        if CStr::from_ptr(factory_id) == CLAP_PLUGIN_FACTORY_ID {
            ptr::addr_of!(FACTORY).cast()
        } else {
            ptr::null()
        }
    })
}
