use std::ffi::{c_char, CStr};
use std::ptr;

use clap_sys::factory::plugin_factory::clap_plugin_factory;
use clap_sys::host::clap_host;
use clap_sys::plugin::{clap_plugin, clap_plugin_descriptor};

use super::ffi_guard::guard_with_default;
use super::host::HostRef;
use super::plugin::ClapPlugin;
use crate::module;

pub(crate) static FACTORY: clap_plugin_factory = clap_plugin_factory {
    get_plugin_count: Some(get_plugin_count),
    get_plugin_descriptor: Some(get_plugin_descriptor),
    create_plugin: Some(create_plugin),
};

unsafe extern "C" fn get_plugin_count(_factory: *const clap_plugin_factory) -> u32 {
    guard_with_default("get_plugin_count", 0, || {
        module::get().map_or(0, |m| m.factory().plugin_count() as u32)
    })
}

unsafe extern "C" fn get_plugin_descriptor(
    _factory: *const clap_plugin_factory,
    index: u32,
) -> *const clap_plugin_descriptor {
    guard_with_default("get_plugin_descriptor", ptr::null(), || {
        module::get()
            .and_then(|m| m.clap_descriptor(index as usize))
            .map_or(ptr::null(), |d| d.as_raw())
    })
}

unsafe extern "C" fn create_plugin(
    _factory: *const clap_plugin_factory,
    host: *const clap_host,
    plugin_id: *const c_char,
) -> *const clap_plugin {
    guard_with_default("create_plugin", ptr::null(), || create(host, plugin_id))
}

unsafe fn create(host: *const clap_host, plugin_id: *const c_char) -> *const clap_plugin {
    let Some(module) = module::get() else {
        return ptr::null();
    };
    if plugin_id.is_null() {
        return ptr::null();
    }
    let Ok(plugin_id) = CStr::from_ptr(plugin_id).to_str() else {
        tracing::warn!("Plugin id is not valid UTF-8");
        return ptr::null();
    };

    let Some(desc) = module
        .factory()
        .registry()
        .position(plugin_id)
        .and_then(|index| module.clap_descriptor(index))
    else {
        tracing::warn!(plugin_id, "Host requested an unknown plugin");
        return ptr::null();
    };

    match module.factory().create(HostRef::new(host), plugin_id) {
        Ok(plugin) => ClapPlugin::into_raw(desc.as_raw(), plugin),
        Err(e) => {
            tracing::warn!(plugin_id, "Failed to create plugin: {}", e);
            ptr::null()
        }
    }
}
