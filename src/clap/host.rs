use std::ffi::CStr;

use clap_sys::host::clap_host;
use daw_bridge_core::HostHandle;

/// Borrowed `clap_host` pointer. The host outlives every plugin it creates.
pub struct HostRef {
    host: *const clap_host,
}

// SAFETY: the host struct is immutable and valid for the instance lifetime;
// only its string fields are read.
unsafe impl Send for HostRef {}
unsafe impl Sync for HostRef {}

impl HostRef {
    pub fn new(host: *const clap_host) -> Self {
        Self { host }
    }
}

impl HostHandle for HostRef {
    fn name(&self) -> Option<String> {
        // SAFETY: non-null host pointers come from the host's create_plugin call.
        let host = unsafe { self.host.as_ref()? };
        if host.name.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(host.name) };
        Some(name.to_string_lossy().into_owned())
    }
}
