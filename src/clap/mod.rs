//! CLAP ABI surface: `clap_entry`, the plugin factory and the per-instance
//! vtable. Every callback maps results to the bool, null or status the ABI
//! expects, and none of them lets a panic unwind into the host.

mod ffi_guard;

mod descriptor;
pub use descriptor::ClapDescriptor;

mod host;
pub use host::HostRef;

mod plugin;

mod factory;

mod entry;
pub use entry::clap_entry;

/// Plugin instances handed to the host and not yet destroyed.
pub fn live_instance_count() -> usize {
    plugin::live_count()
}
