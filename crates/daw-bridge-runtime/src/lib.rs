//! Embedded-runtime boundary for daw-bridge
//!
//! Plugin logic lives in an embedded runtime and is reached only through five
//! named entry points (`daw_bridge_init`, `daw_bridge_destroy`,
//! `daw_bridge_activate`, `daw_bridge_deactivate`, `daw_bridge_process`).
//! This crate resolves those names, marshals native arguments into runtime
//! values, and keeps runtime handles pinned while native code refers to them.
//!
//! ## Backends
//!
//! - [`ManagedRuntime`] - in-process, garbage-collected heap; control logic
//!   registers native functions at startup
//! - [`DylibRuntime`] - control logic in a shared library exporting the
//!   `daw_bridge_*` symbols (`dylib` feature)
//!
//! ## Usage
//!
//! ```ignore
//! use daw_bridge_runtime::{ManagedRuntime, RuntimeBridge};
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(ManagedRuntime::startup("daw-bridge", &[my_program]));
//! let bridge = RuntimeBridge::new(runtime);
//!
//! let handle = bridge.init()?;            // pinned until dropped
//! bridge.activate(&handle, 48000.0, 512)?;
//! bridge.process(&handle)?;
//! bridge.destroy(handle)?;                // always unpins
//! ```

pub mod error;
pub use error::{Result, RuntimeError};

mod value;
pub use value::{Callable, HandleId, RootId, Value};

mod runtime;
pub use runtime::EmbeddedRuntime;

mod entry_points;
pub use entry_points::{EntryPoint, EntryPointTable};

mod pinned;
pub use pinned::PinnedHandle;

mod bridge;
pub use bridge::RuntimeBridge;

pub mod managed;
pub use managed::{Heap, ManagedRuntime, NativeFn, Program};

#[cfg(feature = "dylib")]
pub mod dylib;
#[cfg(feature = "dylib")]
pub use dylib::DylibRuntime;
