//! # daw-bridge - CLAP plugin backed by an embedded runtime
//!
//! The plugin's behavior lives in an embedded runtime; this crate is the
//! adapter a CLAP host loads.
//!
//! ## Architecture
//!
//! - **daw-bridge-runtime** - runtime boundary (entry points, pinned handles,
//!   managed and shared-library backends)
//! - **daw-bridge-core** - lifecycle state machine, descriptors, factory
//! - this crate - `clap_entry`, process-wide module, configuration, logging
//!
//! ## Control logic
//!
//! With the default `managed` backend, register a program before the host
//! calls `clap_entry.init`:
//!
//! ```ignore
//! use daw_bridge::{register_program, ManagedRuntime};
//!
//! fn control(runtime: &ManagedRuntime) {
//!     runtime.register("daw_bridge_init", |heap, _| Ok(heap.alloc(MyState::default())));
//!     runtime.register("daw_bridge_process", |heap, args| { /* ... */ });
//! }
//!
//! register_program(control);
//! ```
//!
//! With `backend = "dylib"` (or `DAW_BRIDGE_RUNTIME=/path/to/lib`), the
//! `daw_bridge_*` symbols are loaded from a shared library instead.
//!
//! ## Feature Flags
//!
//! - `dylib` (default) - shared-library runtime backend

pub mod clap;
pub mod config;
pub mod error;
pub mod logging;
pub mod module;

pub use config::{Backend, BridgeSettings};
pub use error::{Error, Result};
pub use module::{register_program, Module};

pub use daw_bridge_core::{
    DescriptorRegistry, LifecycleState, Plugin, PluginDescriptor, PluginError, PluginFactory,
};
pub use daw_bridge_runtime::{EmbeddedRuntime, Heap, ManagedRuntime, Program, RuntimeError, Value};
