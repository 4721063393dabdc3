//! Plugin lifecycle, descriptors and factory for daw-bridge
//!
//! Host-facing plugin semantics with no ABI types: the CLAP shim in the root
//! crate translates host callbacks into calls on [`Plugin`].
//!
//! ## Architecture
//!
//! - [`PluginFactory`] - enumerates a [`DescriptorRegistry`] and creates instances
//! - [`BridgedPlugin`] - one instance; enforces the [`LifecycleState`] machine and
//!   forwards each transition to the embedded runtime through a shared
//!   [`RuntimeBridge`](daw_bridge_runtime::RuntimeBridge)
//! - [`HostHandle`] - non-owning back-reference to the host
//!
//! ## Usage
//!
//! ```ignore
//! use daw_bridge_core::{DescriptorRegistry, PluginDescriptor, PluginFactory};
//!
//! let registry = Arc::new(DescriptorRegistry::single(PluginDescriptor::default())?);
//! let factory = PluginFactory::new(registry, bridge);
//!
//! let plugin = factory.create((), "com.dancer.daw-bridge")?;
//! plugin.init()?;
//! plugin.activate(48000.0, 64, 512)?;
//! plugin.start_processing()?;
//! plugin.process()?;
//! plugin.destroy();
//! ```

pub mod error;
pub use error::{PluginError, Result};

mod lifecycle;
pub use lifecycle::{AtomicLifecycle, LifecycleState, Transition};

mod descriptor;
pub use descriptor::{DescriptorRegistry, PluginDescriptor, DEFAULT_PLUGIN_ID};

mod plugin;
pub use plugin::{ActivationConfig, BridgedPlugin, HostHandle, Plugin};

mod factory;
pub use factory::PluginFactory;
