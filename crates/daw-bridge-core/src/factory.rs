//! Plugin factory: enumerates descriptors and creates instances by id.

use std::sync::Arc;

use daw_bridge_runtime::RuntimeBridge;

use crate::descriptor::{DescriptorRegistry, PluginDescriptor};
use crate::error::{PluginError, Result};
use crate::plugin::{BridgedPlugin, HostHandle, Plugin};

pub struct PluginFactory {
    registry: Arc<DescriptorRegistry>,
    bridge: Arc<RuntimeBridge>,
}

impl PluginFactory {
    pub fn new(registry: Arc<DescriptorRegistry>, bridge: Arc<RuntimeBridge>) -> Self {
        Self { registry, bridge }
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.count()
    }

    pub fn descriptor_at(&self, index: usize) -> Option<&PluginDescriptor> {
        self.registry.describe(index)
    }

    /// Creates an instance in the `Created` state. No runtime call is made
    /// until the host calls `init`.
    pub fn create<H: HostHandle + 'static>(
        &self,
        host: H,
        plugin_id: &str,
    ) -> Result<Box<dyn Plugin>> {
        let descriptor = self.registry.find(plugin_id).ok_or_else(|| {
            tracing::warn!(plugin_id, "Host requested an unknown plugin");
            PluginError::UnknownPlugin(plugin_id.to_string())
        })?;

        tracing::debug!(plugin_id, "Creating plugin instance");
        Ok(Box::new(BridgedPlugin::new(descriptor, Arc::clone(&self.bridge), host)))
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<RuntimeBridge> {
        &self.bridge
    }
}
