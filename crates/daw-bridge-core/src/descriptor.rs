//! Plugin descriptors and the registry the factory enumerates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, Result};

pub const DEFAULT_PLUGIN_ID: &str = "com.dancer.daw-bridge";

/// Immutable metadata identifying one plugin kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginDescriptor {
    /// Globally unique, stable across versions
    pub id: String,

    pub name: String,

    pub vendor: String,

    pub url: String,

    pub manual_url: String,

    pub support_url: String,

    pub version: String,

    pub description: String,

    /// Ordered feature tags, e.g. `"audio-effect"`, `"utility"`
    pub features: Vec<String>,
}

impl Default for PluginDescriptor {
    fn default() -> Self {
        Self {
            id: DEFAULT_PLUGIN_ID.to_string(),
            name: "DAW Bridge".to_string(),
            vendor: "Dancer".to_string(),
            url: "https://github.com/dancer/me".to_string(),
            manual_url: String::new(),
            support_url: String::new(),
            version: "1.0.0".to_string(),
            description: "MCP Bridge for AI control of DAW".to_string(),
            features: vec!["utility".to_string(), "analyzer".to_string()],
        }
    }
}

impl PluginDescriptor {
    /// Create a descriptor with required fields; everything else is empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: String::new(),
            url: String::new(),
            manual_url: String::new(),
            support_url: String::new(),
            version: "1.0.0".to_string(),
            description: String::new(),
            features: Vec::new(),
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }
}

/// Fixed, process-wide list of plugin kinds.
///
/// Indices are stable for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    descriptors: Vec<Arc<PluginDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new(descriptors: Vec<PluginDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if descriptor.id.trim().is_empty() {
                return Err(PluginError::InvalidDescriptor(format!(
                    "plugin '{}' has an empty id",
                    descriptor.name
                )));
            }
            if !seen.insert(descriptor.id.as_str()) {
                return Err(PluginError::InvalidDescriptor(format!(
                    "duplicate plugin id '{}'",
                    descriptor.id
                )));
            }
        }

        Ok(Self {
            descriptors: descriptors.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn single(descriptor: PluginDescriptor) -> Result<Self> {
        Self::new(vec![descriptor])
    }

    pub fn count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn describe(&self, index: usize) -> Option<&PluginDescriptor> {
        self.descriptors.get(index).map(Arc::as_ref)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.id == id)
    }

    /// Shared descriptor for `id`, as held by plugin instances.
    pub fn find(&self, id: &str) -> Option<Arc<PluginDescriptor>> {
        self.position(id).map(|index| Arc::clone(&self.descriptors[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.descriptors.iter().map(Arc::as_ref)
    }
}
