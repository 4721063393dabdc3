//! C view of a [`PluginDescriptor`].

use std::ffi::{c_char, CString};
use std::ptr;

use clap_sys::plugin::clap_plugin_descriptor;
use clap_sys::version::CLAP_VERSION;
use daw_bridge_core::PluginDescriptor;

use crate::error::Result;

/// Owns the C strings behind a `clap_plugin_descriptor`.
///
/// The raw descriptor points into `strings` and `features`; both are never
/// mutated after construction, so the pointers stay valid as long as `self`.
pub struct ClapDescriptor {
    raw: clap_plugin_descriptor,
    id: String,
    _strings: Vec<CString>,
    _features: Vec<*const c_char>,
}

// SAFETY: the raw pointers only reference heap buffers owned by this value,
// which are immutable after construction.
unsafe impl Send for ClapDescriptor {}
unsafe impl Sync for ClapDescriptor {}

impl ClapDescriptor {
    pub fn new(descriptor: &PluginDescriptor) -> Result<Self> {
        let fields = [
            &descriptor.id,
            &descriptor.name,
            &descriptor.vendor,
            &descriptor.url,
            &descriptor.manual_url,
            &descriptor.support_url,
            &descriptor.version,
            &descriptor.description,
        ];
        let mut strings = fields
            .iter()
            .map(|field| CString::new(field.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let feature_strings = descriptor
            .features
            .iter()
            .map(|feature| CString::new(feature.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut features: Vec<*const c_char> = feature_strings.iter().map(|f| f.as_ptr()).collect();
        features.push(ptr::null());

        let raw = clap_plugin_descriptor {
            clap_version: CLAP_VERSION,
            id: strings[0].as_ptr(),
            name: strings[1].as_ptr(),
            vendor: strings[2].as_ptr(),
            url: strings[3].as_ptr(),
            manual_url: strings[4].as_ptr(),
            support_url: strings[5].as_ptr(),
            version: strings[6].as_ptr(),
            description: strings[7].as_ptr(),
            features: features.as_ptr(),
        };
        strings.extend(feature_strings);

        Ok(Self {
            raw,
            id: descriptor.id.clone(),
            _strings: strings,
            _features: features,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_raw(&self) -> *const clap_plugin_descriptor {
        &self.raw
    }
}
