//! Plugin configuration.
//!
//! Read from TOML next to the plugin bundle. Every field has a default, so a
//! missing file or a partial one is fine.
//!
//! ```toml
//! [runtime]
//! backend = "dylib"
//! library = "/opt/daw-bridge/libcontrol.so"
//! argv0 = "daw-bridge"
//! collection_interval = 256
//!
//! [log]
//! filter = "daw_bridge=debug"
//!
//! [plugin]
//! id = "com.dancer.daw-bridge"
//! name = "DAW Bridge"
//! features = ["utility", "analyzer"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use daw_bridge_core::PluginDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path of a config file that overrides discovery next to the bundle.
pub const CONFIG_ENV: &str = "DAW_BRIDGE_CONFIG";

/// Runtime library path; selects the `dylib` backend.
pub const RUNTIME_ENV: &str = "DAW_BRIDGE_RUNTIME";

/// Log filter directive, e.g. `daw_bridge=trace`.
pub const LOG_ENV: &str = "DAW_BRIDGE_LOG";

pub const DEFAULT_ARGV0: &str = "daw-bridge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process runtime populated by registered programs
    #[default]
    Managed,
    /// Control logic in a shared library
    Dylib,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub backend: Backend,

    /// Shared library for the `dylib` backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,

    /// Program name passed to runtime startup
    pub argv0: String,

    /// Collect the managed heap every N runtime calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_interval: Option<u32>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Managed,
            library: None,
            argv0: DEFAULT_ARGV0.to_string(),
            collection_interval: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive; `info` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub runtime: RuntimeSettings,
    pub log: LogSettings,
    pub plugin: PluginDescriptor,
}

impl BridgeSettings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Settings for the plugin bundle at `plugin_path`, using the process environment.
    pub fn discover(plugin_path: &Path) -> Result<Self> {
        Self::discover_with(plugin_path, |key| std::env::var(key).ok())
    }

    /// Same as [`discover`](Self::discover) with an explicit environment lookup.
    ///
    /// Lookup order: the file named by `DAW_BRIDGE_CONFIG`, then
    /// `<plugin_path>.toml`, then defaults. Environment overrides are applied
    /// last and the result is validated.
    pub fn discover_with(
        plugin_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let explicit = lookup(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from);
        let beside = plugin_path.with_extension("toml");

        let mut settings = match explicit {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config from {}", CONFIG_ENV);
                Self::load(&path)?
            }
            None if beside.is_file() => {
                tracing::debug!(path = %beside.display(), "Loading config beside plugin");
                Self::load(&beside)?
            }
            None => Self::default(),
        };

        settings.apply_overrides(lookup);
        settings.validate()?;
        Ok(settings)
    }

    /// Applies `DAW_BRIDGE_RUNTIME` and `DAW_BRIDGE_LOG`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(library) = lookup(RUNTIME_ENV).filter(|v| !v.is_empty()) {
            self.runtime.backend = Backend::Dylib;
            self.runtime.library = Some(PathBuf::from(library));
        }
        if let Some(filter) = lookup(LOG_ENV).filter(|v| !v.is_empty()) {
            self.log.filter = Some(filter);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.runtime.backend == Backend::Dylib && self.runtime.library.is_none() {
            return Err(Error::Config(
                "dylib backend requires runtime.library".to_string(),
            ));
        }
        if self.runtime.collection_interval == Some(0) {
            return Err(Error::Config(
                "runtime.collection_interval must be at least 1".to_string(),
            ));
        }
        if self.plugin.id.trim().is_empty() {
            return Err(Error::Config("plugin.id must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daw_bridge_core::DEFAULT_PLUGIN_ID;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.runtime.backend, Backend::Managed);
        assert_eq!(settings.runtime.argv0, "daw-bridge");
        assert_eq!(settings.plugin.id, DEFAULT_PLUGIN_ID);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let settings = BridgeSettings::from_toml_str(
            r#"
            [runtime]
            collection_interval = 64

            [plugin]
            name = "Custom Bridge"
            "#,
        )
        .unwrap();

        assert_eq!(settings.runtime.collection_interval, Some(64));
        assert_eq!(settings.runtime.argv0, "daw-bridge");
        assert_eq!(settings.plugin.name, "Custom Bridge");
        assert_eq!(settings.plugin.id, DEFAULT_PLUGIN_ID);
    }

    #[test]
    fn test_unknown_backend_is_a_parse_error() {
        let err = BridgeSettings::from_toml_str("[runtime]\nbackend = \"jvm\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_validate() {
        let mut settings = BridgeSettings::default();
        settings.runtime.backend = Backend::Dylib;
        assert!(matches!(settings.validate(), Err(Error::Config(_))));

        settings.runtime.library = Some(PathBuf::from("libcontrol.so"));
        assert!(settings.validate().is_ok());

        settings.runtime.collection_interval = Some(0);
        assert!(settings.validate().is_err());

        let mut settings = BridgeSettings::default();
        settings.plugin.id = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = BridgeSettings::default();
        settings.apply_overrides(env(&[
            (RUNTIME_ENV, "/opt/control.so"),
            (LOG_ENV, "daw_bridge=trace"),
        ]));

        assert_eq!(settings.runtime.backend, Backend::Dylib);
        assert_eq!(settings.runtime.library, Some(PathBuf::from("/opt/control.so")));
        assert_eq!(settings.log.filter.as_deref(), Some("daw_bridge=trace"));
    }

    #[test]
    fn test_discover_beside_plugin() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("daw-bridge.clap");
        fs::write(dir.path().join("daw-bridge.toml"), "[plugin]\nname = \"Beside\"\n").unwrap();

        let settings = BridgeSettings::discover_with(&plugin, env(&[])).unwrap();
        assert_eq!(settings.plugin.name, "Beside");
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("daw-bridge.clap");
        let explicit = dir.path().join("explicit.toml");
        fs::write(dir.path().join("daw-bridge.toml"), "[plugin]\nname = \"Beside\"\n").unwrap();
        fs::write(&explicit, "[plugin]\nname = \"Explicit\"\n").unwrap();

        let lookup = env(&[(CONFIG_ENV, explicit.to_str().unwrap())]);
        let settings = BridgeSettings::discover_with(&plugin, lookup).unwrap();
        assert_eq!(settings.plugin.name, "Explicit");
    }

    #[test]
    fn test_discover_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("daw-bridge.clap");
        let missing = dir.path().join("missing.toml");

        let lookup = env(&[(CONFIG_ENV, missing.to_str().unwrap())]);
        let err = BridgeSettings::discover_with(&plugin, lookup).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_discover_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("daw-bridge.clap");

        let settings = BridgeSettings::discover_with(&plugin, env(&[])).unwrap();
        assert_eq!(settings, BridgeSettings::default());
    }

    #[test]
    fn test_discover_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("daw-bridge.clap");
        fs::write(dir.path().join("daw-bridge.toml"), "[runtime]\nbackend = \"dylib\"\n").unwrap();

        let err = BridgeSettings::discover_with(&plugin, env(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
