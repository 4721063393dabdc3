//! Process-wide plugin module.
//!
//! Created by the first `clap_entry.init` call and kept until process exit.
//! Everything the CLAP shim hands out (factory, descriptors, instances)
//! points into this singleton.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use daw_bridge_core::{DescriptorRegistry, PluginFactory};
use daw_bridge_runtime::{EmbeddedRuntime, EntryPoint, ManagedRuntime, Program, RuntimeBridge};
use parking_lot::Mutex;

use crate::clap::ClapDescriptor;
use crate::config::{Backend, BridgeSettings, RuntimeSettings};
use crate::error::{Error, Result};
use crate::logging;

static MODULE: OnceLock<Option<Module>> = OnceLock::new();

static PROGRAMS: Mutex<Vec<Program>> = Mutex::new(Vec::new());

/// Adds a program the managed runtime runs at startup.
///
/// Programs register the `daw_bridge_*` entry points. Only programs
/// registered before the first `clap_entry.init` take part.
pub fn register_program(program: Program) {
    PROGRAMS.lock().push(program);
}

pub struct Module {
    factory: PluginFactory,
    descriptors: Vec<ClapDescriptor>,
}

impl Module {
    /// Loads settings, starts the runtime and builds the factory.
    pub fn bootstrap(plugin_path: &Path) -> Result<Self> {
        let settings = BridgeSettings::discover(plugin_path)?;
        logging::init(&settings.log);
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: BridgeSettings) -> Result<Self> {
        settings.validate()?;

        let runtime = start_runtime(&settings.runtime)?;
        let bridge = Arc::new(RuntimeBridge::new(runtime));
        if !bridge.has_entry_point(EntryPoint::Init) {
            tracing::warn!(
                runtime = bridge.runtime().name(),
                "No {} entry point; instances will fail to initialize",
                EntryPoint::Init
            );
        }

        let registry = Arc::new(DescriptorRegistry::single(settings.plugin.clone())?);
        let descriptors = registry
            .iter()
            .map(ClapDescriptor::new)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            plugin = %settings.plugin.id,
            backend = ?settings.runtime.backend,
            runtime = bridge.runtime().name(),
            "daw-bridge module ready"
        );

        Ok(Self {
            factory: PluginFactory::new(registry, bridge),
            descriptors,
        })
    }

    pub fn factory(&self) -> &PluginFactory {
        &self.factory
    }

    pub fn bridge(&self) -> &Arc<RuntimeBridge> {
        self.factory.bridge()
    }

    pub fn clap_descriptor(&self, index: usize) -> Option<&ClapDescriptor> {
        self.descriptors.get(index)
    }
}

fn start_runtime(settings: &RuntimeSettings) -> Result<Arc<dyn EmbeddedRuntime>> {
    match settings.backend {
        Backend::Managed => {
            let programs = PROGRAMS.lock().clone();
            let mut runtime = ManagedRuntime::startup(&settings.argv0, &programs);
            if let Some(interval) = settings.collection_interval {
                runtime = runtime.with_collection_interval(interval);
            }
            Ok(Arc::new(runtime))
        }
        #[cfg(feature = "dylib")]
        Backend::Dylib => {
            let library = settings.library.as_deref().ok_or_else(|| {
                Error::Config("dylib backend requires runtime.library".to_string())
            })?;
            let runtime = daw_bridge_runtime::DylibRuntime::load(library, &settings.argv0)?;
            Ok(Arc::new(runtime))
        }
        #[cfg(not(feature = "dylib"))]
        Backend::Dylib => Err(Error::Config("built without the dylib feature".to_string())),
    }
}

/// Bootstraps the module on first call. Later calls return the first outcome.
pub fn init(plugin_path: &Path) -> bool {
    MODULE
        .get_or_init(|| match Module::bootstrap(plugin_path) {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::warn!(
                    path = %plugin_path.display(),
                    "daw-bridge bootstrap failed: {}",
                    e
                );
                None
            }
        })
        .is_some()
}

/// The module, if bootstrap has run and succeeded.
pub fn get() -> Option<&'static Module> {
    MODULE.get().and_then(Option::as_ref)
}
