//! Explicit plug-in registration.
//!
//! There is no introspection-based discovery: the closed built-in set is
//! registered here, and externally constructed plug-ins come in through
//! [`Registry::extend_loaded`], where a failed construction is reported
//! and skipped without aborting the rest.

use crate::{Plugin, collect, create, env_keys, extract, integrate, load, validate};
use shotpub_types::PluginSpec;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PluginLoadError {
    #[error("plug-in construction failed: {message}")]
    Construct { message: String },
}

/// One externally provided plug-in, possibly broken.
pub struct LoadedPlugin {
    /// Where the plug-in came from (registration path, package name, ...).
    pub source: String,
    pub plugin: Result<Box<dyn Plugin>, PluginLoadError>,
}

#[derive(Default)]
pub struct Registry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set. The post-collect workaround is only registered
    /// when its enabling environment variable is set, at the order the
    /// variable carries.
    pub fn builtin(env: &BTreeMap<String, String>) -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(collect::CollectCurrentFile));
        registry.register(Box::new(collect::CollectInstances));
        registry.register(Box::new(collect::CollectProject));
        registry.register(Box::new(collect::CollectAnimationOutput));
        registry.register(Box::new(collect::CollectRenderProducts));
        registry.register(Box::new(collect::CollectDestination));
        registry.register(Box::new(collect::CollectForcedActivation));

        if let Some(raw) = env.get(env_keys::POST_COLLECT_ORDER) {
            match raw.parse::<f64>() {
                Ok(order) => {
                    registry.register(Box::new(collect::RefreshActiveState { order }));
                }
                Err(_) => warn!(
                    value = %raw,
                    "ignoring {}: not a float order",
                    env_keys::POST_COLLECT_ORDER
                ),
            }
        }

        registry.register(Box::new(validate::ValidateSceneSaved));
        registry.register(Box::new(validate::ValidateAppVersion));
        registry.register(Box::new(validate::ValidateUniqueSubsets));
        registry.register(Box::new(validate::ValidateFilesExist));
        registry.register(Box::new(validate::ValidateSequence));

        registry.register(Box::new(extract::ExtractRenderLocal));
        registry.register(Box::new(extract::ExtractAlembic));

        registry.register(Box::new(integrate::IntegrateTransfers));
        registry.register(Box::new(integrate::IntegrateMaster));

        registry.register(Box::new(create::CreatePublishSet));
        registry.register(Box::new(load::ReferenceLoader));

        registry
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Registers externally loaded plug-ins. Broken entries are logged
    /// and skipped; the count of skipped entries is returned.
    pub fn extend_loaded(&mut self, loaded: Vec<LoadedPlugin>) -> usize {
        let mut skipped = 0;
        for entry in loaded {
            match entry.plugin {
                Ok(plugin) => self.register(plugin),
                Err(e) => {
                    skipped += 1;
                    warn!(source = %entry.source, "skipping plug-in: {e}");
                }
            }
        }
        skipped
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }

    pub fn specs(&self) -> Vec<PluginSpec> {
        self.plugins.iter().map(|p| p.spec()).collect()
    }
}
