//! The closed plug-in set for the publish pass, plus the traits and ports
//! they are written against.
//!
//! Plug-ins are a closed set of tagged kinds implementing one fixed
//! interface ([`Plugin`]), registered explicitly through the [`Registry`]
//! rather than discovered by introspection. The execution driver lives in
//! `shotpub-core`; host DCC state is reached through [`ScenePort`] and the
//! project database through `shotpub-db`.
//!
//! Each collector documents which keys it reads and writes; the ordering
//! number is the only mechanism enforcing that dependency order.

pub mod collect;
pub mod create;
pub mod extract;
pub mod integrate;
pub mod load;
pub mod ports;
pub mod registry;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use ports::{PublishSet, ScenePort, UndoChunk};
pub use registry::{LoadedPlugin, PluginLoadError, Registry};

use shotpub_db::DocStore;
use shotpub_template::Session;
use shotpub_types::{Context, PluginSpec};
use std::collections::{BTreeMap, BTreeSet};

/// Environment variables this pipeline consumes.
pub mod env_keys {
    /// Comma-separated instance names to force-activate; all others are
    /// force-deactivated. Unknown names are an error.
    pub const ACTIVE_INSTANCES: &str = "PYBLISH_ACTIVE_INSTANCES";
    /// Float order at which the post-collect workaround plug-in runs.
    /// The plug-in is only registered when this is set.
    pub const POST_COLLECT_ORDER: &str = "PYBLISH_QML_POST_COLLECT";
    /// "0"/"False" disables id attribute injection on alembic export.
    pub const ABC_WRITE_CBID: &str = "CB_MAYA_ABC_WRITE_CBID";
    /// When set (and not disabled), animation publishes as USD instead of
    /// Alembic.
    pub const ANIMATION_AS_USD: &str = "CB_ANIMATION_AS_USD";
}

/// Run-scoped state handed to every invocation.
///
/// Owns the `triggered` set used by plug-ins that must logically run once
/// per pass; the guard lives here, not in the shared Context mapping.
pub struct RunEnv<'a> {
    pub host: String,
    pub target: String,

    /// Environment captured at settings build time; plug-ins never read
    /// the process environment directly.
    pub env: BTreeMap<String, String>,

    pub session: Session,
    pub scene: &'a mut dyn ScenePort,
    pub docs: &'a dyn DocStore,

    triggered: BTreeSet<String>,
}

impl<'a> RunEnv<'a> {
    pub fn new(
        host: impl Into<String>,
        target: impl Into<String>,
        env: BTreeMap<String, String>,
        scene: &'a mut dyn ScenePort,
        docs: &'a dyn DocStore,
    ) -> Self {
        let session = Session::from_env(&env);
        Self {
            host: host.into(),
            target: target.into(),
            env,
            session,
            scene,
            docs,
            triggered: BTreeSet::new(),
        }
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// "0" and "False" turn a default-on behaviour off.
    pub fn env_disabled(&self, key: &str) -> bool {
        matches!(self.env_var(key), Some("0") | Some("False") | Some("false"))
    }

    /// True the first time a key is seen in this pass, false afterwards.
    pub fn trigger_once(&mut self, key: &str) -> bool {
        self.triggered.insert(key.to_string())
    }
}

/// One registered behaviour unit. Stateless across runs.
///
/// The driver calls `process_context` for Context-scope plug-ins and
/// `process_instance` (with the instance index) for Instance-scope ones;
/// which one is invoked is decided by [`PluginSpec::scope`].
pub trait Plugin {
    fn spec(&self) -> PluginSpec;

    fn process_context(&self, _cx: &mut Context, _env: &mut RunEnv) -> anyhow::Result<()> {
        Ok(())
    }

    fn process_instance(
        &self,
        _cx: &mut Context,
        _instance: usize,
        _env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Optional recovery action surfaced with a failure, invoked on
    /// demand rather than during the ordered pass.
    fn recovery_action(&self) -> Option<Box<dyn Action>> {
        None
    }
}

/// Secondary callable attached to a plug-in.
pub trait Action {
    fn label(&self) -> &str;

    fn run(&self, cx: &Context, env: &mut RunEnv) -> anyhow::Result<()>;
}
