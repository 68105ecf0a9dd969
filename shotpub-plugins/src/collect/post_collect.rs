use crate::{Plugin, RunEnv};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope};
use tracing::debug;

/// Workaround: re-syncs instance activation from the scene after a GUI
/// front-end has re-collected and possibly reshuffled the pass.
///
/// Only registered when `PYBLISH_QML_POST_COLLECT` is set; the variable's
/// float value is this plug-in's order. Reads: scene publish sets.
/// Writes: instance `active`.
pub struct RefreshActiveState {
    pub order: f64,
}

impl Plugin for RefreshActiveState {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "refresh_active_state",
            "Refresh Active State",
            self.order,
            PluginKind::Collector,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let sets = env.scene.publish_sets();
        for inst in &mut cx.instances {
            if let Some(set) = sets.iter().find(|s| s.node == inst.name) {
                inst.data.set("active", set.active);
                debug!(instance = %inst.name, active = set.active, "refreshed");
            }
        }
        Ok(())
    }
}
