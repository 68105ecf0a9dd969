use crate::{Plugin, RunEnv};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// Records the current scene file on the context.
///
/// Reads: scene state. Writes: `currentFile`, `workdir`.
/// Leaves both unset for a never-saved scene; the saved-file validator
/// raises the actual error.
pub struct CollectCurrentFile;

impl Plugin for CollectCurrentFile {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_current_file",
            "Collect Current File",
            order::COLLECT,
            PluginKind::Collector,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let Some(path) = env.scene.current_file() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            cx.data.set("workdir", parent.as_str());
        }
        cx.data.set("currentFile", path.as_str());
        Ok(())
    }
}
