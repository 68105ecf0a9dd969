use crate::ports::UndoChunk;
use crate::{Plugin, RunEnv};
use anyhow::bail;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::info;

const TRIGGER_KEY: &str = "extract_render_local";

/// Renders all active render layers together in one host call.
///
/// Registered as an instance plug-in so it only fires when a renderlayer
/// instance is in the pass, but the actual render must happen once per
/// pass: the first invocation claims the run-scoped trigger and renders
/// every active layer, later invocations are no-ops.
pub struct ExtractRenderLocal;

impl Plugin for ExtractRenderLocal {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "extract_render_local",
            "Extract Render (Local)",
            order::EXTRACT + 0.1,
            PluginKind::Extractor,
            Scope::Instance,
        )
        .with_families(&["renderlayer"])
        .with_targets(&["local"])
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        _instance: usize,
        env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        if !env.trigger_once(TRIGGER_KEY) {
            return Ok(());
        }

        let layers: Vec<String> = cx
            .active_instances()
            .filter(|i| i.has_family("renderlayer"))
            .map(|i| i.name.clone())
            .collect();
        info!(layers = layers.len(), "rendering all active layers");

        // The undo chunk closes on every exit path, so a failed render
        // never leaks an open transaction.
        let ok = {
            let mut chunk = UndoChunk::open(&mut *env.scene, "shotpub render");
            chunk.scene().render(&layers)?
        };
        if !ok {
            bail!(
                "render command reported failure for layer(s): {}",
                layers.join(", ")
            );
        }
        Ok(())
    }
}
