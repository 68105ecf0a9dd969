use crate::{Action, Plugin, RunEnv};
use anyhow::bail;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::info;

/// The scene must be saved before anything can be published from it.
///
/// Carries a recovery action pointing the operator at the work
/// directory; nothing is retried automatically.
pub struct ValidateSceneSaved;

impl Plugin for ValidateSceneSaved {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "validate_scene_saved",
            "Validate Scene Saved",
            order::VALIDATE,
            PluginKind::Validator,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        if cx.data.str("currentFile").is_none() {
            bail!("scene has never been saved");
        }
        if env.scene.is_modified() {
            bail!("scene has unsaved changes");
        }
        Ok(())
    }

    fn recovery_action(&self) -> Option<Box<dyn Action>> {
        Some(Box::new(OpenWorkdir))
    }
}

/// Points the operator at the work directory of the failing scene.
pub struct OpenWorkdir;

impl Action for OpenWorkdir {
    fn label(&self) -> &str {
        "Open work directory"
    }

    fn run(&self, cx: &Context, _env: &mut RunEnv) -> anyhow::Result<()> {
        let workdir = cx.data.str("workdir").unwrap_or("<unknown>");
        info!(workdir, "save the scene from its work directory and publish again");
        Ok(())
    }
}
