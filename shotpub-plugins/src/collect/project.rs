use crate::{Plugin, RunEnv};
use anyhow::bail;
use shotpub_db::DocFilter;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// Resolves the session's project document.
///
/// Reads: session (`AVALON_PROJECT`, `AVALON_PROJECTS`). Writes:
/// `project`, `projectId`, `code`, `root`, and `publishTemplate` when the
/// project document declares one.
pub struct CollectProject;

impl Plugin for CollectProject {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_project",
            "Collect Project",
            order::COLLECT + 0.1,
            PluginKind::Collector,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let Some(project) = env.session.project.clone() else {
            bail!("no project set in session (AVALON_PROJECT)");
        };

        let Some(doc) = env
            .docs
            .find_one(&DocFilter::of_type("project").named(&project))?
        else {
            bail!("missing project document: {project}");
        };

        cx.data.set("project", project);
        cx.data.set("projectId", doc.id.clone());
        if let Some(code) = doc.field_str("code") {
            cx.data.set("code", code);
        }
        if let Some(template) = doc.field_str("templates.publish") {
            cx.data.set("publishTemplate", template);
        }
        if let Some(root) = &env.session.projects_root {
            cx.data.set("root", root.clone());
        }
        Ok(())
    }
}
