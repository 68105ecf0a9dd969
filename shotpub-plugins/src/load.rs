//! Loaders bring published representations back into the scene. Like
//! creators they run on demand, outside the ordered pass.

use crate::{Plugin, RunEnv};
use anyhow::{Context as _, bail};
use camino::Utf8PathBuf;
use shotpub_db::DocFilter;
use shotpub_template::{Template, TemplateVars};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::info;

/// References a published representation into the current scene.
///
/// Reads the request from context data: `load.asset`, `load.subset`,
/// `load.version`, `load.representation`, and optionally `load.project`
/// (defaults to the session project). Writes `load.node` with the
/// reference node the host returned.
pub struct ReferenceLoader;

impl Plugin for ReferenceLoader {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "reference_loader",
            "Reference Published Version",
            order::COLLECT,
            PluginKind::Loader,
            Scope::Context,
        )
        .with_families(&["pointcache", "animation", "camera", "model"])
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let project = match cx.data.str("load.project") {
            Some(p) => p.to_string(),
            None => match env.session.project.clone() {
                Some(p) => p,
                None => bail!("no project requested and none set in session (AVALON_PROJECT)"),
            },
        };
        let Some(asset) = cx.data.str("load.asset").map(str::to_string) else {
            bail!("no asset requested (load.asset)");
        };
        let Some(subset) = cx.data.str("load.subset").map(str::to_string) else {
            bail!("no subset requested (load.subset)");
        };
        let Some(version) = cx.data.u32("load.version") else {
            bail!("no version requested (load.version)");
        };
        let Some(representation) = cx.data.str("load.representation").map(str::to_string) else {
            bail!("no representation requested (load.representation)");
        };

        let Some(project_doc) = env
            .docs
            .find_one(&DocFilter::of_type("project").named(&project))?
        else {
            bail!("missing project document: {project}");
        };
        let Some(asset_doc) = env.docs.find_one(
            &DocFilter::of_type("asset")
                .named(&asset)
                .child_of(&project_doc.id),
        )?
        else {
            bail!("missing asset document: {asset}");
        };
        let silo = asset_doc.field_str("silo").unwrap_or("assets").to_string();

        let Some(root) = env.session.projects_root.clone() else {
            bail!("no projects root set in session (AVALON_PROJECTS)");
        };
        let source = project_doc
            .field_str("templates.publish")
            .unwrap_or(crate::collect::DEFAULT_PUBLISH_TEMPLATE);
        let template =
            Template::parse(source).with_context(|| format!("parse publish template of {project}"))?;

        let mut vars = TemplateVars::new();
        vars.set_str("root", root)
            .set_str("project", project)
            .set_str("silo", silo)
            .set_str("asset", asset)
            .set_str("subset", subset.clone())
            .set_num("version", u64::from(version))
            .set_str("representation", representation);

        let path: Utf8PathBuf = template
            .format_path(&vars)
            .with_context(|| format!("resolve published path of {subset} v{version:03}"))?;
        if !path.exists() {
            bail!("published file does not exist: {path}");
        }

        let node = env.scene.reference_file(&path)?;
        info!(node = %node, path = %path, "referenced published version");

        cx.data.set("load.node", node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use fs_err as fs;
    use serde_json::json;
    use shotpub_db::{Document, MemDocStore};
    use shotpub_template::session_env;
    use std::collections::BTreeMap;

    fn docs() -> MemDocStore {
        MemDocStore::new(vec![
            Document {
                id: "p1".to_string(),
                ty: "project".to_string(),
                name: "hulk".to_string(),
                parent: None,
                data: json!({}),
            },
            Document {
                id: "a1".to_string(),
                ty: "asset".to_string(),
                name: "hero".to_string(),
                parent: Some("p1".to_string()),
                data: json!({"silo": "assets"}),
            },
        ])
    }

    fn request() -> Context {
        let mut cx = Context::new();
        cx.data.set("load.project", "hulk");
        cx.data.set("load.asset", "hero");
        cx.data.set("load.subset", "cacheHero");
        cx.data.set("load.version", 2);
        cx.data.set("load.representation", "abc");
        cx
    }

    #[test]
    fn references_the_resolved_path() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().to_str().unwrap().to_string();
        let published = format!("{root}/hulk/assets/hero/publish/cacheHero/v002/cacheHero.abc");
        fs::create_dir_all(std::path::Path::new(&published).parent().unwrap()).unwrap();
        fs::write(&published, "cache").unwrap();

        let mut env_map = BTreeMap::new();
        env_map.insert(session_env::PROJECTS_ROOT.to_string(), root);

        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = docs();
        let mut env = RunEnv::new("maya", "local", env_map, &mut scene, &docs);

        let mut cx = request();
        ReferenceLoader.process_context(&mut cx, &mut env).unwrap();

        assert_eq!(cx.data.str("load.node"), Some("cacheHeroRN"));
        assert_eq!(scene.references.len(), 1);
        assert_eq!(scene.references[0].as_str(), published);
    }

    #[test]
    fn missing_published_file_is_an_error() {
        let td = tempfile::tempdir().unwrap();
        let mut env_map = BTreeMap::new();
        env_map.insert(
            session_env::PROJECTS_ROOT.to_string(),
            td.path().to_str().unwrap().to_string(),
        );

        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = docs();
        let mut env = RunEnv::new("maya", "local", env_map, &mut scene, &docs);

        let err = ReferenceLoader
            .process_context(&mut request(), &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
