use crate::{Plugin, RunEnv};
use anyhow::{Context as _, bail};
use camino::Utf8PathBuf;
use shotpub_db::DocFilter;
use shotpub_template::{Template, TemplateVars};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// Default publish template, used when the project document does not
/// declare one.
pub const DEFAULT_PUBLISH_TEMPLATE: &str =
    "{root}/{project}/{silo}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}";

/// Resolves the assumed publish destination for each instance.
///
/// Reads: context `project`, `projectId`, `root`, `publishTemplate`;
/// instance `asset`, `subset`, `version`, `representation`; the asset
/// document. Writes: instance `assumedDestination`, `publishDir`,
/// `template`.
pub struct CollectDestination;

impl Plugin for CollectDestination {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_destination",
            "Collect Assumed Destination",
            order::COLLECT + 0.3,
            PluginKind::Collector,
            Scope::Instance,
        )
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let name = cx.instances[instance].name.clone();

        let Some(project) = cx.data.str("project").map(str::to_string) else {
            bail!("no project collected; is the project collector ordered first?");
        };
        let Some(root) = cx.data.str("root").map(str::to_string) else {
            bail!("no projects root set in session (AVALON_PROJECTS)");
        };
        let project_id = cx.data.str("projectId").unwrap_or_default().to_string();

        let source = cx
            .data
            .str("publishTemplate")
            .unwrap_or(DEFAULT_PUBLISH_TEMPLATE)
            .to_string();
        let template = Template::parse(&source)
            .with_context(|| format!("parse publish template for instance {name}"))?;

        let inst = &cx.instances[instance];
        let Some(asset) = inst.data.str("asset").map(str::to_string) else {
            bail!("instance {name} has no asset");
        };
        let subset = inst.subset().to_string();
        let version = inst.data.u32("version").unwrap_or(1);
        let representation = inst
            .data
            .str("representation")
            .unwrap_or("ma")
            .to_string();

        let Some(asset_doc) = env
            .docs
            .find_one(&DocFilter::of_type("asset").named(&asset).child_of(&project_id))?
        else {
            bail!("missing asset document: {asset}");
        };
        let silo = asset_doc.field_str("silo").unwrap_or("assets").to_string();

        let mut vars = TemplateVars::new();
        vars.set_str("root", root)
            .set_str("project", project)
            .set_str("silo", silo)
            .set_str("asset", asset)
            .set_str("subset", subset)
            .set_num("version", u64::from(version))
            .set_str("representation", representation);

        let destination: Utf8PathBuf = template
            .format_path(&vars)
            .with_context(|| format!("resolve destination for instance {name}"))?;

        let inst = &mut cx.instances[instance];
        if let Some(dir) = destination.parent() {
            inst.data.set("publishDir", dir.as_str());
        }
        inst.data.set("assumedDestination", destination.as_str());
        inst.data.set("template", source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use serde_json::json;
    use shotpub_db::{Document, MemDocStore};
    use shotpub_types::Instance;
    use std::collections::BTreeMap;

    fn docs() -> MemDocStore {
        MemDocStore::new(vec![Document {
            id: "a1".to_string(),
            ty: "asset".to_string(),
            name: "shot010".to_string(),
            parent: Some("p1".to_string()),
            data: json!({"silo": "film"}),
        }])
    }

    fn context() -> Context {
        let mut cx = Context::new();
        cx.data.set("project", "hulk");
        cx.data.set("projectId", "p1");
        cx.data.set("root", "/projects");
        let mut inst = Instance::new("renderMainSet", "renderlayer");
        inst.data.set("subset", "renderMain");
        inst.data.set("asset", "shot010");
        inst.data.set("representation", "exr");
        cx.instances.push(inst);
        cx
    }

    #[test]
    fn destination_resolves_with_padded_version() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = docs();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = context();
        CollectDestination
            .process_instance(&mut cx, 0, &mut env)
            .unwrap();

        let inst = &cx.instances[0];
        assert_eq!(
            inst.data.str("assumedDestination"),
            Some("/projects/hulk/film/shot010/publish/renderMain/v001/renderMain.exr")
        );
        assert_eq!(
            inst.data.str("publishDir"),
            Some("/projects/hulk/film/shot010/publish/renderMain/v001")
        );
    }

    #[test]
    fn missing_asset_document_is_named() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = context();
        let err = CollectDestination
            .process_instance(&mut cx, 0, &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("missing asset document: shot010"));
    }
}
