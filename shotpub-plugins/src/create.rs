//! Creators author publish set nodes into the scene. They are invoked on
//! demand from the tooling front-end, never during the ordered pass.

use crate::{Plugin, RunEnv};
use anyhow::bail;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::info;

/// Writes a publish set node for a creatable family into the scene.
///
/// Reads the request from context data: `create.family`,
/// `create.subset`, `create.asset`. Re-creating an existing set replaces
/// it rather than duplicating the node.
pub struct CreatePublishSet;

impl CreatePublishSet {
    pub const CREATABLE: &'static [&'static str] = &["pointcache", "animation", "camera"];
}

impl Plugin for CreatePublishSet {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "create_publish_set",
            "Create Publish Set",
            order::COLLECT,
            PluginKind::Creator,
            Scope::Context,
        )
        .with_families(Self::CREATABLE)
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let Some(family) = cx.data.str("create.family").map(str::to_string) else {
            bail!("no family requested (create.family)");
        };
        if !Self::CREATABLE.contains(&family.as_str()) {
            bail!(
                "family '{family}' is not creatable; choose one of: {}",
                Self::CREATABLE.join(", ")
            );
        }
        let Some(subset) = cx.data.str("create.subset").map(str::to_string) else {
            bail!("no subset requested (create.subset)");
        };
        let asset = cx.data.str("create.asset").map(str::to_string);

        let node = format!("{subset}_SET");
        env.scene.create_publish_set(crate::ports::PublishSet {
            node: node.clone(),
            family: family.clone(),
            subset,
            asset,
            active: true,
            members: Vec::new(),
            attrs: Default::default(),
        })?;
        info!(node = %node, family = %family, "created publish set");

        cx.data.set("create.node", node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use shotpub_db::MemDocStore;
    use std::collections::BTreeMap;

    #[test]
    fn creates_and_replaces_the_set_node() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = Context::new();
        cx.data.set("create.family", "pointcache");
        cx.data.set("create.subset", "cacheHero");
        cx.data.set("create.asset", "shot010");

        CreatePublishSet.process_context(&mut cx, &mut env).unwrap();
        CreatePublishSet.process_context(&mut cx, &mut env).unwrap();

        assert_eq!(cx.data.str("create.node"), Some("cacheHero_SET"));
        assert_eq!(scene.sets.len(), 1);
        assert_eq!(scene.sets[0].family, "pointcache");
        assert_eq!(scene.sets[0].asset.as_deref(), Some("shot010"));
    }

    #[test]
    fn uncreatable_family_is_rejected() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = Context::new();
        cx.data.set("create.family", "renderlayer");
        cx.data.set("create.subset", "renderMain");

        let err = CreatePublishSet
            .process_context(&mut cx, &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("not creatable"));
    }
}
