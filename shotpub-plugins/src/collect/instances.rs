use crate::{Plugin, RunEnv};
use shotpub_types::{Context, Instance, PluginKind, PluginSpec, Scope, order};
use tracing::debug;

/// Synthesizes instances from the creator-authored publish sets in the
/// scene.
///
/// Reads: scene publish sets. Writes: `Context::instances`, and per
/// instance `subset`, `asset`, `active`, `members` plus every authored
/// set attribute. Running twice adds nothing: sets whose node name is
/// already an instance are skipped.
pub struct CollectInstances;

impl Plugin for CollectInstances {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_instances",
            "Collect Instances",
            order::COLLECT + 0.05,
            PluginKind::Collector,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        for set in env.scene.publish_sets() {
            if cx.instance(&set.node).is_some() {
                continue;
            }

            let mut instance = Instance::new(set.node.clone(), set.family.clone());
            instance.data.set("subset", set.subset.clone());
            instance.data.set("active", set.active);
            if let Some(asset) = &set.asset {
                instance.data.set("asset", asset.clone());
            }
            if !set.members.is_empty() {
                instance.data.set("members", set.members.clone());
            }
            for (key, value) in &set.attrs {
                instance.data.set(key.clone(), value.clone());
            }

            debug!(instance = %instance.name, family = %instance.family, "collected");
            cx.instances.push(instance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PublishSet;
    use crate::testing::FakeScene;
    use serde_json::json;
    use shotpub_db::MemDocStore;
    use std::collections::BTreeMap;

    fn render_set() -> PublishSet {
        let mut attrs = BTreeMap::new();
        attrs.insert("frameStart".to_string(), json!(1001));
        attrs.insert("frameEnd".to_string(), json!(1010));
        PublishSet {
            node: "renderMainSet".to_string(),
            family: "renderlayer".to_string(),
            subset: "renderMain".to_string(),
            asset: Some("shot010".to_string()),
            active: true,
            members: vec!["rs_main".to_string()],
            attrs,
        }
    }

    #[test]
    fn sets_become_instances_once() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        scene.sets.push(render_set());
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = Context::new();
        CollectInstances.process_context(&mut cx, &mut env).unwrap();
        CollectInstances.process_context(&mut cx, &mut env).unwrap();

        assert_eq!(cx.instances.len(), 1);
        let inst = &cx.instances[0];
        assert_eq!(inst.family, "renderlayer");
        assert_eq!(inst.subset(), "renderMain");
        assert_eq!(inst.data.i64("frameStart"), Some(1001));
        assert_eq!(inst.data.str_list("members"), vec!["rs_main".to_string()]);
        assert!(inst.is_active());
    }
}
