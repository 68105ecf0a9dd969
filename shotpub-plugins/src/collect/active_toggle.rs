use crate::{Plugin, RunEnv, env_keys};
use anyhow::bail;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::debug;

/// Applies the forced activation list from the environment.
///
/// Reads: `PYBLISH_ACTIVE_INSTANCES` (comma-separated instance names).
/// Writes: `active` and `publish` on every instance — listed names get
/// both set true, all others both false. Every listed name that is not a
/// collected instance is an error, reported together.
pub struct CollectForcedActivation;

impl Plugin for CollectForcedActivation {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_forced_activation",
            "Collect Forced Activation",
            order::COLLECT + 0.45,
            PluginKind::Collector,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let Some(raw) = env.env_var(env_keys::ACTIVE_INSTANCES) else {
            return Ok(());
        };

        let wanted: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        let missing: Vec<&str> = wanted
            .iter()
            .copied()
            .filter(|name| cx.instance(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "unknown instance names in {}: {}",
                env_keys::ACTIVE_INSTANCES,
                missing.join(", ")
            );
        }

        for inst in &mut cx.instances {
            let on = wanted.iter().any(|name| *name == inst.name);
            inst.data.set("active", on);
            inst.data.set("publish", on);
            debug!(instance = %inst.name, active = on, "forced activation");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use shotpub_db::MemDocStore;
    use shotpub_types::Instance;
    use std::collections::BTreeMap;

    fn context() -> Context {
        let mut cx = Context::new();
        for name in ["a", "b", "c"] {
            cx.instances.push(Instance::new(name, "pointcache"));
        }
        cx
    }

    fn env_with(value: &str) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(env_keys::ACTIVE_INSTANCES.to_string(), value.to_string());
        env
    }

    #[test]
    fn listed_names_activate_everything_else_deactivates() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", env_with("a,b"), &mut scene, &docs);

        let mut cx = context();
        CollectForcedActivation
            .process_context(&mut cx, &mut env)
            .unwrap();

        for name in ["a", "b"] {
            let inst = cx.instance(name).unwrap();
            assert!(inst.data.bool_or("active", false), "{name} active");
            assert!(inst.data.bool_or("publish", false), "{name} publish");
        }
        let c = cx.instance("c").unwrap();
        assert!(!c.data.bool_or("active", true));
        assert!(!c.data.bool_or("publish", true));
    }

    #[test]
    fn unknown_names_raise_and_are_listed() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", env_with("a,d"), &mut scene, &docs);

        let mut cx = context();
        let err = CollectForcedActivation
            .process_context(&mut cx, &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("d"));
        assert!(!err.to_string().contains("a,"), "known names not blamed");
    }

    #[test]
    fn unset_variable_changes_nothing() {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let mut cx = context();
        CollectForcedActivation
            .process_context(&mut cx, &mut env)
            .unwrap();
        assert!(cx.instances.iter().all(|i| i.is_active()));
    }
}
