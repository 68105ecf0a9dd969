use crate::{Plugin, RunEnv, env_keys};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// Decides the on-disk output family for animation instances.
///
/// Reads: `CB_ANIMATION_AS_USD`. Writes: instance `outputFormat` and the
/// matching secondary family (`usd` or `abc`).
pub struct CollectAnimationOutput;

impl Plugin for CollectAnimationOutput {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_animation_output",
            "Collect Animation Output",
            order::COLLECT + 0.15,
            PluginKind::Collector,
            Scope::Instance,
        )
        .with_families(&["animation"])
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let as_usd = env.env_var(env_keys::ANIMATION_AS_USD).is_some()
            && !env.env_disabled(env_keys::ANIMATION_AS_USD);
        let format = if as_usd { "usd" } else { "abc" };

        let inst = &mut cx.instances[instance];
        inst.data.set("outputFormat", format);
        if !inst.has_family(format) {
            inst.families.push(format.to_string());
        }
        Ok(())
    }
}
