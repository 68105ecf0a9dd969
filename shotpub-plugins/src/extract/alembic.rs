use crate::{Plugin, RunEnv, env_keys};
use anyhow::{Context as _, bail};
use camino::Utf8PathBuf;
use serde_json::json;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::debug;

/// Exports cache/animation members to a staged file.
///
/// Injects the `cbId` attribute on every exported member beforehand,
/// unless `CB_MAYA_ABC_WRITE_CBID` disables it. Writes the staged file
/// under `<workdir>/staging/<instance>/` and records `stagingDir`,
/// `files` and `representation` on the instance. Re-running overwrites
/// the same staged file.
pub struct ExtractAlembic;

impl Plugin for ExtractAlembic {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "extract_alembic",
            "Extract Alembic",
            order::EXTRACT + 0.2,
            PluginKind::Extractor,
            Scope::Instance,
        )
        .with_families(&["pointcache", "animation"])
        .with_hosts(&["maya"])
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let Some(workdir) = cx.data.str("workdir").map(Utf8PathBuf::from) else {
            bail!("no work directory collected; cannot stage exports");
        };

        let inst = &cx.instances[instance];
        let name = inst.name.clone();
        let subset = inst.subset().to_string();
        let members = inst.data.str_list("members");
        if members.is_empty() {
            bail!("instance {name} has no members to export");
        }
        let ext = inst.data.str("outputFormat").unwrap_or("abc").to_string();

        if !env.env_disabled(env_keys::ABC_WRITE_CBID) {
            for member in &members {
                env.scene
                    .set_node_attr(member, "cbId", json!(format!("{subset}/{member}")))
                    .with_context(|| format!("write cbId on {member}"))?;
            }
        } else {
            debug!(instance = %name, "cbId injection disabled by environment");
        }

        let staging = workdir.join("staging").join(&name);
        let path = staging.join(format!("{subset}.{ext}"));
        env.scene
            .export(&members, &path)
            .with_context(|| format!("export {path}"))?;

        let inst = &mut cx.instances[instance];
        inst.data.set("stagingDir", staging.as_str());
        inst.data.set("files", vec![path.to_string()]);
        inst.data.set("representation", ext);
        Ok(())
    }
}
