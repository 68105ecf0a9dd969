use crate::{Plugin, RunEnv};
use anyhow::bail;
use camino::Utf8Path;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// Every file an instance expects must already exist on disk.
///
/// Instances that declare no `expectedFiles` pass trivially. All missing
/// paths are reported together.
pub struct ValidateFilesExist;

impl Plugin for ValidateFilesExist {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "validate_files_exist",
            "Validate Files Exist",
            order::VALIDATE + 0.2,
            PluginKind::Validator,
            Scope::Instance,
        )
        .with_targets(&["farm"])
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        _env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let inst = &cx.instances[instance];
        let expected = inst.data.str_list("expectedFiles");

        let missing: Vec<&String> = expected
            .iter()
            .filter(|p| !Utf8Path::new(p).exists())
            .collect();
        if !missing.is_empty() {
            bail!(
                "instance {}: {} expected file(s) missing on disk: {}",
                inst.name,
                missing.len(),
                missing
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(())
    }
}
