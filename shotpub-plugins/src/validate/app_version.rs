use crate::{Plugin, RunEnv};
use anyhow::bail;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};

/// The host application must be at least the configured minimum version.
///
/// Reads context `minAppVersion` (config-seeded); passes when unset.
pub struct ValidateAppVersion;

impl Plugin for ValidateAppVersion {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "validate_app_version",
            "Validate App Version",
            order::VALIDATE + 0.05,
            PluginKind::Validator,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, env: &mut RunEnv) -> anyhow::Result<()> {
        let Some(minimum) = cx.data.str("minAppVersion") else {
            return Ok(());
        };
        let current = env.scene.app_version();
        if version_parts(&current) < version_parts(minimum) {
            bail!(
                "app version {current} is older than required {minimum} (host {})",
                env.host
            );
        }
        Ok(())
    }
}

/// "2024.2" -> [2024, 2]; non-numeric components end the comparison key.
fn version_parts(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}
