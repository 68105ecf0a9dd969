//! Configuration file loading for shotpub.
//!
//! Discovers and loads `shotpub.toml` from the working root (by default
//! the scene's directory). CLI arguments take precedence over config
//! file settings.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use shotpub_core::Strictness;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "shotpub.toml";

/// Top-level configuration from shotpub.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShotpubConfig {
    /// Pass settings (host, target, failure policy).
    pub publish: PublishSection,

    /// Filesystem locations.
    pub paths: PathsSection,

    /// Validator thresholds.
    pub validation: ValidationSection,
}

/// Publish section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    /// Host application the pass claims to run in.
    pub host: Option<String>,

    /// Publish target ("local", "farm", ...).
    pub target: Option<String>,

    /// Failure policy: "complete", "fail-fast", or "gate-extract".
    pub strictness: Option<String>,

    /// Artist comment recorded on the context.
    pub comment: Option<String>,

    /// Project code override.
    pub code: Option<String>,
}

/// Paths section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Directory of project/asset documents (JSON files).
    pub docs: Option<Utf8PathBuf>,

    /// Output directory for report.json and context.json.
    pub out_dir: Option<Utf8PathBuf>,
}

/// Validation section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    /// Minimum application version the validators accept.
    pub min_app_version: Option<String>,
}

/// Discover the shotpub.toml config file.
///
/// Searches for `shotpub.toml` in the given root directory. Returns
/// `None` if no config file is found.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a shotpub.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ShotpubConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ShotpubConfig> {
    let config: ShotpubConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<ShotpubConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(ShotpubConfig::default()),
    }
}

/// Parse a strictness name as written in shotpub.toml.
pub fn parse_strictness(raw: &str) -> anyhow::Result<Strictness> {
    match raw {
        "complete" => Ok(Strictness::Complete),
        "fail-fast" => Ok(Strictness::FailFast),
        "gate-extract" => Ok(Strictness::GateExtract),
        other => anyhow::bail!(
            "unknown strictness '{}': expected complete, fail-fast, or gate-extract",
            other
        ),
    }
}

/// CLI-side overrides for the publish command.
#[derive(Debug, Clone, Default)]
pub struct PublishOverrides {
    pub host: Option<String>,
    pub target: Option<String>,
    pub strictness: Option<Strictness>,
    pub comment: Option<String>,
    pub code: Option<String>,
    pub min_app_version: Option<String>,
    pub docs: Option<Utf8PathBuf>,
    pub out_dir: Option<Utf8PathBuf>,
}

/// Merged configuration combining config file and CLI arguments.
///
/// CLI arguments take precedence over config file settings, which take
/// precedence over the built-in defaults.
#[derive(Debug, Clone)]
pub struct MergedPublish {
    pub host: String,
    pub target: String,
    pub strictness: Strictness,
    pub comment: Option<String>,
    pub code: Option<String>,
    pub min_app_version: Option<String>,
    pub docs: Option<Utf8PathBuf>,
    pub out_dir: Utf8PathBuf,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ShotpubConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: ShotpubConfig) -> Self {
        Self { config }
    }

    /// Merge with publish command CLI arguments.
    pub fn merge_publish_args(self, cli: PublishOverrides) -> anyhow::Result<MergedPublish> {
        let strictness = match cli.strictness {
            Some(s) => s,
            None => match &self.config.publish.strictness {
                Some(raw) => parse_strictness(raw)?,
                None => Strictness::default(),
            },
        };

        Ok(MergedPublish {
            host: cli
                .host
                .or(self.config.publish.host)
                .unwrap_or_else(|| "maya".to_string()),
            target: cli
                .target
                .or(self.config.publish.target)
                .unwrap_or_else(|| "local".to_string()),
            strictness,
            comment: cli.comment.or(self.config.publish.comment),
            code: cli.code.or(self.config.publish.code),
            min_app_version: cli
                .min_app_version
                .or(self.config.validation.min_app_version),
            docs: cli.docs.or(self.config.paths.docs),
            out_dir: cli
                .out_dir
                .or(self.config.paths.out_dir)
                .unwrap_or_else(|| Utf8PathBuf::from("artifacts")),
        })
    }
}
