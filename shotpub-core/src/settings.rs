//! Clap-free settings for the publish pass.

use std::collections::BTreeMap;

/// How the driver reacts to recorded failures mid-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Run every invocation and render the verdict at the end.
    Complete,
    /// Halt the pass at the first failed invocation.
    FailFast,
    /// Refuse to cross into the extract band while any failure is
    /// recorded; everything before the boundary still runs in full.
    #[default]
    GateExtract,
}

/// Settings for one publish pass.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub host: String,
    pub target: String,
    pub strictness: Strictness,

    /// Artist comment, seeded into context data before the pass.
    pub comment: Option<String>,
    /// Project code override, seeded the same way.
    pub code: Option<String>,
    /// Minimum application version the validators accept.
    pub min_app_version: Option<String>,

    /// Environment captured at settings build time; the pass never reads
    /// the process environment after this point.
    pub env: BTreeMap<String, String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            host: "maya".to_string(),
            target: "local".to_string(),
            strictness: Strictness::default(),
            comment: None,
            code: None,
            min_app_version: None,
            env: BTreeMap::new(),
        }
    }
}
