//! Per-invocation result records appended to the [`Context`](crate::Context)
//! during the ordered pass.

use serde::{Deserialize, Serialize};

/// What a plug-in invocation ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTarget {
    Context,
    Instance(String),
}

/// Outcome of one plug-in invocation.
///
/// Appended during the run; read by the driver and by reporting tooling
/// after the pass completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub plugin: String,
    pub target: RecordTarget,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,

    /// Label of an attached recovery action, if the plug-in offers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl RunRecord {
    pub fn success(plugin: impl Into<String>, target: RecordTarget, duration_ms: u64) -> Self {
        Self {
            plugin: plugin.into(),
            target,
            success: true,
            error: None,
            duration_ms,
            action: None,
        }
    }

    pub fn failure(
        plugin: impl Into<String>,
        target: RecordTarget,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            target,
            success: false,
            error: Some(error.into()),
            duration_ms,
            action: None,
        }
    }

    pub fn instance_name(&self) -> Option<&str> {
        match &self.target {
            RecordTarget::Context => None,
            RecordTarget::Instance(name) => Some(name),
        }
    }
}
