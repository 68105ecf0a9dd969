use crate::record::{RecordTarget, RunRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publish run report, written next to the context artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub verdict: ReportVerdict,

    #[serde(default)]
    pub findings: Vec<ReportFinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub run_id: Uuid,
    pub host: String,
    pub target: String,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVerdict {
    pub status: ReportStatus,
    pub counts: ReportCounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Fail,
    /// Nothing was collected; there was nothing to publish.
    Skip,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportCounts {
    pub invocations: u64,
    pub instances: u64,
    pub errors: u64,
}

/// One finding per failed invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFinding {
    pub plugin: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ReportFinding {
    pub fn from_record(record: &RunRecord) -> Option<Self> {
        if record.success {
            return None;
        }
        Some(Self {
            plugin: record.plugin.clone(),
            instance: match &record.target {
                RecordTarget::Context => None,
                RecordTarget::Instance(name) => Some(name.clone()),
            },
            message: record.error.clone().unwrap_or_default(),
            action: record.action.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_only_from_failed_records() {
        let ok = RunRecord::success("collect_instances", RecordTarget::Context, 1);
        assert!(ReportFinding::from_record(&ok).is_none());

        let mut bad = RunRecord::failure(
            "validate_scene_saved",
            RecordTarget::Context,
            1,
            "scene has unsaved changes",
        );
        bad.action = Some("Open work directory".to_string());

        let finding = ReportFinding::from_record(&bad).unwrap();
        assert_eq!(finding.plugin, "validate_scene_saved");
        assert!(finding.instance.is_none());
        assert_eq!(finding.action.as_deref(), Some("Open work directory"));
    }
}
