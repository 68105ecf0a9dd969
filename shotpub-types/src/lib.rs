//! Shared DTOs (schemas-as-code) for the shotpub workspace.
//!
//! # Design constraints
//! - `Context` and `PublishReport` are serialized to disk as run artifacts.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod context;
pub mod plugin;
pub mod record;
pub mod report;

pub use context::{Context, DataMap, Instance};
pub use plugin::{PluginKind, PluginSpec, Scope, order};
pub use record::{RecordTarget, RunRecord};
pub use report::{
    PublishReport, ReportCounts, ReportFinding, ReportRunInfo, ReportStatus, ReportToolInfo,
    ReportVerdict,
};

/// Schema identifiers.
pub mod schema {
    pub const SHOTPUB_CONTEXT_V1: &str = "shotpub.context.v1";
    pub const SHOTPUB_REPORT_V1: &str = "shotpub.report.v1";
}
