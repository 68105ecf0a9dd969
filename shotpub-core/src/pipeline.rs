//! The ordered publish pass, extracted from the CLI.
//!
//! The driver is I/O-agnostic: scene access goes through `ScenePort`,
//! document lookups through `DocStore`. One `RunRecord` is appended per
//! invocation; a failure never by itself stops the pass, the configured
//! [`Strictness`](crate::settings::Strictness) decides.

use crate::settings::{PublishSettings, Strictness};
use anyhow::Context as _;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use fs_err as fs;
use shotpub_db::DocStore;
use shotpub_plugins::{Plugin, Registry, RunEnv, ScenePort};
use shotpub_types::{
    Context, PluginKind, PluginSpec, RecordTarget, ReportCounts, ReportFinding, ReportRunInfo,
    ReportStatus, ReportToolInfo, ReportVerdict, RunRecord, Scope, order, schema,
};
use shotpub_types::PublishReport;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Error type for driver results. Exit code 2 = plug-in failure (read off
/// the outcome), 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome of [`run_publish`].
pub struct PublishOutcome {
    pub context: Context,
    pub report: PublishReport,
    pub nothing_collected: bool,
    pub failed: bool,
}

/// Exit-code policy: 0 success, 1 nothing collected, 2 any plug-in error.
pub fn exit_code(outcome: &PublishOutcome) -> u8 {
    if outcome.failed {
        2
    } else if outcome.nothing_collected {
        1
    } else {
        0
    }
}

/// The registered plug-ins that take part in the ordered pass for this
/// host/target, in execution order. Creators and loaders are excluded;
/// they run on demand.
pub fn execution_order(registry: &Registry, host: &str, target: &str) -> Vec<PluginSpec> {
    let mut specs: Vec<PluginSpec> = registry
        .specs()
        .into_iter()
        .filter(|s| {
            !matches!(s.kind, PluginKind::Creator | PluginKind::Loader)
                && s.applies_to_host(host)
                && s.applies_to_target(target)
        })
        .collect();
    // Stable sort: equal orders keep registration order.
    specs.sort_by(|a, b| a.order.partial_cmp(&b.order).unwrap_or(Ordering::Equal));
    specs
}

/// Run the full publish pass. Returns the mutated context and the report;
/// artifacts are written by the caller (or `write_publish_artifacts`).
pub fn run_publish(
    settings: &PublishSettings,
    registry: &Registry,
    scene: &mut dyn ScenePort,
    docs: &dyn DocStore,
    tool: ReportToolInfo,
) -> Result<PublishOutcome, ToolError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let mut env = RunEnv::new(
        settings.host.clone(),
        settings.target.clone(),
        settings.env.clone(),
        scene,
        docs,
    );

    let mut cx = Context::new();
    cx.data.set("host", settings.host.clone());
    cx.data.set("target", settings.target.clone());
    if let Some(comment) = &settings.comment {
        cx.data.set("comment", comment.clone());
    }
    if let Some(code) = &settings.code {
        cx.data.set("code", code.clone());
    }
    if let Some(min) = &settings.min_app_version {
        cx.data.set("minAppVersion", min.clone());
    }

    let mut pass: Vec<(PluginSpec, &dyn Plugin)> = registry
        .plugins()
        .iter()
        .map(|p| (p.spec(), p.as_ref()))
        .filter(|(s, _)| {
            !matches!(s.kind, PluginKind::Creator | PluginKind::Loader)
                && s.applies_to_host(&settings.host)
                && s.applies_to_target(&settings.target)
        })
        .collect();
    pass.sort_by(|a, b| a.0.order.partial_cmp(&b.0.order).unwrap_or(Ordering::Equal));

    'pass: for (spec, plugin) in &pass {
        if settings.strictness == Strictness::GateExtract
            && spec.order >= order::EXTRACT
            && cx.failed()
        {
            warn!(
                plugin = %spec.id,
                "stopping before the extract boundary: failures recorded"
            );
            break;
        }

        match spec.scope {
            Scope::Context => {
                debug!(plugin = %spec.id, "process context");
                let invoked = Instant::now();
                let result = plugin.process_context(&mut cx, &mut env);
                finish_record(&mut cx, *plugin, spec, RecordTarget::Context, result, invoked);
                if settings.strictness == Strictness::FailFast && cx.failed() {
                    break 'pass;
                }
            }
            Scope::Instance => {
                for idx in 0..cx.instances.len() {
                    let inst = &cx.instances[idx];
                    // Deactivated and family-mismatched instances are
                    // skipped silently, without a record.
                    if !inst.is_active() || !spec.applies_to_families(inst.all_families()) {
                        continue;
                    }
                    let name = inst.name.clone();

                    debug!(plugin = %spec.id, instance = %name, "process instance");
                    let invoked = Instant::now();
                    let result = plugin.process_instance(&mut cx, idx, &mut env);
                    finish_record(
                        &mut cx,
                        *plugin,
                        spec,
                        RecordTarget::Instance(name),
                        result,
                        invoked,
                    );
                    if settings.strictness == Strictness::FailFast && cx.failed() {
                        break 'pass;
                    }
                }
            }
        }
    }

    let nothing_collected = cx.instances.is_empty();
    let failed = cx.failed();
    let report = build_report(
        &cx,
        tool,
        settings,
        started_at,
        timer.elapsed().as_millis() as u64,
        nothing_collected,
    );

    Ok(PublishOutcome {
        context: cx,
        report,
        nothing_collected,
        failed,
    })
}

/// Invoke a single creator or loader by id, outside the ordered pass.
/// The request keys are expected on `cx.data` (`create.*` / `load.*`).
pub fn run_on_demand(
    registry: &Registry,
    id: &str,
    settings: &PublishSettings,
    scene: &mut dyn ScenePort,
    docs: &dyn DocStore,
    cx: &mut Context,
) -> Result<(), ToolError> {
    let Some(plugin) = registry.plugins().iter().find(|p| p.spec().id == id) else {
        return Err(anyhow::anyhow!("no registered plug-in with id '{id}'").into());
    };
    let spec = plugin.spec();
    if !matches!(spec.kind, PluginKind::Creator | PluginKind::Loader) {
        return Err(anyhow::anyhow!(
            "plug-in '{id}' takes part in the ordered pass; it cannot be run on demand"
        )
        .into());
    }

    let mut env = RunEnv::new(
        settings.host.clone(),
        settings.target.clone(),
        settings.env.clone(),
        scene,
        docs,
    );
    plugin
        .process_context(cx, &mut env)
        .with_context(|| format!("run '{id}'"))?;
    Ok(())
}

/// Write `report.json` and `context.json` to the output directory.
pub fn write_publish_artifacts(outcome: &PublishOutcome, out_dir: &Utf8Path) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)?;

    let report_json =
        serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    fs::write(out_dir.join("report.json"), report_json)?;

    let context_wire = serde_json::json!({
        "schema": schema::SHOTPUB_CONTEXT_V1,
        "context": outcome.context,
    });
    let context_json =
        serde_json::to_string_pretty(&context_wire).context("serialize context")?;
    fs::write(out_dir.join("context.json"), context_json)?;

    Ok(())
}

fn finish_record(
    cx: &mut Context,
    plugin: &dyn Plugin,
    spec: &PluginSpec,
    target: RecordTarget,
    result: anyhow::Result<()>,
    invoked: Instant,
) {
    let duration_ms = invoked.elapsed().as_millis() as u64;
    let record = match result {
        Ok(()) => RunRecord::success(&spec.id, target, duration_ms),
        Err(e) => {
            warn!(plugin = %spec.id, "invocation failed: {e:#}");
            let mut record = RunRecord::failure(&spec.id, target, duration_ms, format!("{e:#}"));
            if let Some(action) = plugin.recovery_action() {
                record.action = Some(action.label().to_string());
            }
            record
        }
    };
    cx.records.push(record);
}

fn build_report(
    cx: &Context,
    tool: ReportToolInfo,
    settings: &PublishSettings,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    nothing_collected: bool,
) -> PublishReport {
    let errors = cx.records.iter().filter(|r| !r.success).count() as u64;
    let status = if errors > 0 {
        ReportStatus::Fail
    } else if nothing_collected {
        ReportStatus::Skip
    } else {
        ReportStatus::Pass
    };

    let mut reasons = Vec::new();
    if nothing_collected {
        reasons.push("nothing_collected".to_string());
    }

    PublishReport {
        schema: schema::SHOTPUB_REPORT_V1.to_string(),
        tool,
        run: ReportRunInfo {
            run_id: Uuid::new_v4(),
            host: settings.host.clone(),
            target: settings.target.clone(),
            started_at,
            ended_at: Some(Utc::now()),
            duration_ms: Some(duration_ms),
        },
        verdict: ReportVerdict {
            status,
            counts: ReportCounts {
                invocations: cx.records.len() as u64,
                instances: cx.instances.len() as u64,
                errors,
            },
            reasons,
        },
        findings: cx.records.iter().filter_map(ReportFinding::from_record).collect(),
    }
}
