mod config;

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, PublishOverrides};
use shotpub_core::adapters::JsonScene;
use shotpub_core::pipeline::{execution_order, run_on_demand, write_publish_artifacts};
use shotpub_core::{PublishSettings, Registry, Strictness, exit_code, run_publish};
use shotpub_db::{DirDocStore, DocStore, MemDocStore};
use shotpub_types::Context;
use shotpub_types::report::{ReportStatus, ReportToolInfo};
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "shotpub",
    version,
    about = "Deterministic publish pass for DCC scene manifests."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full ordered publish pass over a scene manifest.
    Publish(PublishArgs),
    /// List the plug-ins the pass would run, in execution order.
    Plugins(PluginsArgs),
    /// Create a publish set in the scene without running the pass.
    Create(CreateArgs),
    /// Reference a published version into the scene.
    Load(LoadArgs),
}

#[derive(Debug, Parser)]
struct PublishArgs {
    /// Scene manifest to publish.
    scene: Utf8PathBuf,

    /// Directory of project/asset documents (default: from shotpub.toml).
    #[arg(long)]
    docs: Option<Utf8PathBuf>,

    /// Output directory for report.json and context.json (default: artifacts).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Host application the pass claims to run in (default: maya).
    #[arg(long)]
    host: Option<String>,

    /// Publish target, e.g. "local" or "farm" (default: local).
    #[arg(long)]
    target: Option<String>,

    /// Failure policy for the pass.
    #[arg(long, value_enum)]
    strictness: Option<StrictnessArg>,

    /// Artist comment recorded on the context.
    #[arg(long)]
    comment: Option<String>,

    /// Project code override.
    #[arg(long)]
    code: Option<String>,

    /// Minimum application version the validators accept.
    #[arg(long)]
    min_app_version: Option<String>,

    /// Directory searched for shotpub.toml (default: the scene's directory).
    #[arg(long)]
    config_root: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct PluginsArgs {
    /// Host to filter the pass for.
    #[arg(long, default_value = "maya")]
    host: String,

    /// Target to filter the pass for.
    #[arg(long, default_value = "local")]
    target: String,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct CreateArgs {
    /// Scene manifest to edit in place.
    scene: Utf8PathBuf,

    /// Family of the new instance (e.g. "pointcache").
    #[arg(long)]
    family: String,

    /// Subset name of the new instance.
    #[arg(long)]
    subset: String,

    /// Asset the instance belongs to.
    #[arg(long)]
    asset: Option<String>,
}

#[derive(Debug, Parser)]
struct LoadArgs {
    /// Scene manifest to edit in place.
    scene: Utf8PathBuf,

    /// Directory of project/asset documents (default: from shotpub.toml).
    #[arg(long)]
    docs: Option<Utf8PathBuf>,

    /// Asset whose published version to reference.
    #[arg(long)]
    asset: String,

    /// Subset to reference.
    #[arg(long)]
    subset: String,

    /// Version number to reference.
    #[arg(long)]
    version: u32,

    /// Representation (file extension) to reference.
    #[arg(long, default_value = "abc")]
    representation: String,

    /// Project override (default: AVALON_PROJECT from the environment).
    #[arg(long)]
    project: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StrictnessArg {
    Complete,
    FailFast,
    GateExtract,
}

impl From<StrictnessArg> for Strictness {
    fn from(arg: StrictnessArg) -> Self {
        match arg {
            StrictnessArg::Complete => Strictness::Complete,
            StrictnessArg::FailFast => Strictness::FailFast,
            StrictnessArg::GateExtract => Strictness::GateExtract,
        }
    }
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Publish(args) => cmd_publish(args),
        Command::Plugins(args) => cmd_plugins(args),
        Command::Create(args) => cmd_create(args),
        Command::Load(args) => cmd_load(args),
    }
}

fn cmd_publish(args: PublishArgs) -> anyhow::Result<ExitCode> {
    let config_root = config_root_for(&args.scene, args.config_root);
    let file_config =
        config::load_or_default(&config_root).context("load shotpub.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_publish_args(PublishOverrides {
        host: args.host,
        target: args.target,
        strictness: args.strictness.map(Strictness::from),
        comment: args.comment,
        code: args.code,
        min_app_version: args.min_app_version,
        docs: args.docs,
        out_dir: args.out_dir,
    })?;

    let mut scene = JsonScene::load(&args.scene)?;
    let docs = open_docs(merged.docs.as_deref())?;
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let registry = Registry::builtin(&env);

    let settings = PublishSettings {
        host: merged.host,
        target: merged.target,
        strictness: merged.strictness,
        comment: merged.comment,
        code: merged.code,
        min_app_version: merged.min_app_version,
        env,
    };

    let outcome = run_publish(&settings, &registry, &mut scene, docs.as_ref(), tool_info())?;
    write_publish_artifacts(&outcome, &merged.out_dir)?;
    info!("wrote publish artifacts to {}", merged.out_dir);

    let verdict = &outcome.report.verdict;
    match verdict.status {
        ReportStatus::Pass => {
            println!(
                "published {} instance(s) in {} invocation(s)",
                verdict.counts.instances, verdict.counts.invocations
            );
        }
        ReportStatus::Skip => {
            println!("nothing collected; nothing to publish");
        }
        ReportStatus::Fail => {
            println!("publish failed with {} error(s):", verdict.counts.errors);
            for finding in &outcome.report.findings {
                match &finding.instance {
                    Some(instance) => {
                        println!("  {} [{}]: {}", finding.plugin, instance, finding.message);
                    }
                    None => println!("  {}: {}", finding.plugin, finding.message),
                }
                if let Some(action) = &finding.action {
                    println!("    recovery: {}", action);
                }
            }
        }
    }

    Ok(ExitCode::from(exit_code(&outcome)))
}

fn cmd_plugins(args: PluginsArgs) -> anyhow::Result<ExitCode> {
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let registry = Registry::builtin(&env);
    let specs = execution_order(&registry, &args.host, &args.target);

    match args.format {
        OutputFormat::Text => {
            println!(
                "Execution order for host '{}', target '{}':\n",
                args.host, args.target
            );
            println!("  {:<7} {:<26} {:<11} FAMILIES", "ORDER", "ID", "KIND");
            println!("  {:<7} {:<26} {:<11} --------", "-----", "--", "----");
            for spec in &specs {
                println!(
                    "  {:<7.2} {:<26} {:<11} {}",
                    spec.order,
                    spec.id,
                    format!("{:?}", spec.kind).to_lowercase(),
                    spec.families.join(", ")
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_create(args: CreateArgs) -> anyhow::Result<ExitCode> {
    let mut scene = JsonScene::load(&args.scene)?;
    let docs = MemDocStore::new(Vec::new());
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let registry = Registry::builtin(&env);
    let settings = PublishSettings {
        env,
        ..PublishSettings::default()
    };

    let mut cx = Context::new();
    cx.data.set("create.family", args.family);
    cx.data.set("create.subset", args.subset);
    if let Some(asset) = args.asset {
        cx.data.set("create.asset", asset);
    }

    run_on_demand(
        &registry,
        "create_publish_set",
        &settings,
        &mut scene,
        &docs,
        &mut cx,
    )?;
    scene.save(&args.scene)?;

    if let Some(node) = cx.data.str("create.node") {
        println!("created publish set {}", node);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_load(args: LoadArgs) -> anyhow::Result<ExitCode> {
    let config_root = config_root_for(&args.scene, None);
    let file_config =
        config::load_or_default(&config_root).context("load shotpub.toml config")?;
    let docs_dir = args.docs.or(file_config.paths.docs);

    let mut scene = JsonScene::load(&args.scene)?;
    let docs = open_docs(docs_dir.as_deref())?;
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let registry = Registry::builtin(&env);
    let settings = PublishSettings {
        env,
        ..PublishSettings::default()
    };

    let mut cx = Context::new();
    cx.data.set("load.asset", args.asset);
    cx.data.set("load.subset", args.subset);
    cx.data.set("load.version", args.version);
    cx.data.set("load.representation", args.representation);
    if let Some(project) = args.project {
        cx.data.set("load.project", project);
    }

    run_on_demand(
        &registry,
        "reference_loader",
        &settings,
        &mut scene,
        docs.as_ref(),
        &mut cx,
    )?;
    scene.save(&args.scene)?;

    if let Some(node) = cx.data.str("load.node") {
        println!("referenced as {}", node);
    }
    Ok(ExitCode::SUCCESS)
}

/// Config discovery root: explicit flag, else the scene's directory.
fn config_root_for(scene: &Utf8Path, explicit: Option<Utf8PathBuf>) -> Utf8PathBuf {
    explicit
        .or_else(|| scene.parent().map(Utf8Path::to_path_buf))
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

fn open_docs(dir: Option<&Utf8Path>) -> anyhow::Result<Box<dyn DocStore>> {
    match dir {
        Some(dir) => {
            let store = DirDocStore::load(dir)
                .with_context(|| format!("load documents from {}", dir))?;
            info!("loaded {} document(s) from {}", store.len(), dir);
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemDocStore::new(Vec::new()))),
    }
}

fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "shotpub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
