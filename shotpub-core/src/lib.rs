//! Embeddable driver for the publish pass.
//!
//! Clap-free and I/O-abstracted: scene access goes through
//! [`ScenePort`](shotpub_plugins::ScenePort), document lookups through
//! [`DocStore`](shotpub_db::DocStore). The [`adapters`] module provides
//! the headless JSON-manifest scene used for farm-style invocations.
//!
//! # Entry points
//!
//! - [`run_publish`](pipeline::run_publish) — the full ordered pass
//! - [`run_on_demand`](pipeline::run_on_demand) — a single creator/loader
//! - [`exit_code`](pipeline::exit_code) — 0 / 1 / 2 policy

pub mod adapters;
pub mod pipeline;
pub mod settings;

pub use pipeline::{PublishOutcome, ToolError, exit_code, run_publish};
pub use settings::{PublishSettings, Strictness};

// Re-export the registry so embedders don't need shotpub-plugins directly.
pub use shotpub_plugins::Registry;
