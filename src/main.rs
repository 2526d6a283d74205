mod ast;
mod canonical_id;
mod classifier;
mod cli;
mod component_parser;
mod config;
mod cross_app;
mod expr;
mod graph;
mod model;
mod orchestrator;
mod project_detector;
mod properties;
mod resolver;
mod store;
mod symbol_table;
mod value_fields;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::Command;

/// Static architecture extraction for Spring Boot codebases.
///
/// Walks a repository's Java sources with no classpath, resolves Spring
/// component wiring and REST/Kafka call sites, and emits a canonical
/// node/edge graph per application.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log verbosity, e.g. "info", "debug", "spring_arch_extract=trace".
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    cli::handle_command(args.command)
}
