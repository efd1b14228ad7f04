//! The `hogql` binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hogql_cli::{run, Command, Context};
use hogql_configuration::environment::ProcessEnvironment;

/// Translate HogQL queries into ClickHouse SQL.
#[derive(Debug, Parser)]
#[command(name = "hogql", version)]
struct Args {
    #[command(subcommand)]
    subcommand: Command,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(
        args.subcommand,
        Context {
            environment: ProcessEnvironment,
            output: std::io::stdout().lock(),
        },
    )
}
