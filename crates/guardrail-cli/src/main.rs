//! Guardrail command-line interface

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "guardrail_core=debug,guardrail_sdk=debug,guardrail_cli=debug"
    } else {
        "guardrail_core=warn,guardrail_sdk=warn,guardrail_cli=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Run(args) => commands::run(&cli, args).await,
        Command::Models(args) => commands::models(&cli, args).await,
        Command::Cases(args) => commands::cases(&cli, args).await,
    }
}
