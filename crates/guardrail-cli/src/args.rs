//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Safety evaluation orchestration for language models
#[derive(Debug, Parser)]
#[command(name = "guardrail", version, about)]
pub struct Cli {
    /// Path to the model configuration file (JSON array of models)
    #[arg(long, global = true, default_value = "models.json")]
    pub models_file: PathBuf,

    /// Path to the test case file (JSON array of cases)
    #[arg(long, global = true, default_value = "cases.json")]
    pub cases_file: PathBuf,

    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a batch of test cases against one or more models
    Run(RunArgs),
    /// List configured models or verify their endpoints
    Models(ModelsArgs),
    /// List catalog test cases
    Cases(CasesArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Model ids to evaluate (repeatable)
    #[arg(short, long = "model", required = true)]
    pub models: Vec<String>,

    /// Test case ids to run (repeatable)
    #[arg(short, long = "case")]
    pub cases: Vec<String>,

    /// Run every catalog case in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Ad-hoc prompt to evaluate instead of (or alongside) catalog cases
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// System prompt for the ad-hoc prompt
    #[arg(long, requires = "prompt")]
    pub system: Option<String>,

    /// Cap on concurrently in-flight units (default: unbounded)
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Retry attempts per unit after a failure
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Pass threshold applied to every score dimension
    #[arg(long, default_value_t = 0.6)]
    pub threshold: f64,

    /// Write the full report as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct ModelsArgs {
    /// Verify endpoint reachability instead of just listing
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, Parser)]
pub struct CasesArgs {
    /// Only cases in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only cases with this method name
    #[arg(long)]
    pub method: Option<String>,
}
