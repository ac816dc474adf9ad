use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "EnzRank Developers",
    version,
    about = "EnzRank CLI - graft a ligand into an enzyme binding site, rank mutation sets on fitness and design scores, and check rankings against experiment.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel scoring.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank experimentally characterized mutation sets and compare with their labels.
    Validate(ValidateArgs),
    /// Enumerate novel mutation sets, rank them and report the best.
    Predict(PredictArgs),
}

/// Options shared by both run commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to the run file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory the result files are written to. Created if missing.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Override `scoring.tie-epsilon` from the run file.
    #[arg(long, value_name = "FLOAT")]
    pub tie_epsilon: Option<f64>,

    /// Override `scoring.rmsd-tolerance` from the run file.
    #[arg(long, value_name = "ANGSTROM")]
    pub rmsd_tolerance: Option<f64>,

    /// Override `scoring.top-n` from the run file.
    #[arg(short = 'n', long, value_name = "INT")]
    pub top_n: Option<usize>,

    /// Set a specific run-file value, overriding the file.
    /// Can be used multiple times. Example: -S scoring.proximity-radius=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Skip the design-site scan even if the run file requests one.
    #[arg(long)]
    pub no_scan: bool,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Override `enumeration.seed` from the run file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override `enumeration.draws` from the run file.
    #[arg(long, value_name = "INT")]
    pub draws: Option<usize>,
}
