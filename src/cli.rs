//! CLI argument parsing for the chart validation harness.
//!
//! The CLI is thin: it resolves the root and config overrides, then hands off
//! to discovery, execution, and lint modules.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "chartcheck",
    version,
    about = "Discover chart scripts in a lesson tree and validate their PDF output",
    after_help = "Commands:\n  init --root <dir>                Write a default chartcheck.json\n  discover --root <dir>            List chart scripts and discovery issues\n  run --root <dir>                 Execute every chart script and check its PDF\n  lint --root <dir>                Check chart sources for course conventions\n\nExamples:\n  chartcheck discover --root .\n  chartcheck run --root . --filter L03_\n  chartcheck run --root . --json --report target/charts.json\n  chartcheck lint --root . --sample 0",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Discover(DiscoverArgs),
    Run(RunArgs),
    Lint(LintArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a default chartcheck.json into the lesson root")]
pub struct InitArgs {
    /// Lesson root containing L*_ directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Overwrite an existing chartcheck.json
    #[arg(long, conflicts_with = "stdout")]
    pub force: bool,

    /// Print the default config instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List discovered chart scripts and discovery issues")]
pub struct DiscoverArgs {
    /// Lesson root containing L*_ directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Minimum number of chart scripts expected (0 disables the check)
    #[arg(long, value_name = "N")]
    pub min_units: Option<usize>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Emit debug logging to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Execute chart scripts and validate their artifacts")]
pub struct RunArgs {
    /// Lesson root containing L*_ directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Only run units whose id (`<lesson>/<topic>`) contains this substring
    #[arg(long, value_name = "SUBSTR")]
    pub filter: Option<String>,

    /// Per-script timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Interpreter command used to run each script
    #[arg(long, value_name = "CMD")]
    pub interpreter: Option<String>,

    /// Minimum number of chart scripts expected (0 disables the check)
    #[arg(long, value_name = "N")]
    pub min_units: Option<usize>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug logging to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Check chart sources for docstrings, palette, and save location")]
pub struct LintArgs {
    /// Lesson root containing L*_ directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Number of leading scripts to check (0 checks all)
    #[arg(long, value_name = "N")]
    pub sample: Option<usize>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
