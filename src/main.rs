use anyhow::{anyhow, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod discover;
mod execute;
mod lint;
mod naming;
mod report;
mod run;
mod schema;
mod util;
mod validate;

use cli::{Command, DiscoverArgs, InitArgs, LintArgs, RootArgs, RunArgs};
use config::HarnessConfig;
use schema::{floor_ok, DiscoveryReport, REPORT_SCHEMA_VERSION};

/// Env var holding a `tracing` filter directive (e.g. `chartcheck=debug`).
const LOG_ENV: &str = "CHARTCHECK_LOG";

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    let verbose = match &args.command {
        Command::Discover(args) => args.verbose,
        Command::Run(args) => args.verbose,
        Command::Init(_) | Command::Lint(_) => false,
    };
    init_tracing(verbose);

    let passed = match args.command {
        Command::Init(args) => cmd_init(args)?,
        Command::Discover(args) => cmd_discover(args)?,
        Command::Run(args) => cmd_run(args)?,
        Command::Lint(args) => cmd_lint(args)?,
    };
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_init(args: InitArgs) -> Result<bool> {
    if args.stdout {
        println!("{}", config::config_stub()?);
        return Ok(true);
    }
    let path = config::config_path(&args.root);
    if path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    let path = config::write_config(&args.root, &HarnessConfig::default())?;
    println!("Wrote config to {}", path.display());
    Ok(true)
}

fn cmd_discover(args: DiscoverArgs) -> Result<bool> {
    let mut config = config::load_config(&args.root)?;
    if let Some(min_units) = args.min_units {
        config.min_units = min_units;
    }
    let discovery = discover::discover(&args.root, &config)?;
    let report = DiscoveryReport {
        schema_version: REPORT_SCHEMA_VERSION,
        floor_ok: floor_ok(discovery.units.len(), config.min_units),
        min_units: config.min_units,
        root: discovery.root,
        units: discovery.units,
        issues: discovery.issues,
    };
    if args.json {
        println!("{}", report::to_json(&report)?);
    } else {
        print!("{}", report::render_discovery(&report));
    }
    Ok(report.passed())
}

fn cmd_run(args: RunArgs) -> Result<bool> {
    let mut config = config::load_config(&args.root)?;
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
    if let Some(interpreter) = args.interpreter {
        config.interpreter = interpreter;
    }
    if let Some(min_units) = args.min_units {
        config.min_units = min_units;
    }
    config::validate_config(&config)?;

    let options = run::RunOptions {
        filter: args.filter,
    };
    let report = run::run_sweep(&args.root, &config, &options)?;
    if let Some(path) = &args.report {
        report::write_json(path, &report)?;
        tracing::info!(path = %path.display(), "wrote run report");
    }
    if args.json {
        println!("{}", report::to_json(&report)?);
    } else {
        print!("{}", report::render_run(&report));
    }
    Ok(report.passed())
}

fn cmd_lint(args: LintArgs) -> Result<bool> {
    let mut config = config::load_config(&args.root)?;
    if let Some(sample) = args.sample {
        config.lint.sample = sample;
    }
    let discovery = discover::discover(&args.root, &config)?;
    let report = lint::lint(&discovery.units, &config.lint)?;
    if args.json {
        println!("{}", report::to_json(&report)?);
    } else {
        print!("{}", report::render_lint(&report));
    }
    Ok(report.passed())
}
