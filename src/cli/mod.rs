//! The `run-tests` command-line interface.
//!
//! Builds a fresh registry with the bundled suites, selects units by pattern,
//! runs them and reports. Exit status is 0 when every unit passed, 1 when any
//! unit failed or errored, and 2 when the harness itself faulted.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::RunArgs;
use crate::cli::output::Reporter;
use crate::config::{HarnessConfig, OutputFormat, Verbosity};
use crate::diagnostics::{HarnessError, HarnessResult};
use crate::registry::{Pattern, Registry};
use crate::runner::Runner;
use crate::suites;

pub mod args;
pub mod output;

/// How a completed invocation should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failures,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failures => ExitCode::from(1),
        }
    }
}

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    init_tracing();
    // Panics inside units are caught and reported as faults; keep the default
    // hook from printing them a second time.
    std::panic::set_hook(Box::new(|info| {
        tracing::debug!(%info, "unit panicked");
    }));

    let args = RunArgs::parse();
    match execute(&args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Merges command-line flags over the config file.
pub fn resolve_config(args: &RunArgs) -> HarnessResult<HarnessConfig> {
    let mut config = HarnessConfig::discover(args.config.as_deref())?;
    if let Some(color) = args.color {
        config.color = color;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.verbose {
        config.verbosity = Verbosity::Verbose;
    } else if args.quiet {
        config.verbosity = Verbosity::Quiet;
    }
    if args.pattern.is_some() {
        config.pattern.clone_from(&args.pattern);
    }
    Ok(config)
}

/// Runs one invocation against a fresh registry holding the bundled suites.
pub fn execute(args: &RunArgs) -> HarnessResult<RunStatus> {
    let config = resolve_config(args)?;
    let mut registry = Registry::new();
    suites::register_all(&mut registry)?;
    execute_with(args, &config, &registry)
}

/// Runs one invocation against an explicit registry.
pub fn execute_with(
    args: &RunArgs,
    config: &HarnessConfig,
    registry: &Registry,
) -> HarnessResult<RunStatus> {
    let pattern = config.pattern.as_deref().map(Pattern::new).transpose()?;
    let units = registry.matching(pattern.as_ref());
    let mut reporter = Reporter::stdout(config.color_choice(), config.verbosity);

    if args.list {
        reporter.list(units)?;
        return Ok(RunStatus::Success);
    }

    tracing::info!(
        units = units.clone().count(),
        pattern = pattern.as_ref().map(Pattern::as_str),
        "starting run"
    );
    let summary = match config.format {
        OutputFormat::Text => {
            let summary = Runner::run_with(units, |report| {
                reporter.unit_finished(report).map_err(HarnessError::from)
            })?;
            reporter.summary(&summary)?;
            summary
        }
        OutputFormat::Json => {
            let summary = Runner::run(units);
            reporter.json(&summary)?;
            summary
        }
    };

    Ok(if summary.is_success() {
        RunStatus::Success
    } else {
        RunStatus::Failures
    })
}
