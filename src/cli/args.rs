//! Command-line arguments for `run-tests`.
//!
//! Uses `clap` derive. Flags override whatever the config file says.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ColorMode, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "run-tests",
    version,
    about = "Discover and run the bundled test suites."
)]
pub struct RunArgs {
    /// Regular expression matched against `<suite>.<unit>`. Runs every unit when omitted.
    pub pattern: Option<String>,

    /// Config file to load instead of `verdict.yaml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// When to color status words.
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Print every unit with its duration.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print only units that did not pass, and the summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Report format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// List matching units without running them.
    #[arg(long)]
    pub list: bool,
}
