//! Console reporting for `run-tests`.
//!
//! Status lines have the form `<suite>.<unit>: PASSED`,
//! `<suite>.<unit>: FAILED: <reason>` or `<suite>.<unit>: ERRORED: <cause>`,
//! followed by a summary of the counts. Output goes through any
//! [`WriteColor`], so tests can capture it uncolored.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::Verbosity;
use crate::diagnostics::HarnessResult;
use crate::registry::TestUnit;
use crate::runner::{Outcome, RunSummary, UnitReport};

pub struct Reporter<W> {
    out: W,
    verbosity: Verbosity,
}

impl Reporter<StandardStream> {
    pub fn stdout(choice: ColorChoice, verbosity: Verbosity) -> Self {
        Self::new(StandardStream::stdout(choice), verbosity)
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self { out, verbosity }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints one unit's status line, plus failure details.
    pub fn unit_finished(&mut self, report: &UnitReport) -> io::Result<()> {
        let outcome = report.outcome();
        if outcome.is_passed() && self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        write!(self.out, "{}: ", report.unit().qualified_name())?;
        self.colored(outcome.as_str(), status_color(outcome))?;
        match outcome {
            Outcome::Passed => {}
            Outcome::Failed(violation) => write!(self.out, ": {violation}")?,
            Outcome::Errored(fault) => write!(self.out, ": {fault}")?,
        }
        if self.verbosity == Verbosity::Verbose {
            write!(self.out, " ({:.3}s)", report.duration().as_secs_f64())?;
        }
        writeln!(self.out)?;

        if let Outcome::Failed(violation) = outcome {
            if violation.expected.contains('\n') || violation.actual.contains('\n') {
                self.diff(&violation.expected, &violation.actual)?;
            }
        }
        if let Some(fault) = report.teardown_fault() {
            writeln!(self.out, "    also: {fault}")?;
        }
        Ok(())
    }

    /// Prints the final counts.
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let counts = summary.counts();
        writeln!(self.out)?;
        write!(
            self.out,
            "Ran {} units in {:.3}s: ",
            counts.total(),
            summary.elapsed().as_secs_f64()
        )?;
        self.colored(&format!("{} passed", counts.passed), Color::Green)?;
        write!(self.out, ", ")?;
        self.colored(&format!("{} failed", counts.failed), Color::Red)?;
        write!(self.out, ", ")?;
        self.colored(&format!("{} errored", counts.errored), Color::Yellow)?;
        writeln!(self.out)?;

        if summary.is_success() {
            self.colored("OK", Color::Green)?;
            writeln!(self.out)?;
            return Ok(());
        }
        self.colored("FAILED", Color::Red)?;
        writeln!(self.out)?;
        for (unit, outcome) in summary.outcomes() {
            if !outcome.is_passed() {
                writeln!(self.out, "  - {} ({})", unit.qualified_name(), outcome.as_str())?;
            }
        }
        Ok(())
    }

    /// Prints qualified names without running anything.
    pub fn list<'a>(&mut self, units: impl IntoIterator<Item = &'a TestUnit>) -> io::Result<()> {
        let mut count = 0;
        for unit in units {
            writeln!(self.out, "{}", unit.qualified_name())?;
            count += 1;
        }
        writeln!(self.out)?;
        writeln!(self.out, "{count} units")
    }

    pub fn json(&mut self, summary: &RunSummary) -> HarnessResult<()> {
        serde_json::to_writer_pretty(&mut self.out, summary)?;
        writeln!(self.out)?;
        Ok(())
    }

    // ========================================================================
    // PRIVATE HELPERS
    // ========================================================================

    fn colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }

    fn diff(&mut self, expected: &str, actual: &str) -> io::Result<()> {
        let changeset = Changeset::new(expected, actual, "\n");
        writeln!(self.out, "    diff (- expected, + actual):")?;
        for diff in &changeset.diffs {
            match diff {
                Difference::Same(text) => {
                    for line in text.lines() {
                        writeln!(self.out, "      {line}")?;
                    }
                }
                Difference::Rem(text) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    for line in text.lines() {
                        writeln!(self.out, "    - {line}")?;
                    }
                    self.out.reset()?;
                }
                Difference::Add(text) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    for line in text.lines() {
                        writeln!(self.out, "    + {line}")?;
                    }
                    self.out.reset()?;
                }
            }
        }
        Ok(())
    }
}

fn status_color(outcome: &Outcome) -> Color {
    match outcome {
        Outcome::Passed => Color::Green,
        Outcome::Failed(_) => Color::Red,
        Outcome::Errored(_) => Color::Yellow,
    }
}
