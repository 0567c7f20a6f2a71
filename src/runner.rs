//! Sequential unit runner.
//!
//! Units run one at a time, in the order they are produced, each inside its
//! suite's fixture. Every unit yields exactly one [`Outcome`]; failed and
//! errored units never stop the run.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::assertion::AssertionViolation;
use crate::diagnostics::{Fault, UnitError};
use crate::fixture::FixtureReport;
use crate::registry::TestUnit;

/// Classification of a unit after it ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed(AssertionViolation),
    Errored(Fault),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed(_) => "FAILED",
            Outcome::Errored(_) => "ERRORED",
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// One unit's outcome plus what else was observed while running it.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    #[serde(flatten)]
    unit: TestUnit,
    outcome: Outcome,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    teardown_fault: Option<Fault>,
}

impl UnitReport {
    /// Classifies a fixture report.
    ///
    /// A teardown fault after a passing body turns the unit into `Errored`.
    /// After a failed or errored body it is kept as a secondary diagnostic.
    pub fn classify(unit: TestUnit, report: FixtureReport, duration: Duration) -> Self {
        let (outcome, teardown_fault) = match (report.primary, report.teardown) {
            (Ok(()), None) => (Outcome::Passed, None),
            (Ok(()), Some(fault)) => (Outcome::Errored(fault), None),
            (Err(UnitError::Assertion(violation)), teardown) => {
                (Outcome::Failed(violation), teardown)
            }
            (Err(UnitError::Fault(fault)), teardown) => (Outcome::Errored(fault), teardown),
        };
        Self {
            unit,
            outcome,
            duration,
            teardown_fault,
        }
    }

    pub fn unit(&self) -> &TestUnit {
        &self.unit
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// A teardown fault that did not decide the outcome.
    pub fn teardown_fault(&self) -> Option<&Fault> {
        self.teardown_fault.as_ref()
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Aggregate outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl Counts {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// The result of one run. Read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(rename = "units")]
    reports: Vec<UnitReport>,
    counts: Counts,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    elapsed: Duration,
}

impl RunSummary {
    pub fn reports(&self) -> &[UnitReport] {
        &self.reports
    }

    /// `(unit, outcome)` pairs in run order.
    pub fn outcomes(&self) -> impl Iterator<Item = (&TestUnit, &Outcome)> + '_ {
        self.reports.iter().map(|r| (r.unit(), r.outcome()))
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        self.counts.all_passed()
    }
}

/// Drives units through their fixtures and collects a [`RunSummary`].
pub struct Runner;

impl Runner {
    /// Runs every unit and returns the summary.
    pub fn run<'a, I>(units: I) -> RunSummary
    where
        I: IntoIterator<Item = &'a TestUnit>,
    {
        match Self::run_with(units, |_| Ok::<(), Infallible>(())) {
            Ok(summary) => summary,
            Err(never) => match never {},
        }
    }

    /// Runs every unit, handing each report to `on_report` as soon as it is ready.
    ///
    /// An error from `on_report` aborts the run.
    pub fn run_with<'a, I, F, E>(units: I, mut on_report: F) -> Result<RunSummary, E>
    where
        I: IntoIterator<Item = &'a TestUnit>,
        F: FnMut(&UnitReport) -> Result<(), E>,
    {
        let started = Instant::now();
        let mut reports = Vec::new();
        let mut counts = Counts::default();

        for unit in units {
            let report = Self::run_unit(unit);
            counts.record(report.outcome());
            on_report(&report)?;
            reports.push(report);
        }

        let elapsed = started.elapsed();
        info!(
            total = counts.total(),
            passed = counts.passed,
            failed = counts.failed,
            errored = counts.errored,
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );
        Ok(RunSummary {
            reports,
            counts,
            elapsed,
        })
    }

    fn run_unit(unit: &TestUnit) -> UnitReport {
        let span = tracing::debug_span!("unit", name = %unit.qualified_name());
        let _enter = span.enter();

        let started = Instant::now();
        let fixture_report = unit.execute();
        let report = UnitReport::classify(unit.clone(), fixture_report, started.elapsed());

        if let Some(fault) = report.teardown_fault() {
            warn!(%fault, "teardown fault after {}", report.outcome().as_str());
        }
        debug!(
            outcome = report.outcome().as_str(),
            elapsed_us = report.duration().as_micros() as u64,
            "unit finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::assertion::equals;
    use crate::registry::Registry;

    #[test]
    fn one_outcome_per_unit_in_registration_order() {
        let mut registry = Registry::new();
        registry.register("S", "pass", || Ok(())).unwrap();
        registry
            .register("S", "fail", || Ok(equals(4, "abc".len())?))
            .unwrap();
        registry
            .register("T", "error", || Err(crate::Fault::new("boom").into()))
            .unwrap();

        let summary = Runner::run(registry.all_units());
        let seen: Vec<_> = summary
            .outcomes()
            .map(|(unit, outcome)| (unit.qualified_name(), outcome.as_str()))
            .collect();
        assert_eq!(
            seen,
            [
                ("S.pass".to_string(), "PASSED"),
                ("S.fail".to_string(), "FAILED"),
                ("T.error".to_string(), "ERRORED"),
            ]
        );
        assert_eq!(
            summary.counts(),
            Counts {
                passed: 1,
                failed: 1,
                errored: 1
            }
        );
        assert!(!summary.is_success());
    }

    #[test]
    fn teardown_fault_after_pass_errors_the_unit() {
        let mut registry = Registry::new();
        registry
            .suite::<()>("S")
            .unwrap()
            .teardown(|_| Err(crate::Fault::new("close failed").into()))
            .unit("u", |_| Ok(()))
            .unwrap();

        let summary = Runner::run(registry.all_units());
        let report = &summary.reports()[0];
        match report.outcome() {
            Outcome::Errored(fault) => assert_eq!(fault.to_string(), "teardown failed: close failed"),
            other => panic!("expected errored, got {other:?}"),
        }
        assert!(report.teardown_fault().is_none());
    }

    #[test]
    fn teardown_fault_after_failure_is_secondary() {
        let mut registry = Registry::new();
        registry
            .suite::<()>("S")
            .unwrap()
            .teardown(|_| Err(crate::Fault::new("close failed").into()))
            .unit("u", |_| Ok(equals(1, 2)?))
            .unwrap();

        let summary = Runner::run(registry.all_units());
        let report = &summary.reports()[0];
        assert!(matches!(report.outcome(), Outcome::Failed(_)));
        assert!(report.teardown_fault().is_some());
    }

    #[test]
    fn observer_error_aborts_the_run() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        for name in ["a", "b", "c"] {
            let calls = Rc::clone(&calls);
            registry
                .register("S", name, move || {
                    calls.set(calls.get() + 1);
                    Ok(())
                })
                .unwrap();
        }

        let result = Runner::run_with(registry.all_units(), |report| {
            if report.unit().name() == "b" {
                Err("reporter closed")
            } else {
                Ok(())
            }
        });
        assert_eq!(result.unwrap_err(), "reporter closed");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn empty_run_is_a_success() {
        let registry = Registry::new();
        let summary = Runner::run(registry.all_units());
        assert_eq!(summary.counts().total(), 0);
        assert!(summary.is_success());
    }

    #[test]
    fn summary_serializes_outcomes() {
        let mut registry = Registry::new();
        registry
            .register("S", "fail", || Ok(equals(4, "abc".len())?))
            .unwrap();
        let summary = Runner::run(registry.all_units());

        let json = serde_json::to_value(&summary).unwrap();
        let unit = &json["units"][0];
        assert_eq!(unit["suite"], "S");
        assert_eq!(unit["unit"], "fail");
        assert_eq!(unit["outcome"]["status"], "failed");
        assert_eq!(unit["outcome"]["detail"]["expected"], "4");
        assert_eq!(unit["outcome"]["detail"]["actual"], "3");
        assert_eq!(json["counts"]["failed"], 1);
    }
}
