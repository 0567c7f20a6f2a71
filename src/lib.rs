//! Verdict: a small, sequential, assertion-based test harness.
//!
//! Units are registered into a [`Registry`], grouped into suites that may share
//! a [`Fixture`]. The [`Runner`] executes them one at a time and classifies each
//! as passed, failed (an assertion was violated) or errored (anything else).

pub use crate::assertion::{Assertion, AssertionViolation};
pub use crate::diagnostics::{Fault, HarnessError, HarnessResult, Phase, UnitError, UnitResult};
pub use crate::fixture::{with_fixture, Fixture, FixtureReport};
pub use crate::registry::{Pattern, Registry, SuiteBuilder, TestUnit};
pub use crate::runner::{Counts, Outcome, RunSummary, Runner, UnitReport};

pub mod assertion;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod fixture;
pub mod registry;
pub mod runner;
pub mod suites;
