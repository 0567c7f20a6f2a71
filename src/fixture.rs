//! Fixture lifecycle: setup, body, teardown.
//!
//! State is created fresh (`S::default()`) for each unit. Setup fills it in, the
//! body borrows it, and teardown drains it. Because setup works on a state it
//! does not own, whatever it acquired before failing is still there for
//! teardown to release.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::diagnostics::{Fault, Phase, UnitError, UnitResult};

pub type StepFn<S> = Rc<dyn Fn(&mut S) -> UnitResult>;

/// What the lifecycle observed while running one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureReport {
    /// Result of setup and, if setup succeeded, of the body.
    /// Setup errors always arrive as a [`Fault`] in [`Phase::Setup`].
    pub primary: UnitResult,
    /// Teardown's own fault, kept apart so it never masks `primary`.
    pub teardown: Option<Fault>,
}

/// Runs `body` between `setup` and `teardown`.
///
/// Teardown runs on every exit path: after success, after an assertion
/// violation, after a fault, after a panic, and after a failed setup.
pub fn with_fixture<S, Setup, Teardown, Body>(
    setup: Setup,
    teardown: Teardown,
    body: Body,
) -> FixtureReport
where
    S: Default,
    Setup: FnOnce(&mut S) -> UnitResult,
    Teardown: FnOnce(&mut S) -> UnitResult,
    Body: FnOnce(&mut S) -> UnitResult,
{
    let mut state = S::default();

    let primary = match guarded(Phase::Setup, || setup(&mut state)) {
        Ok(()) => guarded(Phase::Body, || body(&mut state)),
        Err(err) => Err(UnitError::Fault(err.into_fault(Phase::Setup))),
    };

    let teardown = guarded(Phase::Teardown, || teardown(&mut state))
        .err()
        .map(|err| err.into_fault(Phase::Teardown));

    FixtureReport { primary, teardown }
}

/// Runs one phase, converting panics into faults of that phase.
fn guarded<F>(phase: Phase, step: F) -> UnitResult
where
    F: FnOnce() -> UnitResult,
{
    match panic::catch_unwind(AssertUnwindSafe(step)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(UnitError::Fault(fault))) => Err(UnitError::Fault(fault.in_phase(phase))),
        Ok(Err(violation)) => Err(violation),
        Err(payload) => Err(UnitError::Fault(Fault::from_panic(payload.as_ref(), phase))),
    }
}

// ============================================================================
// SUITE FIXTURES
// ============================================================================

/// Optional setup and teardown callables shared by every unit of a suite.
pub struct Fixture<S> {
    setup: Option<StepFn<S>>,
    teardown: Option<StepFn<S>>,
}

impl<S> Clone for Fixture<S> {
    fn clone(&self) -> Self {
        Self {
            setup: self.setup.clone(),
            teardown: self.teardown.clone(),
        }
    }
}

impl<S> Default for Fixture<S> {
    fn default() -> Self {
        Self {
            setup: None,
            teardown: None,
        }
    }
}

impl<S> Fixture<S> {
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut S) -> UnitResult + 'static,
    {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn with_teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn(&mut S) -> UnitResult + 'static,
    {
        self.teardown = Some(Rc::new(teardown));
        self
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    pub fn has_teardown(&self) -> bool {
        self.teardown.is_some()
    }
}

impl<S: Default> Fixture<S> {
    /// Runs `body` inside this fixture. Missing callables are no-ops.
    pub fn run<B>(&self, body: B) -> FixtureReport
    where
        B: FnOnce(&mut S) -> UnitResult,
    {
        with_fixture(
            |state: &mut S| match &self.setup {
                Some(setup) => setup(state),
                None => Ok(()),
            },
            |state: &mut S| match &self.teardown {
                Some(teardown) => teardown(state),
                None => Ok(()),
            },
            body,
        )
    }
}

/// A unit body bound to its suite's fixture, with the state type erased.
pub(crate) trait BoundBody {
    fn execute(&self) -> FixtureReport;
}

pub(crate) struct Bound<S> {
    pub(crate) fixture: Rc<Fixture<S>>,
    pub(crate) body: StepFn<S>,
}

impl<S: Default> BoundBody for Bound<S> {
    fn execute(&self) -> FixtureReport {
        self.fixture.run(|state| (self.body)(state))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::assertion::equals;

    #[derive(Default)]
    struct Conn {
        open: bool,
        log: Vec<&'static str>,
    }

    fn counting_teardown(calls: &Cell<usize>) -> impl FnOnce(&mut Conn) -> UnitResult + '_ {
        move |_| {
            calls.set(calls.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn teardown_runs_once_after_success() {
        let calls = Cell::new(0);
        let report = with_fixture(
            |c: &mut Conn| {
                c.open = true;
                Ok(())
            },
            counting_teardown(&calls),
            |c| Ok(equals(true, c.open)?),
        );
        assert_eq!(report.primary, Ok(()));
        assert_eq!(report.teardown, None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn teardown_runs_once_after_assertion_failure() {
        let calls = Cell::new(0);
        let report = with_fixture(|_| Ok(()), counting_teardown(&calls), |_| {
            Ok(equals(4, "abc".len())?)
        });
        assert!(matches!(report.primary, Err(UnitError::Assertion(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn teardown_runs_once_after_panic() {
        let calls = Cell::new(0);
        let report = with_fixture(|_| Ok(()), counting_teardown(&calls), |_: &mut Conn| {
            panic!("body exploded")
        });
        match report.primary {
            Err(UnitError::Fault(fault)) => {
                assert_eq!(fault.phase(), Phase::Body);
                assert_eq!(fault.message(), "panicked: body exploded");
            }
            other => panic!("expected fault, got {other:?}"),
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_setup_skips_body_but_tears_down_partial_state() {
        let body_ran = Cell::new(false);
        let released = RefCell::new(Vec::new());
        let report = with_fixture(
            |c: &mut Conn| {
                c.log.push("socket");
                Err(Fault::new("database unavailable").into())
            },
            |c| {
                released.borrow_mut().extend(c.log.drain(..));
                Ok(())
            },
            |_| {
                body_ran.set(true);
                Ok(())
            },
        );
        assert!(!body_ran.get());
        assert_eq!(*released.borrow(), vec!["socket"]);
        match report.primary {
            Err(UnitError::Fault(fault)) => assert_eq!(fault.phase(), Phase::Setup),
            other => panic!("expected setup fault, got {other:?}"),
        }
    }

    #[test]
    fn assertion_in_setup_is_a_fault() {
        let report = with_fixture(
            |_: &mut Conn| Ok(equals(1, 2)?),
            |_| Ok(()),
            |_| Ok(()),
        );
        assert!(matches!(
            report.primary,
            Err(UnitError::Fault(ref f)) if f.phase() == Phase::Setup
        ));
    }

    #[test]
    fn teardown_fault_does_not_mask_primary() {
        let report = with_fixture(
            |_: &mut Conn| Ok(()),
            |_| Err(Fault::new("close failed").into()),
            |_| Ok(equals(1, 2)?),
        );
        assert!(matches!(report.primary, Err(UnitError::Assertion(_))));
        let teardown = report.teardown.expect("teardown fault recorded");
        assert_eq!(teardown.phase(), Phase::Teardown);
        assert_eq!(teardown.to_string(), "teardown failed: close failed");
    }

    #[test]
    fn suite_fixture_without_callables_runs_body() {
        let fixture: Fixture<Conn> = Fixture::default();
        assert!(!fixture.has_setup());
        let report = fixture.run(|c| {
            c.open = true;
            Ok(())
        });
        assert_eq!(report.primary, Ok(()));
    }

    #[test]
    fn suite_fixture_gives_each_run_fresh_state() {
        let fixture = Fixture::default()
            .with_setup(|c: &mut Conn| {
                c.log.push("setup");
                Ok(())
            })
            .with_teardown(|c: &mut Conn| {
                c.open = false;
                Ok(())
            });
        for _ in 0..2 {
            let report = fixture.run(|c| Ok(equals(vec!["setup"], c.log.clone())?));
            assert_eq!(report.primary, Ok(()));
        }
    }
}
