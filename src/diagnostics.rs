//! Verdict diagnostics.
//!
//! Two error families live here and they never mix:
//!
//! - [`HarnessError`] is fatal. It aborts the whole run and the binary renders it
//!   as a `miette` report on stderr.
//! - [`Fault`] is local to one unit. It becomes an `Errored` outcome and the run
//!   carries on with the next unit.
//!
//! Assertion violations are neither; they live in [`crate::assertion`].

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::assertion::AssertionViolation;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// What a name was supplied for when registration rejected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Suite,
    Unit,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Suite => f.write_str("suite"),
            NameKind::Unit => f.write_str("unit"),
        }
    }
}

/// Fatal harness errors. Any of these stops the run immediately.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("Invalid {kind} name {name:?}")]
    #[diagnostic(
        code(verdict::registry::invalid_name),
        help("suite and unit names must contain at least one non-whitespace character")
    )]
    InvalidName { kind: NameKind, name: String },

    #[error("Invalid unit pattern `{pattern}`")]
    #[diagnostic(
        code(verdict::pattern),
        help("the pattern is a regular expression matched against `<suite>.<unit>`")
    )]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read config file '{}'", path.display())]
    #[diagnostic(code(verdict::config::io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file '{}'", path.display())]
    #[diagnostic(
        code(verdict::config::parse),
        help("known keys are: color, verbosity, format, pattern")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write report")]
    #[diagnostic(code(verdict::report::io))]
    ReportIo(#[from] std::io::Error),

    #[error("Failed to serialize run summary")]
    #[diagnostic(code(verdict::report::json))]
    ReportJson(#[from] serde_json::Error),
}

// ============================================================================
// UNIT FAULTS
// ============================================================================

/// The lifecycle phase a fault was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Body,
    Teardown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Body => "body",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unexpected fault raised while running one unit.
///
/// Must not implement `std::error::Error`; see the blanket `From` impl on [`UnitError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    phase: Phase,
    message: String,
}

impl Fault {
    /// A body fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Body,
            message: message.into(),
        }
    }

    /// Builds a fault from an error, flattening its `source()` chain into the message.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut message = err.to_string();
        let mut cause = err.source();
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        Self::new(message)
    }

    /// Builds a fault from a panic payload caught with `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send), phase: Phase) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            phase,
            message: format!("panicked: {detail}"),
        }
    }

    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Body => f.write_str(&self.message),
            phase => write!(f, "{phase} failed: {}", self.message),
        }
    }
}

// ============================================================================
// UNIT ERRORS
// ============================================================================

pub type UnitResult = Result<(), UnitError>;

/// Why a unit body (or one of its fixture callables) stopped early.
///
/// An assertion violation is an expected kind of stop and classifies the unit
/// as `Failed`. Everything else is a [`Fault`] and classifies it as `Errored`.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    Assertion(AssertionViolation),
    Fault(Fault),
}

impl UnitError {
    /// Collapses this error into a fault of the given phase.
    ///
    /// Used for setup and teardown, where even an assertion counts as an
    /// unexpected fault.
    pub fn into_fault(self, phase: Phase) -> Fault {
        match self {
            UnitError::Assertion(violation) => {
                Fault::new(format!("assertion: {violation}")).in_phase(phase)
            }
            UnitError::Fault(fault) => fault.in_phase(phase),
        }
    }
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::Assertion(violation) => violation.fmt(f),
            UnitError::Fault(fault) => fault.fmt(f),
        }
    }
}

impl From<AssertionViolation> for UnitError {
    fn from(violation: AssertionViolation) -> Self {
        UnitError::Assertion(violation)
    }
}

impl From<Fault> for UnitError {
    fn from(fault: Fault) -> Self {
        UnitError::Fault(fault)
    }
}

impl<E> From<E> for UnitError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        UnitError::Fault(Fault::from_error(&err))
    }
}
