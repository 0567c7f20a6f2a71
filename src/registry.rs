//! # Case Registry
//!
//! Collects test units grouped into suites and hands them out in a stable order:
//! suites in the order they were first registered, units in registration order
//! within each suite.
//!
//! A registry is an ordinary value. Build one per invocation and pass it to the
//! runner; nothing is stored in process-wide state.
//!
//! Registering the same `(suite, unit)` pair twice keeps both units. Nothing is
//! deduplicated.

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::diagnostics::{HarnessError, HarnessResult, NameKind, UnitResult};
use crate::fixture::{Bound, BoundBody, Fixture, FixtureReport};

/// A single registered test case. Immutable once registered; cheap to clone.
#[derive(Clone)]
pub struct TestUnit {
    suite: Rc<str>,
    name: Rc<str>,
    body: Rc<dyn BoundBody>,
}

impl TestUnit {
    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<suite>.<unit>`, as printed by the reporter and matched by patterns.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }

    /// Runs the body inside its suite's fixture.
    pub fn execute(&self) -> FixtureReport {
        self.body.execute()
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Serialize for TestUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TestUnit", 2)?;
        state.serialize_field("suite", &*self.suite)?;
        state.serialize_field("unit", &*self.name)?;
        state.end()
    }
}

struct SuiteGroup {
    name: Rc<str>,
    units: Vec<TestUnit>,
}

/// The set of units for one run.
#[derive(Default)]
pub struct Registry {
    groups: Vec<SuiteGroup>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit with no fixture.
    pub fn register<B>(&mut self, suite: &str, unit: &str, body: B) -> HarnessResult<()>
    where
        B: Fn() -> UnitResult + 'static,
    {
        let suite = validate(NameKind::Suite, suite)?;
        let fixture = Rc::new(Fixture::<()>::default());
        self.insert(suite, unit, fixture, Rc::new(move |_: &mut ()| body()))
    }

    /// Starts a suite whose units share a fixture over state `S`.
    pub fn suite<S>(&mut self, name: &str) -> HarnessResult<SuiteBuilder<'_, S>>
    where
        S: Default + 'static,
    {
        Ok(SuiteBuilder {
            name: validate(NameKind::Suite, name)?,
            fixture: Rc::new(Fixture::default()),
            registry: self,
        })
    }

    fn insert<S>(
        &mut self,
        suite: Rc<str>,
        unit: &str,
        fixture: Rc<Fixture<S>>,
        body: Rc<dyn Fn(&mut S) -> UnitResult>,
    ) -> HarnessResult<()>
    where
        S: Default + 'static,
    {
        let name = validate(NameKind::Unit, unit)?;
        tracing::trace!(suite = %suite, unit = %name, "registering unit");
        let unit = TestUnit {
            suite: Rc::clone(&suite),
            name,
            body: Rc::new(Bound { fixture, body }),
        };
        match self.groups.iter_mut().find(|g| g.name == suite) {
            Some(group) => group.units.push(unit),
            None => self.groups.push(SuiteGroup {
                name: suite,
                units: vec![unit],
            }),
        }
        Ok(())
    }

    /// Every unit, grouped by suite. Each call starts a fresh pass.
    pub fn all_units(&self) -> Units<'_> {
        Units {
            groups: self.groups.iter(),
            current: Default::default(),
        }
    }

    /// The units whose qualified name matches `pattern`, or all of them.
    pub fn matching<'a>(
        &'a self,
        pattern: Option<&'a Pattern>,
    ) -> impl Iterator<Item = &'a TestUnit> + Clone + 'a {
        self.all_units()
            .filter(move |unit| pattern.map_or(true, |p| p.matches(unit)))
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.groups.iter().map(|g| &*g.name)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.units.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.units.is_empty())
    }
}

fn validate(kind: NameKind, name: &str) -> HarnessResult<Rc<str>> {
    if name.trim().is_empty() {
        return Err(HarnessError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(Rc::from(name))
}

/// Lazy, restartable iteration over a registry's units.
#[derive(Clone)]
pub struct Units<'a> {
    groups: std::slice::Iter<'a, SuiteGroup>,
    current: std::slice::Iter<'a, TestUnit>,
}

impl<'a> Iterator for Units<'a> {
    type Item = &'a TestUnit;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.current.next() {
                return Some(unit);
            }
            self.current = self.groups.next()?.units.iter();
        }
    }
}

/// Registers the units of one suite.
///
/// Setup and teardown apply to units added after them.
pub struct SuiteBuilder<'r, S> {
    registry: &'r mut Registry,
    name: Rc<str>,
    fixture: Rc<Fixture<S>>,
}

impl<'r, S> SuiteBuilder<'r, S>
where
    S: Default + 'static,
{
    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut S) -> UnitResult + 'static,
    {
        self.fixture = Rc::new((*self.fixture).clone().with_setup(setup));
        self
    }

    pub fn teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn(&mut S) -> UnitResult + 'static,
    {
        self.fixture = Rc::new((*self.fixture).clone().with_teardown(teardown));
        self
    }

    pub fn unit<B>(self, name: &str, body: B) -> HarnessResult<Self>
    where
        B: Fn(&mut S) -> UnitResult + 'static,
    {
        self.registry.insert(
            Rc::clone(&self.name),
            name,
            Rc::clone(&self.fixture),
            Rc::new(body),
        )?;
        Ok(self)
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

/// A regular expression selecting units by qualified name.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> HarnessResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| HarnessError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, unit: &TestUnit) -> bool {
        self.regex.is_match(&unit.qualified_name())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
