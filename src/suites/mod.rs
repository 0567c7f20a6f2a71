//! Bundled suites run by `run-tests`.
//!
//! - `APITest`: GET/POST/PUT/DELETE against a mocked transport.
//! - `DatabaseTest`: table creation, inserts and queries on in-memory SQLite.
//! - `AdvancedStringTest`: string and regex operations.
//! - `SampleTestCase`: list basics.

use crate::diagnostics::HarnessResult;
use crate::registry::Registry;

pub mod api;
pub mod database;
pub mod sample;
pub mod strings;

/// Registers every bundled suite, in a fixed order.
pub fn register_all(registry: &mut Registry) -> HarnessResult<()> {
    api::register(registry)?;
    database::register(registry)?;
    strings::register(registry)?;
    sample::register(registry)?;
    Ok(())
}
