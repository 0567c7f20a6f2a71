//! `SampleTestCase`: a list of five integers and a few checks on it.

use crate::assertion::{contains, equals, is_true, not_contains};
use crate::diagnostics::HarnessResult;
use crate::registry::Registry;

#[derive(Debug, Default)]
pub struct SampleData {
    values: Vec<i64>,
}

pub fn register(registry: &mut Registry) -> HarnessResult<()> {
    registry
        .suite::<SampleData>("SampleTestCase")?
        .setup(|data| {
            data.values = vec![1, 2, 3, 4, 5];
            Ok(())
        })
        .unit("test_list_length", |data| Ok(equals(5, data.values.len())?))?
        .unit("test_list_contents", |data| {
            contains(&3, &data.values)?;
            not_contains(&6, &data.values)?;
            Ok(())
        })?
        .unit("test_list_sum", |data| {
            Ok(equals(15, data.values.iter().sum::<i64>())?)
        })?
        .unit("test_always_passes", |_| Ok(is_true(true)?))?;
    Ok(())
}
