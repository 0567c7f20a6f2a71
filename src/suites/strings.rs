//! `AdvancedStringTest`: case conversion, splitting, searching and regex
//! extraction on a few fixed strings.

use regex::Regex;

use crate::assertion::{contains, equals, is_false, is_true, not_contains};
use crate::diagnostics::HarnessResult;
use crate::registry::Registry;

#[derive(Debug, Default)]
pub struct Strings {
    test_string: String,
    numbers_string: String,
    mixed_string: String,
}

pub fn register(registry: &mut Registry) -> HarnessResult<()> {
    registry
        .suite::<Strings>("AdvancedStringTest")?
        .setup(|s| {
            s.test_string = "Hello, World! This is a test string.".to_string();
            s.numbers_string = "12345".to_string();
            s.mixed_string = "Test123String456".to_string();
            Ok(())
        })
        .unit("test_string_length", |s| {
            equals(36, s.test_string.len())?;
            equals(5, s.numbers_string.len())?;
            Ok(())
        })?
        .unit("test_string_case_conversion", |s| {
            equals("HELLO, WORLD! THIS IS A TEST STRING.", s.test_string.to_uppercase())?;
            equals("hello, world! this is a test string.", s.test_string.to_lowercase())?;
            Ok(())
        })?
        .unit("test_string_contains", |s| {
            contains("Hello", &s.test_string)?;
            contains("World", &s.test_string)?;
            not_contains("Python", &s.test_string)?;
            Ok(())
        })?
        .unit("test_string_split", |s| {
            let words: Vec<&str> = s.test_string.split_whitespace().collect();
            equals(7, words.len())?;
            equals("Hello,", words[0])?;
            equals("World!", words[1])?;
            Ok(())
        })?
        .unit("test_digit_extraction", |s| {
            let digits = Regex::new(r"\d+")?;
            let found: Vec<&str> = digits
                .find_iter(&s.mixed_string)
                .map(|m| m.as_str())
                .collect();
            equals(vec!["123", "456"], found)?;
            Ok(())
        })?
        .unit("test_string_replacement", |s| {
            let replaced = s.test_string.replace("World", "Python");
            Ok(equals("Hello, Python! This is a test string.", replaced)?)
        })?
        .unit("test_string_starts_ends", |s| {
            is_true(s.test_string.starts_with("Hello"))?;
            is_true(s.test_string.ends_with("string."))?;
            is_false(s.test_string.starts_with("Python"))?;
            Ok(())
        })?;
    Ok(())
}
