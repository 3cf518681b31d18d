//! Queries on string properties
//!
//! Lengths and indices count `char`s, not bytes.
//!
//! The nullable form answers boolean queries with safe defaults while the
//! value is absent (`is_empty` is true, `len` is 0, `contains` is false), but
//! value-producing queries such as `substring` propagate the absence.

use crate::error::{Result, TetherError};
use crate::property::Property;

/// Characters `start..end` of `text`
fn char_range(
    name: impl FnOnce() -> String,
    text: &str,
    start: usize,
    end: Option<usize>,
) -> Result<String> {
    let len = text.chars().count();
    let end = end.unwrap_or(len);
    if end > len {
        return Err(TetherError::IndexOutOfRange {
            name: name(),
            index: end,
            len,
        });
    }
    if start > end {
        return Err(TetherError::IndexOutOfRange {
            name: name(),
            index: start,
            len: end,
        });
    }
    Ok(text.chars().skip(start).take(end - start).collect())
}

impl Property<String> {
    pub fn len(&self) -> usize {
        self.with_value(|text| text.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.with_value(String::is_empty)
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.with_value(|text| text.contains(pattern))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.with_value(|text| text.starts_with(prefix))
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.with_value(|text| text.ends_with(suffix))
    }

    /// Characters from `start` up to `end` (or the end of the string)
    pub fn substring(&self, start: usize, end: Option<usize>) -> Result<String> {
        self.with_value(|text| char_range(|| self.display_name(), text, start, end))
    }

    pub fn to_uppercase(&self) -> String {
        self.with_value(|text| text.to_uppercase())
    }

    pub fn to_lowercase(&self) -> String {
        self.with_value(|text| text.to_lowercase())
    }

    pub fn trim(&self) -> String {
        self.with_value(|text| text.trim().to_string())
    }
}

impl Property<Option<String>> {
    pub fn is_null(&self) -> bool {
        self.with_value(Option::is_none)
    }

    /// Length in characters, 0 when absent
    pub fn len(&self) -> usize {
        self.with_value(|text| text.as_deref().map_or(0, |t| t.chars().count()))
    }

    /// True when absent or empty
    pub fn is_empty(&self) -> bool {
        self.with_value(|text| text.as_deref().map_or(true, str::is_empty))
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.with_value(|text| text.as_deref().is_some_and(|t| t.contains(pattern)))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.with_value(|text| text.as_deref().is_some_and(|t| t.starts_with(prefix)))
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.with_value(|text| text.as_deref().is_some_and(|t| t.ends_with(suffix)))
    }

    /// `None` when absent; range errors still surface for a present value
    pub fn substring(&self, start: usize, end: Option<usize>) -> Result<Option<String>> {
        self.with_value(|text| {
            text.as_deref()
                .map(|t| char_range(|| self.display_name(), t, start, end))
                .transpose()
        })
    }

    pub fn to_uppercase(&self) -> Option<String> {
        self.with_value(|text| text.as_deref().map(str::to_uppercase))
    }

    pub fn to_lowercase(&self) -> Option<String> {
        self.with_value(|text| text.as_deref().map(str::to_lowercase))
    }

    pub fn trim(&self) -> Option<String> {
        self.with_value(|text| text.as_deref().map(|t| t.trim().to_string()))
    }
}
