use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted code lengths. Generated codes are 8 characters; the wider range
/// leaves room for custom lengths without a schema change.
const LENGTH: RangeInclusive<usize> = 3..=32;

/// Identifier of a [`Link`](crate::Link), used as the redirect path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Checks `code` and wraps it.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        check(&code)?;
        Ok(Self(code))
    }

    /// Wraps `code` as is. For codes that come from the generator or were read
    /// back from a store.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn check(code: &str) -> Result<(), CoreError> {
    if !LENGTH.contains(&code.len()) {
        return Err(CoreError::ShortCodeLength {
            len: code.len(),
            min: *LENGTH.start(),
            max: *LENGTH.end(),
        });
    }
    match code
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
    {
        Some(found) => Err(CoreError::ShortCodeCharacter { found }),
        None => Ok(()),
    }
}

impl FromStr for ShortCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
