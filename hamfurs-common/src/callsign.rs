use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical (uppercase, trimmed) amateur radio callsign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Callsign(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallsignError {
    Empty,
    InvalidLength(usize),
    InvalidCharacter(char),
}

impl fmt::Display for CallsignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallsignError::Empty => write!(f, "empty callsign"),
            CallsignError::InvalidLength(len) => write!(
                f,
                "callsign length {} outside {}..={}",
                len,
                Callsign::MIN_LEN,
                Callsign::MAX_LEN
            ),
            CallsignError::InvalidCharacter(c) => write!(f, "invalid character '{}' in callsign", c),
        }
    }
}

impl std::error::Error for CallsignError {}

impl Callsign {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 12;

    /// Parse a raw string into a canonical callsign.
    ///
    /// Surrounding whitespace is stripped and letters are uppercased. Only
    /// ASCII letters, digits and the portable-operation separator `/` are
    /// accepted.
    pub fn parse(raw: &str) -> Result<Self, CallsignError> {
        let canonical = raw.trim().to_ascii_uppercase();
        if canonical.is_empty() {
            return Err(CallsignError::Empty);
        }
        if let Some(c) = canonical
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '/'))
        {
            return Err(CallsignError::InvalidCharacter(c));
        }
        let len = canonical.len();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) {
            return Err(CallsignError::InvalidLength(len));
        }
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` characters (or the whole callsign if shorter).
    pub fn prefix(&self, n: usize) -> &str {
        // ASCII only, so byte offsets are char offsets
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Callsign {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Callsign {
    type Err = CallsignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Callsign {
    type Error = CallsignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Callsign> for String {
    fn from(value: Callsign) -> Self {
        value.0
    }
}
