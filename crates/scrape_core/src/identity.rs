use std::fmt;

use crate::ScrapeError;

pub const MAX_IDENTITY_LEN: usize = 30;

/// A target identity that passed the username syntax check.
///
/// 1 to 30 characters of ASCII letters, digits, `.` and `_`, never two
/// consecutive dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn parse(raw: &str) -> Result<Self, ScrapeError> {
        if is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ScrapeError::InvalidIdentity(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > MAX_IDENTITY_LEN {
        return false;
    }
    if raw.contains("..") {
        return false;
    }
    raw.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
