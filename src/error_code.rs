//! Oracle error codes (`ORA-NNNNN`) and their extraction from free text.

use crate::error::PostError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ORA-[0-9]{5}").unwrap_or_else(|e| panic!("invalid error code pattern: {}", e))
});

/// A validated Oracle error code such as `ORA-00001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ErrorCode(String);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form without the hyphen, used in post filenames.
    ///
    /// ```
    /// use orapost::error_code::ErrorCode;
    ///
    /// let code: ErrorCode = "ORA-00001".parse().unwrap();
    /// assert_eq!(code.slug(), "ora00001");
    /// ```
    pub fn slug(&self) -> String {
        self.0.to_lowercase().replace('-', "")
    }

    fn is_well_formed(s: &str) -> bool {
        s.len() == 9
            && s.starts_with("ORA-")
            && s[4..].bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for ErrorCode {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_well_formed(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(PostError::InvalidErrorCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = PostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(PostError::InvalidErrorCode(value))
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the first `ORA-` + five digit sequence found in `text`.
///
/// A longer digit run still matches on its first five digits.
pub fn extract_error_code(text: &str) -> Option<ErrorCode> {
    CODE_PATTERN
        .find(text)
        .map(|m| ErrorCode(m.as_str().to_string()))
}
