//! # Identity Newtypes
//!
//! `Username` identifies a reward recipient. `Memo` carries the free-text
//! reason attached to a block. Both validate at construction so that a
//! block can never be built around malformed text.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum memo length, in characters.
pub const MAX_MEMO_LEN: usize = 280;

/// A validated reward recipient identifier.
///
/// Surrounding whitespace is trimmed. The result must be non-empty, at most
/// [`MAX_USERNAME_LEN`] characters and free of control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Validate and wrap a username.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::UsernameTooLong(trimmed.to_string()));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::UsernameControlChars(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the username text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Free-text note attached to a block (admin reason, report description).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Memo(String);

impl Memo {
    /// Validate a memo. Returns `Ok(None)` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Result<Option<Self>, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let len = trimmed.chars().count();
        if len > MAX_MEMO_LEN {
            return Err(ValidationError::MemoTooLong {
                len,
                max: MAX_MEMO_LEN,
            });
        }
        Ok(Some(Self(trimmed.to_string())))
    }

    /// Borrow the memo text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Memo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Memo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("memo must be non-empty when present"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trimmed() {
        let u = Username::new("  alice ").unwrap();
        assert_eq!(u.as_str(), "alice");
        assert_eq!(u.to_string(), "alice");
    }

    #[test]
    fn test_username_rejects_empty_and_blank() {
        assert_eq!(Username::new(""), Err(ValidationError::EmptyUsername));
        assert_eq!(Username::new("   "), Err(ValidationError::EmptyUsername));
    }

    #[test]
    fn test_username_rejects_control_chars() {
        assert!(matches!(
            Username::new("al\u{0007}ice"),
            Err(ValidationError::UsernameControlChars(_))
        ));
    }

    #[test]
    fn test_username_length_limit_counts_chars() {
        assert!(Username::new("é".repeat(MAX_USERNAME_LEN)).is_ok());
        assert!(matches!(
            Username::new("a".repeat(MAX_USERNAME_LEN + 1)),
            Err(ValidationError::UsernameTooLong(_))
        ));
    }

    #[test]
    fn test_username_deserialize_validates() {
        let ok: Username = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
    }

    #[test]
    fn test_memo_blank_is_none() {
        assert_eq!(Memo::new("  ").unwrap(), None);
        assert_eq!(Memo::new("pipe burst").unwrap().unwrap().as_str(), "pipe burst");
    }

    #[test]
    fn test_memo_too_long() {
        let err = Memo::new("x".repeat(MAX_MEMO_LEN + 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MemoTooLong {
                len: MAX_MEMO_LEN + 1,
                max: MAX_MEMO_LEN
            }
        );
    }
}
