//! Subscriber identity values as the controller knows them.
//!
//! The console and the HLR file are both fed these through text, so each type
//! is validated once on the way in and rendered verbatim on the way out.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Subscriber ID must be a positive integer")]
    InvalidSubscriberId(String),
    #[error("Extension must be 4-15 characters, alphanumeric plus * and #")]
    InvalidExtension(String),
    #[error("Extension must be 1-15 characters, alphanumeric plus * and #")]
    InvalidExistingExtension(String),
    #[error("IMSI must be 5-15 digits")]
    InvalidImsi(String),
}

/// Database row id assigned by the controller. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn new(raw: u64) -> Result<Self, IdentityError> {
        if raw == 0 {
            return Err(IdentityError::InvalidSubscriberId(raw.to_string()));
        }
        Ok(Self(raw))
    }

    /// Accepts an unsigned decimal integer greater than zero. No sign, no
    /// surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentityError::InvalidSubscriberId(s.to_string()));
        }
        let raw: u64 = s.parse().map_err(|_| IdentityError::InvalidSubscriberId(s.to_string()))?;
        Self::new(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dialable number (MSISDN / extension) of a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extension(String);

impl Extension {
    pub const MIN_LEN: usize = 4;
    pub const MAX_LEN: usize = 15;

    /// Accepts 4 to 15 characters drawn from `[A-Za-z0-9*#]`. This is the
    /// rule for numbers being assigned.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if (Self::MIN_LEN..=Self::MAX_LEN).contains(&s.len()) && dialable(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentityError::InvalidExtension(s.to_string()))
        }
    }

    /// Looser rule for numbers the controller already holds, such as short
    /// service extensions like `111`: 1 to 15 characters of the same alphabet.
    pub fn parse_existing(s: &str) -> Result<Self, IdentityError> {
        if (1..=Self::MAX_LEN).contains(&s.len()) && dialable(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentityError::InvalidExistingExtension(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for plain digit strings, the only numbers a handset can be paged on
    pub fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

fn dialable(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'*' || b == b'#')
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// International Mobile Subscriber Identity, kept as text to preserve leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Imsi(String);

impl Imsi {
    /// Synthetic subscriber used as a sender identity for bulk messaging
    pub const SENTINEL: &'static str = "999999999999999";

    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let len_ok = (5..=15).contains(&s.len());
        if len_ok && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentityError::InvalidImsi(s.to_string()))
        }
    }

    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
