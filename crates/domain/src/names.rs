//! Self-validating text value objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{DomainResult, error::DomainError};

/// A display name for an aggregate (account, envelope, goal, ...).
///
/// NFC-normalized and trimmed; must be 2 to 255 characters after trimming.
/// The rejected raw input is echoed back inside the error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(String);

impl EntityName {
    pub fn new(raw: &str, field: &'static str) -> DomainResult<Self> {
        let normalized: String = raw.nfc().collect();
        let trimmed = normalized.trim();
        let len = trimmed.chars().count();
        if !(2..=255).contains(&len) {
            return Err(DomainError::InvalidName {
                field,
                value: raw.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text justification for cancelling a transaction.
///
/// Trimmed; must be 10 to 255 characters so the reason is not trivial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CancellationReason(String);

impl CancellationReason {
    pub fn new(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if !(10..=255).contains(&len) {
            return Err(DomainError::InvalidReason {
                field: "cancellation_reason",
                value: raw.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
