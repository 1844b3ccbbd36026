//! Monetary value objects, stored as **integer cents**.
//!
//! Every monetary quantity in the core is an `i64` number of minor units;
//! floating point never appears, so arithmetic stays exact. The types here
//! are immutable: `add`/`subtract` hand back a *new* value or an error and
//! leave the receiver untouched.

use serde::{Deserialize, Serialize};

use crate::{DomainResult, error::DomainError};

/// A non-negative envelope balance in cents.
///
/// The invariant `balance >= 0` is enforced at construction and preserved by
/// every operation: a subtraction that would go below zero fails with
/// [`InsufficientEnvelopeBalance`] and produces no new instance.
///
/// [`InsufficientEnvelopeBalance`]: DomainError::InsufficientEnvelopeBalance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeBalance(i64);

impl EnvelopeBalance {
    pub const ZERO: EnvelopeBalance = EnvelopeBalance(0);

    /// Creates a balance from integer cents; rejects negative values.
    pub fn new(minor: i64) -> DomainResult<Self> {
        if minor < 0 {
            return Err(DomainError::InvalidAmount {
                field: "balance",
                amount_minor: minor,
            });
        }
        Ok(Self(minor))
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns a new balance increased by `delta_minor`.
    ///
    /// Rejects non-positive deltas.
    pub fn add(self, delta_minor: i64) -> DomainResult<Self> {
        if delta_minor <= 0 {
            return Err(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: delta_minor,
            });
        }
        Ok(Self(self.0 + delta_minor))
    }

    /// Returns a new balance decreased by `delta_minor`.
    ///
    /// Rejects non-positive deltas and deltas exceeding the current value.
    pub fn subtract(self, delta_minor: i64) -> DomainResult<Self> {
        if delta_minor <= 0 {
            return Err(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: delta_minor,
            });
        }
        if delta_minor > self.0 {
            return Err(DomainError::InsufficientEnvelopeBalance {
                balance_minor: self.0,
                amount_minor: delta_minor,
            });
        }
        Ok(Self(self.0 - delta_minor))
    }
}

/// A non-negative monthly spending cap in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyLimit(i64);

impl MonthlyLimit {
    pub fn new(minor: i64) -> DomainResult<Self> {
        if minor < 0 {
            return Err(DomainError::InvalidAmount {
                field: "monthly_limit",
                amount_minor: minor,
            });
        }
        Ok(Self(minor))
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

/// Validate a transaction/operation amount, which must be strictly positive.
pub(crate) fn require_positive(amount_minor: i64, field: &'static str) -> DomainResult<i64> {
    if amount_minor <= 0 {
        return Err(DomainError::InvalidAmount {
            field,
            amount_minor,
        });
    }
    Ok(amount_minor)
}
