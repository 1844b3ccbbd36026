//! Point-in-time value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainResult, error::DomainError};

/// An instant that must not lie in the future.
///
/// The comparison point `now` is passed in by the caller so the core stays
/// free of clock reads during validation of user input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PastOrPresentDate(DateTime<Utc>);

impl PastOrPresentDate {
    pub fn new(
        value: DateTime<Utc>,
        now: DateTime<Utc>,
        field: &'static str,
    ) -> DomainResult<Self> {
        if value > now {
            return Err(DomainError::DateInFuture { field });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> DateTime<Utc> {
        self.0
    }
}
