//! Pure envelope-to-envelope transfer service.
//!
//! The checks run in a fixed order: budget membership of both envelopes,
//! amount positivity, source cover, then target cap. The first failure wins
//! and the inputs are left untouched; callers only see mutated envelopes on
//! full success.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{envelopes::Envelope, error::DomainError};

/// Move money between two envelopes of the same budget.
///
/// Works on copies, so a failure at any check leaves the originals exactly
/// as they were. On success the returned pair carries the updated balances
/// and the recorded withdraw/fund events.
pub fn transfer_between_envelopes(
    source: &Envelope,
    target: &Envelope,
    budget_id: Uuid,
    amount_minor: i64,
    at: DateTime<Utc>,
) -> Result<(Envelope, Envelope), DomainError> {
    if source.budget_id() != budget_id || target.budget_id() != budget_id {
        return Err(DomainError::EnvelopesMustBelongToSameBudget);
    }
    if amount_minor <= 0 {
        return Err(DomainError::InvalidTransferAmount { amount_minor });
    }

    let mut source = source.clone();
    let mut target = target.clone();
    source.withdraw(amount_minor, at)?;
    target.fund(amount_minor, at)?;

    Ok((source, target))
}
