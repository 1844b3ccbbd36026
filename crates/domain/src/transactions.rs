//! The module contains the `Transaction` aggregate and its state machine.
//!
//! Transactions begin life `Scheduled` and move one-way:
//!
//! - `Scheduled -> Late` only via [`Transaction::mark_late`], only when the
//!   transaction date lies before the reference date;
//! - `Scheduled -> Cancelled` via [`Transaction::cancel`] with a valid
//!   [`CancellationReason`];
//! - `Scheduled`/`Late` -> `Completed` via [`Transaction::complete`].
//!
//! `Cancelled` and `Completed` are terminal. `cancellation_reason` and
//! `cancelled_at` are always both set or both unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    events::DomainEvent,
    names::{CancellationReason, EntityName},
    outcome::{Outcome, collect},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Transfer => "TRANSFER",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            "TRANSFER" => Ok(Self::Transfer),
            other => Err(DomainError::InvalidEnumValue {
                field: "transaction_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Scheduled,
    Late,
    Overdue,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Late => "LATE",
            Self::Overdue => "OVERDUE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SCHEDULED" => Ok(Self::Scheduled),
            "LATE" => Ok(Self::Late),
            "OVERDUE" => Ok(Self::Overdue),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(DomainError::InvalidEnumValue {
                field: "transaction_status",
                value: other.to_string(),
            }),
        }
    }
}

/// User input for creating a transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub description: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub budget_id: Uuid,
    pub transaction_date: DateTime<Utc>,
}

/// Persisted row shape used to rehydrate a [`Transaction`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub kind: String,
    pub status: String,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub budget_id: Uuid,
    pub transfer_id: Option<Uuid>,
    pub transaction_date: DateTime<Utc>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A planned or settled money movement on an account.
#[derive(Clone, Debug)]
pub struct Transaction {
    id: Uuid,
    description: EntityName,
    amount_minor: i64,
    kind: TransactionKind,
    status: TransactionStatus,
    account_id: Uuid,
    category_id: Option<Uuid>,
    budget_id: Uuid,
    transfer_id: Option<Uuid>,
    transaction_date: DateTime<Utc>,
    cancellation_reason: Option<CancellationReason>,
    cancelled_at: Option<DateTime<Utc>>,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Transaction {
    /// Validating factory for user input; new transactions start `Scheduled`.
    pub fn create(input: NewTransaction, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let description = collect(EntityName::new(&input.description, "description"), &mut errors);
        if input.amount_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: input.amount_minor,
            });
        }

        let Some(description) = description else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: Uuid::new_v4(),
            description,
            amount_minor: input.amount_minor,
            kind: input.kind,
            status: TransactionStatus::Scheduled,
            account_id: input.account_id,
            category_id: input.category_id,
            budget_id: input.budget_id,
            transfer_id: None,
            transaction_date: input.transaction_date,
            cancellation_reason: None,
            cancelled_at: None,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    /// One leg of an account-to-account transfer.
    ///
    /// Both legs of a transfer carry the same `transfer_id` so the pair can
    /// be correlated in the ledger.
    pub fn transfer_leg(
        description: &str,
        amount_minor: i64,
        account_id: Uuid,
        budget_id: Uuid,
        transfer_id: Uuid,
        transaction_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Outcome<Self> {
        let outcome = Self::create(
            NewTransaction {
                description: description.to_string(),
                amount_minor,
                kind: TransactionKind::Transfer,
                account_id,
                category_id: None,
                budget_id,
                transaction_date,
            },
            now,
        );
        match outcome.into_result() {
            Ok(mut leg) => {
                leg.transfer_id = Some(transfer_id);
                Outcome::success(leg)
            }
            Err(errors) => Outcome::from_errors(errors),
        }
    }

    /// Rehydrate from storage, re-applying field validation defensively.
    pub fn restore(snapshot: TransactionSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let description = collect(
            EntityName::new(&snapshot.description, "description"),
            &mut errors,
        );
        let kind = collect(TransactionKind::try_from(snapshot.kind.as_str()), &mut errors);
        let status = collect(
            TransactionStatus::try_from(snapshot.status.as_str()),
            &mut errors,
        );
        if snapshot.amount_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: snapshot.amount_minor,
            });
        }
        // reason and cancelled_at travel together, and only on a cancelled row
        if snapshot.cancellation_reason.is_some() != snapshot.cancelled_at.is_some() {
            errors.push(DomainError::InvalidTransition(
                "cancellation_reason and cancelled_at must both be set or both unset".to_string(),
            ));
        }
        if let Some(status) = status
            && (status == TransactionStatus::Cancelled) != snapshot.cancelled_at.is_some()
        {
            errors.push(DomainError::InvalidTransition(
                "cancellation fields must be set exactly when the transaction is cancelled"
                    .to_string(),
            ));
        }
        let cancellation_reason = match snapshot.cancellation_reason.as_deref() {
            Some(raw) => collect(CancellationReason::new(raw), &mut errors),
            None => None,
        };

        let (Some(description), Some(kind), Some(status)) = (description, kind, status) else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: snapshot.id,
            description,
            amount_minor: snapshot.amount_minor,
            kind,
            status,
            account_id: snapshot.account_id,
            category_id: snapshot.category_id,
            budget_id: snapshot.budget_id,
            transfer_id: snapshot.transfer_id,
            transaction_date: snapshot.transaction_date,
            cancellation_reason,
            cancelled_at: snapshot.cancelled_at,
            deleted: snapshot.deleted,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn budget_id(&self) -> Uuid {
        self.budget_id
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn transfer_id(&self) -> Option<Uuid> {
        self.transfer_id
    }

    pub fn description(&self) -> &EntityName {
        &self.description
    }

    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn transaction_date(&self) -> DateTime<Utc> {
        self.transaction_date
    }

    pub fn cancellation_reason(&self) -> Option<&CancellationReason> {
        self.cancellation_reason.as_ref()
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Age a scheduled transaction whose date has passed into `Late`.
    pub fn mark_late(
        &mut self,
        reference_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_live()?;
        if self.status != TransactionStatus::Scheduled {
            return Err(DomainError::InvalidTransition(format!(
                "cannot mark {} transaction as late",
                self.status.as_str()
            )));
        }
        if self.transaction_date >= reference_date {
            return Err(DomainError::InvalidTransition(
                "transaction is not yet due".to_string(),
            ));
        }

        self.status = TransactionStatus::Late;
        self.events.push(DomainEvent::TransactionMarkedLate {
            transaction_id: self.id,
            budget_id: self.budget_id,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Cancel a scheduled transaction, recording why and when.
    pub fn cancel(&mut self, reason: CancellationReason, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        if self.status != TransactionStatus::Scheduled {
            return Err(DomainError::InvalidTransition(format!(
                "cannot cancel {} transaction",
                self.status.as_str()
            )));
        }

        self.events.push(DomainEvent::TransactionCancelled {
            transaction_id: self.id,
            budget_id: self.budget_id,
            reason: reason.as_str().to_string(),
            occurred_at: at,
        });
        self.status = TransactionStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        self.cancelled_at = Some(at);
        self.touch(at);
        Ok(())
    }

    /// Settle a scheduled or late transaction.
    pub fn complete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        match self.status {
            TransactionStatus::Scheduled | TransactionStatus::Late => {}
            other => {
                return Err(DomainError::InvalidTransition(format!(
                    "cannot complete {} transaction",
                    other.as_str()
                )));
            }
        }

        self.status = TransactionStatus::Completed;
        self.events.push(DomainEvent::TransactionCompleted {
            transaction_id: self.id,
            budget_id: self.budget_id,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Soft delete; rejected when already deleted.
    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted {
                entity: "transaction",
            });
        }
        self.deleted = true;
        self.touch(at);
        Ok(())
    }

    /// Move the buffered events out, leaving the buffer empty.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_live(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted {
                entity: "transaction",
            });
        }
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn scheduled(transaction_date: DateTime<Utc>) -> Transaction {
        Transaction::create(
            NewTransaction {
                description: "Rent for January".to_string(),
                amount_minor: 80_000,
                kind: TransactionKind::Expense,
                account_id: Uuid::new_v4(),
                category_id: None,
                budget_id: Uuid::new_v4(),
                transaction_date,
            },
            Utc::now(),
        )
        .into_result()
        .unwrap()
    }

    fn reason() -> CancellationReason {
        CancellationReason::new("duplicate of another entry").unwrap()
    }

    #[test]
    fn starts_scheduled() {
        let tx = scheduled(Utc::now());
        assert_eq!(tx.status(), TransactionStatus::Scheduled);
        assert_eq!(tx.cancellation_reason(), None);
        assert_eq!(tx.cancelled_at(), None);
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let outcome = Transaction::create(
            NewTransaction {
                description: "Rent for January".to_string(),
                amount_minor: 0,
                kind: TransactionKind::Expense,
                account_id: Uuid::new_v4(),
                category_id: None,
                budget_id: Uuid::new_v4(),
                transaction_date: Utc::now(),
            },
            Utc::now(),
        );
        assert!(outcome.has_error());
    }

    #[test]
    fn mark_late_requires_past_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut due = scheduled(now - chrono::Duration::days(1));
        let mut not_due = scheduled(now + chrono::Duration::days(1));

        due.mark_late(now, now).unwrap();
        assert_eq!(due.status(), TransactionStatus::Late);

        assert!(not_due.mark_late(now, now).is_err());
        assert_eq!(not_due.status(), TransactionStatus::Scheduled);
    }

    #[test]
    fn mark_late_is_guarded_by_status() {
        let now = Utc::now();
        let mut tx = scheduled(now - chrono::Duration::days(1));
        tx.mark_late(now, now).unwrap();

        // Re-processing an already-late transaction is a no-op failure.
        assert!(tx.mark_late(now, now).is_err());
        assert_eq!(tx.status(), TransactionStatus::Late);
    }

    #[test]
    fn cancel_sets_reason_and_timestamp_together() {
        let mut tx = scheduled(Utc::now());
        let at = Utc::now();
        tx.cancel(reason(), at).unwrap();

        assert_eq!(tx.status(), TransactionStatus::Cancelled);
        assert!(tx.cancellation_reason().is_some());
        assert_eq!(tx.cancelled_at(), Some(at));
    }

    #[test]
    fn cancelled_and_completed_are_terminal() {
        let now = Utc::now();
        let mut cancelled = scheduled(now);
        cancelled.cancel(reason(), now).unwrap();
        assert!(cancelled.cancel(reason(), now).is_err());
        assert!(cancelled.complete(now).is_err());
        assert!(cancelled.mark_late(now, now).is_err());

        let mut completed = scheduled(now);
        completed.complete(now).unwrap();
        assert!(completed.cancel(reason(), now).is_err());
        assert!(completed.complete(now).is_err());
    }

    #[test]
    fn late_transaction_can_complete() {
        let now = Utc::now();
        let mut tx = scheduled(now - chrono::Duration::days(2));
        tx.mark_late(now, now).unwrap();
        tx.complete(now).unwrap();
        assert_eq!(tx.status(), TransactionStatus::Completed);
    }

    #[test]
    fn transfer_legs_share_transfer_id() {
        let transfer_id = Uuid::new_v4();
        let now = Utc::now();
        let debit = Transaction::transfer_leg(
            "Transfer to Savings",
            1500,
            Uuid::new_v4(),
            Uuid::new_v4(),
            transfer_id,
            now,
            now,
        )
        .into_result()
        .unwrap();

        assert_eq!(debit.kind(), TransactionKind::Transfer);
        assert_eq!(debit.transfer_id(), Some(transfer_id));
    }

    #[test]
    fn restore_rejects_orphan_cancellation_fields() {
        let base = TransactionSnapshot {
            id: Uuid::new_v4(),
            description: "Rent for January".to_string(),
            amount_minor: 80_000,
            kind: "EXPENSE".to_string(),
            status: "CANCELLED".to_string(),
            account_id: Uuid::new_v4(),
            category_id: None,
            budget_id: Uuid::new_v4(),
            transfer_id: None,
            transaction_date: Utc::now(),
            cancellation_reason: None,
            cancelled_at: Some(Utc::now()),
            deleted: false,
            version: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(Transaction::restore(base).has_error());
    }

    #[test]
    fn restore_couples_cancellation_fields_to_cancelled_status() {
        let cancelled_at = Utc::now();
        let base = TransactionSnapshot {
            id: Uuid::new_v4(),
            description: "Rent for January".to_string(),
            amount_minor: 80_000,
            kind: "EXPENSE".to_string(),
            status: "SCHEDULED".to_string(),
            account_id: Uuid::new_v4(),
            category_id: None,
            budget_id: Uuid::new_v4(),
            transfer_id: None,
            transaction_date: Utc::now(),
            cancellation_reason: Some("duplicate of another entry".to_string()),
            cancelled_at: Some(cancelled_at),
            deleted: false,
            version: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // A non-cancelled row must not carry the pair.
        assert!(Transaction::restore(base.clone()).has_error());

        // A cancelled row without the pair is just as corrupt.
        let stripped = TransactionSnapshot {
            status: "CANCELLED".to_string(),
            cancellation_reason: None,
            cancelled_at: None,
            ..base.clone()
        };
        assert!(Transaction::restore(stripped).has_error());

        let consistent = TransactionSnapshot {
            status: "CANCELLED".to_string(),
            ..base
        };
        let tx = Transaction::restore(consistent).into_result().unwrap();
        assert_eq!(tx.status(), TransactionStatus::Cancelled);
        assert_eq!(tx.cancelled_at(), Some(cancelled_at));
    }
}
