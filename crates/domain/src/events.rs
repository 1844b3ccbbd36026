//! Domain events.
//!
//! Aggregates record facts about what happened to them in an owned,
//! append-only buffer. The buffer is drained explicitly by the use case
//! after a successful commit and handed to the event publisher; nothing in
//! the core assumes concurrent access to the same in-memory aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fact recorded by an aggregate, queued for later publication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    AccountCredited {
        account_id: Uuid,
        budget_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    },
    AccountDebited {
        account_id: Uuid,
        budget_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    },
    AccountDeleted {
        account_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    EnvelopeFunded {
        envelope_id: Uuid,
        budget_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    },
    EnvelopeWithdrawn {
        envelope_id: Uuid,
        budget_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    },
    EnvelopeDeleted {
        envelope_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GoalAmountAdded {
        goal_id: Uuid,
        budget_id: Uuid,
        amount_minor: i64,
        accumulated_minor: i64,
        occurred_at: DateTime<Utc>,
    },
    GoalAchieved {
        goal_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GoalDeleted {
        goal_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    TransactionMarkedLate {
        transaction_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    TransactionCancelled {
        transaction_id: Uuid,
        budget_id: Uuid,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    TransactionCompleted {
        transaction_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    CreditCardBillPaid {
        bill_id: Uuid,
        budget_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}
