//! Abstract ports the use cases depend on.
//!
//! Adapters (SQL mappers, message brokers) implement these traits outside the
//! core and wrap their infrastructure failures into
//! [`ApplicationError::Repository`] before returning; raw I/O errors never
//! cross this boundary.
//!
//! [`ApplicationError::Repository`]: crate::ApplicationError::Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Account, DomainEvent, Envelope, Goal, Transaction};
use uuid::Uuid;

use crate::error::AppResult;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Account>>;
    async fn save(&self, account: &Account) -> AppResult<()>;
}

#[async_trait]
pub trait EnvelopeRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Envelope>>;
    async fn save(&self, envelope: &Envelope) -> AppResult<()>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Goal>>;
    async fn save(&self, goal: &Goal) -> AppResult<()>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>>;
    async fn save(&self, transaction: &Transaction) -> AppResult<()>;
}

/// Query port: all `Scheduled` transactions dated strictly before
/// `reference`.
#[async_trait]
pub trait FindOverdueScheduledTransactions: Send + Sync {
    async fn execute(&self, reference: DateTime<Utc>) -> AppResult<Vec<Transaction>>;
}

/// Best-effort fan-out of drained domain events.
///
/// Use cases treat a publish failure as non-fatal: the business write has
/// already committed when this runs.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_many(&self, events: Vec<DomainEvent>) -> AppResult<()>;
}
