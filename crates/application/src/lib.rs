//! Use-case layer of the Gruzzolo budgeting backend.
//!
//! Orchestrates the pure aggregates from the `domain` crate over abstract
//! async ports. Every write that touches more than one aggregate goes
//! through the [`UnitOfWork`] port as a single [`WriteBatch`]; drained
//! domain events are handed to the [`EventPublisher`] after the commit,
//! best-effort.

use domain::DomainEvent;

pub use contributions::{
    ContributeToEnvelope, ContributeToEnvelopeUseCase, ContributeToGoal, ContributeToGoalUseCase,
};
pub use envelope_moves::{MoveBetweenEnvelopes, MoveBetweenEnvelopesUseCase};
pub use error::{AppResult, ApplicationError};
pub use ports::{
    AccountRepository, EnvelopeRepository, EventPublisher, FindOverdueScheduledTransactions,
    GoalRepository, TransactionRepository,
};
pub use scheduler::LateTransactionScheduler;
pub use transfers::{TransferFunds, TransferFundsUseCase};
pub use uow::{UnitOfWork, WriteBatch};

mod contributions;
mod envelope_moves;
mod error;
mod ports;
mod scheduler;
mod transfers;
mod uow;

/// Publish drained events, logging and swallowing failures.
///
/// Runs after the business write has committed, so a broken broker must not
/// fail the operation.
pub(crate) async fn publish_best_effort(
    publisher: &dyn ports::EventPublisher,
    events: Vec<DomainEvent>,
) {
    if events.is_empty() {
        return;
    }
    if let Err(error) = publisher.publish_many(events).await {
        tracing::warn!(%error, "failed to publish domain events");
    }
}
