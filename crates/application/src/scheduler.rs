//! Best-effort aging of overdue scheduled transactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    ports::{EventPublisher, FindOverdueScheduledTransactions, TransactionRepository},
    publish_best_effort,
};

/// Batch job that flips past-due `Scheduled` transactions to `Late`.
///
/// Each transaction is processed independently: a failure to transition or
/// to save is logged and skipped, never aborting the rest of the batch. The
/// run is safe to repeat because `mark_late` rejects anything that is no
/// longer `Scheduled`.
pub struct LateTransactionScheduler {
    overdue: Arc<dyn FindOverdueScheduledTransactions>,
    transactions: Arc<dyn TransactionRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl LateTransactionScheduler {
    pub fn new(
        overdue: Arc<dyn FindOverdueScheduledTransactions>,
        transactions: Arc<dyn TransactionRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            overdue,
            transactions,
            publisher,
        }
    }

    /// Age everything scheduled before `reference`; returns the ids that
    /// were successfully transitioned and saved.
    pub async fn process_late_transactions(
        &self,
        reference: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let candidates = self.overdue.execute(reference).await?;
        tracing::debug!(count = candidates.len(), "aging overdue transactions");

        let mut aged = Vec::new();
        let mut events = Vec::new();
        for mut transaction in candidates {
            let id = transaction.id();
            if let Err(error) = transaction.mark_late(reference, now) {
                tracing::warn!(%id, %error, "skipping transaction that cannot be marked late");
                continue;
            }
            if let Err(error) = self.transactions.save(&transaction).await {
                tracing::warn!(%id, %error, "failed to save late transaction, skipping");
                continue;
            }
            events.extend(transaction.drain_events());
            aged.push(id);
        }

        publish_best_effort(self.publisher.as_ref(), events).await;
        Ok(aged)
    }
}
