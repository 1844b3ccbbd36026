//! Atomic multi-aggregate persistence.
//!
//! Every cross-aggregate write in the system goes through one port:
//! [`UnitOfWork::commit`] takes a [`WriteBatch`] of dirty aggregates and
//! persists all of them or none. The adapter behind it is expected to run a
//! real database transaction at serializable isolation or stronger, since
//! the core does check-then-mutate without any cross-aggregate lock.

use async_trait::async_trait;
use domain::{Account, Envelope, Goal, Transaction, TransactionKind};

use crate::error::{AppResult, ApplicationError};

/// The set of aggregates one use case touched, to be persisted together.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub accounts: Vec<Account>,
    pub envelopes: Vec<Envelope>,
    pub goals: Vec<Goal>,
    pub transactions: Vec<Transaction>,
}

impl WriteBatch {
    /// A batch for an account-to-account transfer.
    ///
    /// Checks the pairing obligations before anything reaches the adapter:
    /// both legs must be `Transfer` transactions of equal amount sharing the
    /// same `transfer_id`, each booked against the matching account.
    pub fn transfer(
        from: Account,
        to: Account,
        debit_leg: Transaction,
        credit_leg: Transaction,
    ) -> AppResult<Self> {
        if debit_leg.kind() != TransactionKind::Transfer
            || credit_leg.kind() != TransactionKind::Transfer
        {
            return Err(ApplicationError::InconsistentTransfer(
                "both legs must be transfer transactions".to_string(),
            ));
        }
        if debit_leg.amount_minor() != credit_leg.amount_minor() {
            return Err(ApplicationError::InconsistentTransfer(format!(
                "leg amounts differ: {} vs {}",
                debit_leg.amount_minor(),
                credit_leg.amount_minor()
            )));
        }
        if debit_leg.transfer_id().is_none() || debit_leg.transfer_id() != credit_leg.transfer_id()
        {
            return Err(ApplicationError::InconsistentTransfer(
                "legs must share a transfer id".to_string(),
            ));
        }
        if debit_leg.account_id() != from.id() || credit_leg.account_id() != to.id() {
            return Err(ApplicationError::InconsistentTransfer(
                "legs must be booked against the transferring accounts".to_string(),
            ));
        }

        Ok(Self {
            accounts: vec![from, to],
            envelopes: Vec::new(),
            goals: Vec::new(),
            transactions: vec![debit_leg, credit_leg],
        })
    }
}

/// All-or-nothing persistence of a [`WriteBatch`].
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&self, batch: WriteBatch) -> AppResult<()>;
}
