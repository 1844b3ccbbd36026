//! Account-to-account money transfer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{DomainError, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppResult, ApplicationError},
    ports::{AccountRepository, EventPublisher},
    publish_best_effort,
    uow::{UnitOfWork, WriteBatch},
};

/// Command describing a transfer between two accounts of one budget.
#[derive(Clone, Debug)]
pub struct TransferFunds {
    pub source_account_id: Uuid,
    pub target_account_id: Uuid,
    pub amount_minor: i64,
}

pub struct TransferFundsUseCase {
    accounts: Arc<dyn AccountRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    publisher: Arc<dyn EventPublisher>,
}

impl TransferFundsUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            accounts,
            unit_of_work,
            publisher,
        }
    }

    /// Move money between two accounts, booking a pair of completed
    /// `Transfer` transactions that share a fresh `transfer_id`.
    ///
    /// Returns the `transfer_id` correlating the two legs.
    pub async fn execute(&self, command: TransferFunds, now: DateTime<Utc>) -> AppResult<Uuid> {
        let mut source = self
            .accounts
            .get(command.source_account_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "account",
                id: command.source_account_id,
            })?;
        let mut target = self
            .accounts
            .get(command.target_account_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "account",
                id: command.target_account_id,
            })?;

        if source.budget_id() != target.budget_id() {
            return Err(DomainError::AccountsMustBelongToSameBudget.into());
        }
        if command.amount_minor <= 0 {
            return Err(DomainError::InvalidTransferAmount {
                amount_minor: command.amount_minor,
            }
            .into());
        }
        if !source.can_debit(command.amount_minor) {
            return Err(DomainError::InsufficientAccountFunds {
                balance_minor: source.balance_minor(),
                amount_minor: command.amount_minor,
            }
            .into());
        }

        source.debit(command.amount_minor, now)?;
        target.credit(command.amount_minor, now)?;

        let transfer_id = Uuid::new_v4();
        let mut debit_leg = Transaction::transfer_leg(
            &format!("Transfer to {}", target.name()),
            command.amount_minor,
            source.id(),
            source.budget_id(),
            transfer_id,
            now,
            now,
        )
        .into_result()
        .map_err(ApplicationError::Validation)?;
        let mut credit_leg = Transaction::transfer_leg(
            &format!("Transfer from {}", source.name()),
            command.amount_minor,
            target.id(),
            target.budget_id(),
            transfer_id,
            now,
            now,
        )
        .into_result()
        .map_err(ApplicationError::Validation)?;
        debit_leg.complete(now)?;
        credit_leg.complete(now)?;

        let batch = WriteBatch::transfer(
            source.clone(),
            target.clone(),
            debit_leg.clone(),
            credit_leg.clone(),
        )?;
        self.unit_of_work.commit(batch).await?;

        let mut events = source.drain_events();
        events.extend(target.drain_events());
        events.extend(debit_leg.drain_events());
        events.extend(credit_leg.drain_events());
        publish_best_effort(self.publisher.as_ref(), events).await;

        Ok(transfer_id)
    }
}
