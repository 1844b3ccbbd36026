//! Contributions: moving money from an account into an envelope or a goal.
//!
//! Both paths share the same discipline: pre-check cover with `can_debit`,
//! debit the account, apply the target-side rule, then persist everything in
//! one atomic batch. A failure on the target side therefore never leaves a
//! dangling debit behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::DomainError;
use uuid::Uuid;

use crate::{
    error::{AppResult, ApplicationError},
    ports::{AccountRepository, EnvelopeRepository, EventPublisher, GoalRepository},
    publish_best_effort,
    uow::{UnitOfWork, WriteBatch},
};

#[derive(Clone, Debug)]
pub struct ContributeToEnvelope {
    pub source_account_id: Uuid,
    pub envelope_id: Uuid,
    pub amount_minor: i64,
}

pub struct ContributeToEnvelopeUseCase {
    accounts: Arc<dyn AccountRepository>,
    envelopes: Arc<dyn EnvelopeRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    publisher: Arc<dyn EventPublisher>,
}

impl ContributeToEnvelopeUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        envelopes: Arc<dyn EnvelopeRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            accounts,
            envelopes,
            unit_of_work,
            publisher,
        }
    }

    pub async fn execute(&self, command: ContributeToEnvelope, now: DateTime<Utc>) -> AppResult<()> {
        let mut account = self
            .accounts
            .get(command.source_account_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "account",
                id: command.source_account_id,
            })?;
        let mut envelope = self
            .envelopes
            .get(command.envelope_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "envelope",
                id: command.envelope_id,
            })?;

        if account.budget_id() != envelope.budget_id() {
            return Err(DomainError::AccountBudgetMismatch { target: "envelope" }.into());
        }
        if command.amount_minor <= 0 {
            return Err(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: command.amount_minor,
            }
            .into());
        }
        if !account.can_debit(command.amount_minor) {
            return Err(DomainError::InsufficientAccountFunds {
                balance_minor: account.balance_minor(),
                amount_minor: command.amount_minor,
            }
            .into());
        }

        account.debit(command.amount_minor, now)?;
        envelope.fund(command.amount_minor, now)?;

        let batch = WriteBatch {
            accounts: vec![account.clone()],
            envelopes: vec![envelope.clone()],
            ..WriteBatch::default()
        };
        self.unit_of_work.commit(batch).await?;

        let mut events = account.drain_events();
        events.extend(envelope.drain_events());
        publish_best_effort(self.publisher.as_ref(), events).await;

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ContributeToGoal {
    pub source_account_id: Uuid,
    pub goal_id: Uuid,
    pub amount_minor: i64,
}

pub struct ContributeToGoalUseCase {
    accounts: Arc<dyn AccountRepository>,
    goals: Arc<dyn GoalRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    publisher: Arc<dyn EventPublisher>,
}

impl ContributeToGoalUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        goals: Arc<dyn GoalRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            accounts,
            goals,
            unit_of_work,
            publisher,
        }
    }

    pub async fn execute(&self, command: ContributeToGoal, now: DateTime<Utc>) -> AppResult<()> {
        let mut account = self
            .accounts
            .get(command.source_account_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "account",
                id: command.source_account_id,
            })?;
        let mut goal = self
            .goals
            .get(command.goal_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "goal",
                id: command.goal_id,
            })?;

        if account.budget_id() != goal.budget_id() {
            return Err(DomainError::AccountBudgetMismatch { target: "goal" }.into());
        }
        if command.amount_minor <= 0 {
            return Err(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: command.amount_minor,
            }
            .into());
        }
        if !account.can_debit(command.amount_minor) {
            return Err(DomainError::InsufficientAccountFunds {
                balance_minor: account.balance_minor(),
                amount_minor: command.amount_minor,
            }
            .into());
        }

        goal.add_amount(command.amount_minor, now)?;
        account.debit(command.amount_minor, now)?;

        let batch = WriteBatch {
            accounts: vec![account.clone()],
            goals: vec![goal.clone()],
            ..WriteBatch::default()
        };
        self.unit_of_work.commit(batch).await?;

        let mut events = account.drain_events();
        events.extend(goal.drain_events());
        publish_best_effort(self.publisher.as_ref(), events).await;

        Ok(())
    }
}
