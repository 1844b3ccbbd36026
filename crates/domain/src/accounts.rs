//! The module contains the `Account` aggregate.
//!
//! An account is a representation of a real checking/savings/investment
//! account or physical cash. Its balance is only mutated through the guarded
//! `credit`/`debit` pair; sufficiency is checked separately with
//! [`Account::can_debit`] before debiting, by design two distinct steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    events::DomainEvent,
    money::require_positive,
    names::EntityName,
    outcome::{Outcome, collect},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Checking,
    Savings,
    Investment,
    Cash,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "CHECKING",
            Self::Savings => "SAVINGS",
            Self::Investment => "INVESTMENT",
            Self::Cash => "CASH",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CHECKING" => Ok(Self::Checking),
            "SAVINGS" => Ok(Self::Savings),
            "INVESTMENT" => Ok(Self::Investment),
            "CASH" => Ok(Self::Cash),
            other => Err(DomainError::InvalidEnumValue {
                field: "account_type",
                value: other.to_string(),
            }),
        }
    }
}

/// User input for creating an account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub budget_id: Uuid,
    pub initial_balance_minor: i64,
}

/// Persisted row shape used to rehydrate an [`Account`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub budget_id: Uuid,
    pub balance_minor: i64,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A money holding owned by a budget.
#[derive(Clone, Debug)]
pub struct Account {
    id: Uuid,
    name: EntityName,
    kind: AccountKind,
    budget_id: Uuid,
    balance_minor: i64,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Account {
    /// Validating factory for user input. Accumulates every field error.
    pub fn create(input: NewAccount, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);
        if input.initial_balance_minor < 0 {
            errors.push(DomainError::InvalidAmount {
                field: "initial_balance",
                amount_minor: input.initial_balance_minor,
            });
        }

        let Some(name) = name else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: Uuid::new_v4(),
            name,
            kind: input.kind,
            budget_id: input.budget_id,
            balance_minor: input.initial_balance_minor,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    /// Rehydrate from trusted storage, re-applying field validation as a
    /// defense against corrupted rows. The balance may be negative here: a
    /// caller that skipped `can_debit` can legitimately have overdrawn.
    pub fn restore(snapshot: AccountSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);
        let kind = collect(AccountKind::try_from(snapshot.kind.as_str()), &mut errors);

        let (Some(name), Some(kind)) = (name, kind) else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: snapshot.id,
            name,
            kind,
            budget_id: snapshot.budget_id,
            balance_minor: snapshot.balance_minor,
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

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance_minor(&self) -> i64 {
        self.balance_minor
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether a debit of `amount_minor` would be covered.
    ///
    /// This is the caller's pre-check; [`Account::debit`] itself does not
    /// re-verify sufficiency.
    pub fn can_debit(&self, amount_minor: i64) -> bool {
        !self.deleted && amount_minor > 0 && self.balance_minor >= amount_minor
    }

    /// Increase the balance by a strictly positive amount.
    pub fn credit(&mut self, amount_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        let amount_minor = require_positive(amount_minor, "amount")?;

        self.balance_minor += amount_minor;
        self.events.push(DomainEvent::AccountCredited {
            account_id: self.id,
            budget_id: self.budget_id,
            amount_minor,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Decrease the balance by a strictly positive amount.
    ///
    /// Does not check sufficiency; call [`Account::can_debit`] first.
    pub fn debit(&mut self, amount_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        let amount_minor = require_positive(amount_minor, "amount")?;

        self.balance_minor -= amount_minor;
        self.events.push(DomainEvent::AccountDebited {
            account_id: self.id,
            budget_id: self.budget_id,
            amount_minor,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    pub fn rename(&mut self, raw: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        self.name = EntityName::new(raw, "name")?;
        self.touch(at);
        Ok(())
    }

    /// Soft delete; only allowed once and only at zero balance.
    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted { entity: "account" });
        }
        if self.balance_minor != 0 {
            return Err(DomainError::AccountHasBalance {
                balance_minor: self.balance_minor,
            });
        }
        self.deleted = true;
        self.events.push(DomainEvent::AccountDeleted {
            account_id: self.id,
            budget_id: self.budget_id,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Move the buffered events out, leaving the buffer empty.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_live(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "account" });
        }
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}
