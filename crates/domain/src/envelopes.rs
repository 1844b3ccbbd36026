//! The module contains the `Envelope` aggregate.
//!
//! An envelope is a monthly spending bucket inside a budget. Its balance is
//! held by the [`EnvelopeBalance`] value object, which keeps it non-negative;
//! funding is additionally capped by the monthly limit.
//!
//! The status machine is Active <-> Paused (freely, including no-op repeats)
//! with a one-way `archive`. The soft-delete flag is orthogonal to status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    events::DomainEvent,
    money::{EnvelopeBalance, MonthlyLimit},
    names::EntityName,
    outcome::{Outcome, collect},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    Active,
    Paused,
    Archived,
}

impl EnvelopeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl TryFrom<&str> for EnvelopeStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(DomainError::InvalidEnumValue {
                field: "envelope_status",
                value: other.to_string(),
            }),
        }
    }
}

/// User input for creating an envelope. New envelopes start Active with a
/// zero balance.
#[derive(Clone, Debug)]
pub struct NewEnvelope {
    pub name: String,
    pub monthly_limit_minor: i64,
    pub budget_id: Uuid,
    pub category_id: Option<Uuid>,
}

/// Persisted row shape used to rehydrate an [`Envelope`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvelopeSnapshot {
    pub id: Uuid,
    pub name: String,
    pub monthly_limit_minor: i64,
    pub budget_id: Uuid,
    pub category_id: Option<Uuid>,
    pub balance_minor: i64,
    pub status: String,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A capped spending bucket owned by a budget.
#[derive(Clone, Debug)]
pub struct Envelope {
    id: Uuid,
    name: EntityName,
    monthly_limit: MonthlyLimit,
    budget_id: Uuid,
    category_id: Option<Uuid>,
    balance: EnvelopeBalance,
    status: EnvelopeStatus,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Envelope {
    /// Validating factory for user input. Accumulates every field error.
    pub fn create(input: NewEnvelope, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);
        let limit = collect(MonthlyLimit::new(input.monthly_limit_minor), &mut errors);

        let (Some(name), Some(limit)) = (name, limit) else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: Uuid::new_v4(),
            name,
            monthly_limit: limit,
            budget_id: input.budget_id,
            category_id: input.category_id,
            balance: EnvelopeBalance::ZERO,
            status: EnvelopeStatus::Active,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    /// Rehydrate from storage, re-applying field validation defensively.
    pub fn restore(snapshot: EnvelopeSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);
        let limit = collect(MonthlyLimit::new(snapshot.monthly_limit_minor), &mut errors);
        let balance = collect(EnvelopeBalance::new(snapshot.balance_minor), &mut errors);
        let status = collect(
            EnvelopeStatus::try_from(snapshot.status.as_str()),
            &mut errors,
        );

        let (Some(name), Some(limit), Some(balance), Some(status)) =
            (name, limit, balance, status)
        else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: snapshot.id,
            name,
            monthly_limit: limit,
            budget_id: snapshot.budget_id,
            category_id: snapshot.category_id,
            balance,
            status,
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

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn monthly_limit_minor(&self) -> i64 {
        self.monthly_limit.minor()
    }

    pub fn balance_minor(&self) -> i64 {
        self.balance.minor()
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Add money to the envelope, enforcing the monthly cap.
    pub fn fund(&mut self, amount_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        let funded = self.balance.add(amount_minor)?;
        if funded.minor() > self.monthly_limit.minor() {
            return Err(DomainError::EnvelopeLimitExceeded {
                limit_minor: self.monthly_limit.minor(),
                balance_minor: self.balance.minor(),
                amount_minor,
            });
        }

        self.balance = funded;
        self.events.push(DomainEvent::EnvelopeFunded {
            envelope_id: self.id,
            budget_id: self.budget_id,
            amount_minor,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Take money out of the envelope; the balance never goes negative.
    pub fn withdraw(&mut self, amount_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        self.balance = self.balance.subtract(amount_minor)?;
        self.events.push(DomainEvent::EnvelopeWithdrawn {
            envelope_id: self.id,
            budget_id: self.budget_id,
            amount_minor,
            occurred_at: at,
        });
        self.touch(at);
        Ok(())
    }

    /// Pause spending. Pausing an already-paused envelope is a no-op.
    pub fn pause(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        self.ensure_not_archived()?;
        if self.status != EnvelopeStatus::Paused {
            self.status = EnvelopeStatus::Paused;
            self.touch(at);
        }
        Ok(())
    }

    /// Resume spending. Resuming an already-active envelope is a no-op.
    pub fn resume(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        self.ensure_not_archived()?;
        if self.status != EnvelopeStatus::Active {
            self.status = EnvelopeStatus::Active;
            self.touch(at);
        }
        Ok(())
    }

    /// Retire the envelope. One-way: an archived envelope never reactivates.
    pub fn archive(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        self.ensure_not_archived()?;
        self.status = EnvelopeStatus::Archived;
        self.touch(at);
        Ok(())
    }

    pub fn rename(&mut self, raw: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        self.name = EntityName::new(raw, "name")?;
        self.touch(at);
        Ok(())
    }

    /// Raise or lower the monthly cap. The cap only constrains future
    /// funding; an existing balance above a lowered cap stays as it is.
    pub fn set_monthly_limit(&mut self, minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        self.monthly_limit = MonthlyLimit::new(minor)?;
        self.touch(at);
        Ok(())
    }

    /// Soft delete, gated on an empty envelope with no linked transactions.
    pub fn delete(&mut self, linked_transactions: u64, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted { entity: "envelope" });
        }
        if !self.balance.is_zero() {
            return Err(DomainError::EnvelopeHasBalance {
                balance_minor: self.balance.minor(),
            });
        }
        if linked_transactions > 0 {
            return Err(DomainError::EnvelopeHasTransactions {
                count: linked_transactions,
            });
        }
        self.deleted = true;
        self.events.push(DomainEvent::EnvelopeDeleted {
            envelope_id: self.id,
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

    fn ensure_not_deleted(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "envelope" });
        }
        Ok(())
    }

    fn ensure_not_archived(&self) -> DomainResult<()> {
        if self.status == EnvelopeStatus::Archived {
            return Err(DomainError::InvalidTransition(
                "envelope is archived".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_live(&self) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        self.ensure_not_archived()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}
