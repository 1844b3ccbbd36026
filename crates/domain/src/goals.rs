//! The module contains the `Goal` aggregate.
//!
//! A goal tracks saving progress toward a fixed total. Contributions may
//! never push the accumulated amount past the total; landing exactly on the
//! total achieves the goal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    events::DomainEvent,
    names::EntityName,
    outcome::{Outcome, collect},
};

/// User input for creating a goal.
#[derive(Clone, Debug)]
pub struct NewGoal {
    pub name: String,
    pub total_minor: i64,
    pub deadline: Option<NaiveDate>,
    pub budget_id: Uuid,
    pub source_account_id: Option<Uuid>,
}

/// Persisted row shape used to rehydrate a [`Goal`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalSnapshot {
    pub id: Uuid,
    pub name: String,
    pub total_minor: i64,
    pub accumulated_minor: i64,
    pub deadline: Option<NaiveDate>,
    pub budget_id: Uuid,
    pub source_account_id: Option<Uuid>,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saving target owned by a budget.
#[derive(Clone, Debug)]
pub struct Goal {
    id: Uuid,
    name: EntityName,
    total_minor: i64,
    accumulated_minor: i64,
    deadline: Option<NaiveDate>,
    budget_id: Uuid,
    source_account_id: Option<Uuid>,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Goal {
    /// Validating factory for user input. Accumulates every field error.
    pub fn create(input: NewGoal, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);
        if input.total_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "total_amount",
                amount_minor: input.total_minor,
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
            total_minor: input.total_minor,
            accumulated_minor: 0,
            deadline: input.deadline,
            budget_id: input.budget_id,
            source_account_id: input.source_account_id,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    /// Rehydrate from storage, re-applying field validation defensively.
    pub fn restore(snapshot: GoalSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);
        if snapshot.total_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "total_amount",
                amount_minor: snapshot.total_minor,
            });
        }
        if snapshot.accumulated_minor < 0 || snapshot.accumulated_minor > snapshot.total_minor {
            errors.push(DomainError::InvalidAmount {
                field: "accumulated_amount",
                amount_minor: snapshot.accumulated_minor,
            });
        }

        let Some(name) = name else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: snapshot.id,
            name,
            total_minor: snapshot.total_minor,
            accumulated_minor: snapshot.accumulated_minor,
            deadline: snapshot.deadline,
            budget_id: snapshot.budget_id,
            source_account_id: snapshot.source_account_id,
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

    pub fn total_minor(&self) -> i64 {
        self.total_minor
    }

    pub fn accumulated_minor(&self) -> i64 {
        self.accumulated_minor
    }

    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    pub fn source_account_id(&self) -> Option<Uuid> {
        self.source_account_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_achieved(&self) -> bool {
        self.accumulated_minor == self.total_minor
    }

    /// Contribute toward the goal.
    ///
    /// Rejects non-positive amounts and anything that would overshoot the
    /// total; landing exactly on the total succeeds and records achievement.
    pub fn add_amount(&mut self, amount_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "goal" });
        }
        if self.is_achieved() {
            return Err(DomainError::GoalAlreadyAchieved);
        }
        if amount_minor <= 0 || self.accumulated_minor + amount_minor > self.total_minor {
            return Err(DomainError::InvalidGoalAmount { amount_minor });
        }

        self.accumulated_minor += amount_minor;
        self.events.push(DomainEvent::GoalAmountAdded {
            goal_id: self.id,
            budget_id: self.budget_id,
            amount_minor,
            accumulated_minor: self.accumulated_minor,
            occurred_at: at,
        });
        if self.is_achieved() {
            self.events.push(DomainEvent::GoalAchieved {
                goal_id: self.id,
                budget_id: self.budget_id,
                occurred_at: at,
            });
        }
        self.touch(at);
        Ok(())
    }

    pub fn rename(&mut self, raw: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "goal" });
        }
        self.name = EntityName::new(raw, "name")?;
        self.touch(at);
        Ok(())
    }

    /// Soft delete; rejected when already deleted.
    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted { entity: "goal" });
        }
        self.deleted = true;
        self.events.push(DomainEvent::GoalDeleted {
            goal_id: self.id,
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

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}
