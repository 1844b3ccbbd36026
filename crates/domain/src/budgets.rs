//! The module contains the `Budget` aggregate.
//!
//! A budget is the ownership boundary for every other aggregate: accounts,
//! envelopes, goals, cards and transactions all carry a `budget_id`. The
//! owner is always a participant and can never be removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    names::EntityName,
    outcome::{Outcome, collect},
};

/// User input for creating a budget.
#[derive(Clone, Debug)]
pub struct NewBudget {
    pub name: String,
    pub owner_id: Uuid,
}

/// Persisted row shape used to rehydrate a [`Budget`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The ownership boundary shared by a group of users.
#[derive(Clone, Debug)]
pub struct Budget {
    id: Uuid,
    name: EntityName,
    owner_id: Uuid,
    participant_ids: Vec<Uuid>,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Budget {
    /// Validating factory for user input. The owner joins as the first
    /// participant.
    pub fn create(input: NewBudget, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);

        let Some(name) = name else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: Uuid::new_v4(),
            name,
            owner_id: input.owner_id,
            participant_ids: vec![input.owner_id],
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate from storage, re-applying field validation defensively.
    pub fn restore(snapshot: BudgetSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);
        if !snapshot.participant_ids.contains(&snapshot.owner_id) {
            errors.push(DomainError::InvalidParticipant(
                "owner is not a participant".to_string(),
            ));
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
            owner_id: snapshot.owner_id,
            participant_ids: snapshot.participant_ids,
            deleted: snapshot.deleted,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn participant_ids(&self) -> &[Uuid] {
        &self.participant_ids
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_ids.contains(&user_id)
    }

    pub fn add_participant(&mut self, user_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        if self.participant_ids.contains(&user_id) {
            return Err(DomainError::InvalidParticipant(
                "user is already a participant".to_string(),
            ));
        }
        self.participant_ids.push(user_id);
        self.touch(at);
        Ok(())
    }

    /// Remove a participant. The owner can never leave their own budget.
    pub fn remove_participant(&mut self, user_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        if user_id == self.owner_id {
            return Err(DomainError::InvalidParticipant(
                "owner cannot be removed".to_string(),
            ));
        }
        let Some(index) = self.participant_ids.iter().position(|id| *id == user_id) else {
            return Err(DomainError::InvalidParticipant(
                "user is not a participant".to_string(),
            ));
        };
        self.participant_ids.remove(index);
        self.touch(at);
        Ok(())
    }

    pub fn rename(&mut self, raw: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_live()?;
        self.name = EntityName::new(raw, "name")?;
        self.touch(at);
        Ok(())
    }

    /// Soft delete; rejected when already deleted.
    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted { entity: "budget" });
        }
        self.deleted = true;
        self.touch(at);
        Ok(())
    }

    fn ensure_live(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "budget" });
        }
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}
