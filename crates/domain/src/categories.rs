//! The module contains the `Category` aggregate, a budget-scoped label for
//! classifying transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    error::DomainError,
    names::EntityName,
    outcome::{Outcome, collect},
};

/// User input for creating a category.
#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub budget_id: Uuid,
}

/// Persisted row shape used to rehydrate a [`Category`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub id: Uuid,
    pub name: String,
    pub budget_id: Uuid,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Category {
    id: Uuid,
    name: EntityName,
    budget_id: Uuid,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(input: NewCategory, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);

        let Some(name) = name else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: Uuid::new_v4(),
            name,
            budget_id: input.budget_id,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn restore(snapshot: CategorySnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);

        let Some(name) = name else {
            return Outcome::from_errors(errors);
        };

        Outcome::success(Self {
            id: snapshot.id,
            name,
            budget_id: snapshot.budget_id,
            deleted: snapshot.deleted,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
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

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rename(&mut self, raw: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted { entity: "category" });
        }
        self.name = EntityName::new(raw, "name")?;
        self.touch(at);
        Ok(())
    }

    /// Soft delete; rejected when already deleted.
    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted { entity: "category" });
        }
        self.deleted = true;
        self.touch(at);
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.version += 1;
    }
}
