//! Identifier parsing helpers.
//!
//! Aggregates reference each other by [`Uuid`] only (weak references);
//! repositories resolve them when needed. Raw ids arriving from user input
//! or storage are parsed through [`parse_id`] so a malformed id becomes a
//! labeled [`DomainError`] instead of a panic.

use uuid::Uuid;

use crate::{DomainResult, error::DomainError};

/// Parse an opaque unique id, labeling the failure with the field name.
pub fn parse_id(value: &str, field: &'static str) -> DomainResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| DomainError::InvalidId {
        field,
        value: value.to_string(),
    })
}
