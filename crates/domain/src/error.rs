//! The module contains the errors the domain core can return.
//!
//! Every expected, recoverable failure travels through [`DomainError`]; the
//! core never panics on a business-rule violation. Each variant carries the
//! offending field and, where it helps the caller, the rejected raw value so
//! error messages can echo what was refused.

use thiserror::Error;

/// Domain custom errors.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {field}: {value:?} is not a valid identifier")]
    InvalidId { field: &'static str, value: String },
    #[error("invalid {field}: {value:?} must be 2 to 255 characters")]
    InvalidName { field: &'static str, value: String },
    #[error("invalid {field}: {value:?} must be 10 to 255 characters")]
    InvalidReason { field: &'static str, value: String },
    #[error("{field} must not be in the future")]
    DateInFuture { field: &'static str },
    #[error("invalid {field}: {amount_minor}")]
    InvalidAmount {
        field: &'static str,
        amount_minor: i64,
    },
    #[error("invalid {field}: day {value} must be between 1 and 28")]
    InvalidDay { field: &'static str, value: u8 },
    #[error("invalid transfer amount: {amount_minor}")]
    InvalidTransferAmount { amount_minor: i64 },
    #[error("insufficient envelope balance: have {balance_minor}, need {amount_minor}")]
    InsufficientEnvelopeBalance {
        balance_minor: i64,
        amount_minor: i64,
    },
    #[error("insufficient account funds: have {balance_minor}, need {amount_minor}")]
    InsufficientAccountFunds {
        balance_minor: i64,
        amount_minor: i64,
    },
    #[error("envelope limit exceeded: {balance_minor} + {amount_minor} over cap {limit_minor}")]
    EnvelopeLimitExceeded {
        limit_minor: i64,
        balance_minor: i64,
        amount_minor: i64,
    },
    #[error("envelopes must belong to the same budget")]
    EnvelopesMustBelongToSameBudget,
    #[error("accounts must belong to the same budget")]
    AccountsMustBelongToSameBudget,
    #[error("account and {target} must belong to the same budget")]
    AccountBudgetMismatch { target: &'static str },
    #[error("envelope still holds {balance_minor} cents")]
    EnvelopeHasBalance { balance_minor: i64 },
    #[error("envelope has {count} linked transactions")]
    EnvelopeHasTransactions { count: u64 },
    #[error("account still holds {balance_minor} cents")]
    AccountHasBalance { balance_minor: i64 },
    #[error("invalid goal amount: {amount_minor}")]
    InvalidGoalAmount { amount_minor: i64 },
    #[error("goal already achieved")]
    GoalAlreadyAchieved,
    #[error("{entity} is deleted")]
    Deleted { entity: &'static str },
    #[error("{entity} already deleted")]
    AlreadyDeleted { entity: &'static str },
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("invalid {field}: {value:?}")]
    InvalidEnumValue { field: &'static str, value: String },
    #[error("invalid participant: {0}")]
    InvalidParticipant(String),
    #[error("closing date must precede due date")]
    BillDatesOutOfOrder,
}
