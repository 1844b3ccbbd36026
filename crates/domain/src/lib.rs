//! Domain core of the Gruzzolo budgeting backend.
//!
//! Everything here is pure and deterministic: aggregates validate themselves,
//! record events into an owned buffer and never touch a clock, a database or
//! the network. Time always arrives as a parameter, persistence and
//! publication live behind the application layer's ports.

pub use accounts::{Account, AccountKind, AccountSnapshot, NewAccount};
pub use budgets::{Budget, BudgetSnapshot, NewBudget};
pub use categories::{Category, CategorySnapshot, NewCategory};
pub use credit_cards::{
    BillStatus, CreditCard, CreditCardBill, CreditCardBillSnapshot, CreditCardSnapshot,
    NewCreditCard, NewCreditCardBill,
};
pub use dates::PastOrPresentDate;
pub use envelopes::{Envelope, EnvelopeSnapshot, EnvelopeStatus, NewEnvelope};
pub use error::DomainError;
pub use events::DomainEvent;
pub use goals::{Goal, GoalSnapshot, NewGoal};
pub use ids::parse_id;
pub use money::{EnvelopeBalance, MonthlyLimit};
pub use names::{CancellationReason, EntityName};
pub use outcome::Outcome;
pub use transactions::{
    NewTransaction, Transaction, TransactionKind, TransactionSnapshot, TransactionStatus,
};
pub use transfer::transfer_between_envelopes;

mod accounts;
mod budgets;
mod categories;
mod credit_cards;
mod dates;
mod envelopes;
mod error;
mod events;
mod goals;
mod ids;
mod money;
mod names;
mod outcome;
mod transactions;
mod transfer;

pub type DomainResult<T> = Result<T, DomainError>;
