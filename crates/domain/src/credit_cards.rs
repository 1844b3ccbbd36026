//! The module contains the `CreditCard` and `CreditCardBill` aggregates.
//!
//! A card defines the recurring billing cycle (closing day, due day); each
//! cycle produces a bill. A bill is `Open` until paid, may age to `Overdue`
//! past its due date, and `paid_at` is set exactly when the status is
//! `Paid`, never otherwise.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DomainResult,
    dates::PastOrPresentDate,
    error::DomainError,
    events::DomainEvent,
    names::EntityName,
    outcome::{Outcome, collect},
};

fn billing_day(value: u8, field: &'static str) -> DomainResult<u8> {
    // Capped at 28 so the cycle exists in every month.
    if !(1..=28).contains(&value) {
        return Err(DomainError::InvalidDay { field, value });
    }
    Ok(value)
}

/// User input for creating a credit card.
#[derive(Clone, Debug)]
pub struct NewCreditCard {
    pub name: String,
    pub limit_minor: i64,
    pub closing_day: u8,
    pub due_day: u8,
    pub budget_id: Uuid,
}

/// Persisted row shape used to rehydrate a [`CreditCard`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditCardSnapshot {
    pub id: Uuid,
    pub name: String,
    pub limit_minor: i64,
    pub closing_day: u8,
    pub due_day: u8,
    pub budget_id: Uuid,
    pub deleted: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CreditCard {
    id: Uuid,
    name: EntityName,
    limit_minor: i64,
    closing_day: u8,
    due_day: u8,
    budget_id: Uuid,
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CreditCard {
    pub fn create(input: NewCreditCard, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&input.name, "name"), &mut errors);
        if input.limit_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "limit",
                amount_minor: input.limit_minor,
            });
        }
        let closing_day = collect(billing_day(input.closing_day, "closing_day"), &mut errors);
        let due_day = collect(billing_day(input.due_day, "due_day"), &mut errors);
        if let (Some(closing), Some(due)) = (closing_day, due_day)
            && closing == due
        {
            errors.push(DomainError::InvalidDay {
                field: "due_day",
                value: due,
            });
        }

        let (Some(name), Some(closing_day), Some(due_day)) = (name, closing_day, due_day) else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: Uuid::new_v4(),
            name,
            limit_minor: input.limit_minor,
            closing_day,
            due_day,
            budget_id: input.budget_id,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn restore(snapshot: CreditCardSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let name = collect(EntityName::new(&snapshot.name, "name"), &mut errors);
        if snapshot.limit_minor <= 0 {
            errors.push(DomainError::InvalidAmount {
                field: "limit",
                amount_minor: snapshot.limit_minor,
            });
        }
        let closing_day = collect(billing_day(snapshot.closing_day, "closing_day"), &mut errors);
        let due_day = collect(billing_day(snapshot.due_day, "due_day"), &mut errors);

        let (Some(name), Some(closing_day), Some(due_day)) = (name, closing_day, due_day) else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: snapshot.id,
            name,
            limit_minor: snapshot.limit_minor,
            closing_day,
            due_day,
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

    pub fn limit_minor(&self) -> i64 {
        self.limit_minor
    }

    pub fn closing_day(&self) -> u8 {
        self.closing_day
    }

    pub fn due_day(&self) -> u8 {
        self.due_day
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn update_limit(&mut self, limit_minor: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::Deleted {
                entity: "credit_card",
            });
        }
        if limit_minor <= 0 {
            return Err(DomainError::InvalidAmount {
                field: "limit",
                amount_minor: limit_minor,
            });
        }
        self.limit_minor = limit_minor;
        self.touch(at);
        Ok(())
    }

    pub fn delete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::AlreadyDeleted {
                entity: "credit_card",
            });
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

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Open,
    Paid,
    Overdue,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        }
    }
}

impl TryFrom<&str> for BillStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "OPEN" => Ok(Self::Open),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            other => Err(DomainError::InvalidEnumValue {
                field: "bill_status",
                value: other.to_string(),
            }),
        }
    }
}

/// User input for opening a billing-cycle bill.
#[derive(Clone, Debug)]
pub struct NewCreditCardBill {
    pub credit_card_id: Uuid,
    pub budget_id: Uuid,
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_minor: i64,
}

/// Persisted row shape used to rehydrate a [`CreditCardBill`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditCardBillSnapshot {
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub budget_id: Uuid,
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_minor: i64,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CreditCardBill {
    id: Uuid,
    credit_card_id: Uuid,
    budget_id: Uuid,
    closing_date: NaiveDate,
    due_date: NaiveDate,
    amount_minor: i64,
    status: BillStatus,
    paid_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl CreditCardBill {
    pub fn create(input: NewCreditCardBill, now: DateTime<Utc>) -> Outcome<Self> {
        let mut errors = Vec::new();

        if input.closing_date >= input.due_date {
            errors.push(DomainError::BillDatesOutOfOrder);
        }
        if input.amount_minor < 0 {
            errors.push(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: input.amount_minor,
            });
        }

        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: Uuid::new_v4(),
            credit_card_id: input.credit_card_id,
            budget_id: input.budget_id,
            closing_date: input.closing_date,
            due_date: input.due_date,
            amount_minor: input.amount_minor,
            status: BillStatus::Open,
            paid_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    pub fn restore(snapshot: CreditCardBillSnapshot) -> Outcome<Self> {
        let mut errors = Vec::new();

        let status = collect(BillStatus::try_from(snapshot.status.as_str()), &mut errors);
        if snapshot.closing_date >= snapshot.due_date {
            errors.push(DomainError::BillDatesOutOfOrder);
        }
        if snapshot.amount_minor < 0 {
            errors.push(DomainError::InvalidAmount {
                field: "amount",
                amount_minor: snapshot.amount_minor,
            });
        }
        if let Some(status) = status
            && (status == BillStatus::Paid) != snapshot.paid_at.is_some()
        {
            errors.push(DomainError::InvalidTransition(
                "paid_at must be set exactly when the bill is paid".to_string(),
            ));
        }

        let Some(status) = status else {
            return Outcome::from_errors(errors);
        };
        if !errors.is_empty() {
            return Outcome::from_errors(errors);
        }

        Outcome::success(Self {
            id: snapshot.id,
            credit_card_id: snapshot.credit_card_id,
            budget_id: snapshot.budget_id,
            closing_date: snapshot.closing_date,
            due_date: snapshot.due_date,
            amount_minor: snapshot.amount_minor,
            status,
            paid_at: snapshot.paid_at,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn credit_card_id(&self) -> Uuid {
        self.credit_card_id
    }

    pub fn budget_id(&self) -> Uuid {
        self.budget_id
    }

    pub fn closing_date(&self) -> NaiveDate {
        self.closing_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Settle the bill. The payment instant must not lie in the future.
    pub fn pay(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == BillStatus::Paid {
            return Err(DomainError::InvalidTransition(
                "bill already paid".to_string(),
            ));
        }
        let paid_at = PastOrPresentDate::new(at, now, "paid_at")?;

        self.status = BillStatus::Paid;
        self.paid_at = Some(paid_at.value());
        self.events.push(DomainEvent::CreditCardBillPaid {
            bill_id: self.id,
            budget_id: self.budget_id,
            occurred_at: paid_at.value(),
        });
        self.touch(now);
        Ok(())
    }

    /// Age an open bill whose due date has passed.
    pub fn mark_overdue(&mut self, reference: NaiveDate, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != BillStatus::Open {
            return Err(DomainError::InvalidTransition(format!(
                "cannot mark {} bill as overdue",
                self.status.as_str()
            )));
        }
        if self.due_date >= reference {
            return Err(DomainError::InvalidTransition(
                "bill is not yet overdue".to_string(),
            ));
        }
        self.status = BillStatus::Overdue;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CreditCard {
        CreditCard::create(
            NewCreditCard {
                name: "Visa".to_string(),
                limit_minor: 500_000,
                closing_day: 5,
                due_day: 15,
                budget_id: Uuid::new_v4(),
            },
            Utc::now(),
        )
        .into_result()
        .unwrap()
    }

    fn bill() -> CreditCardBill {
        CreditCardBill::create(
            NewCreditCardBill {
                credit_card_id: Uuid::new_v4(),
                budget_id: Uuid::new_v4(),
                closing_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                amount_minor: 12_500,
            },
            Utc::now(),
        )
        .into_result()
        .unwrap()
    }

    #[test]
    fn card_rejects_equal_closing_and_due_days() {
        let outcome = CreditCard::create(
            NewCreditCard {
                name: "Visa".to_string(),
                limit_minor: 500_000,
                closing_day: 10,
                due_day: 10,
                budget_id: Uuid::new_v4(),
            },
            Utc::now(),
        );
        assert!(outcome.has_error());
    }

    #[test]
    fn card_rejects_day_29_and_up() {
        let outcome = CreditCard::create(
            NewCreditCard {
                name: "Visa".to_string(),
                limit_minor: 500_000,
                closing_day: 31,
                due_day: 10,
                budget_id: Uuid::new_v4(),
            },
            Utc::now(),
        );
        assert!(outcome.has_error());
    }

    #[test]
    fn card_limit_update_guards_deletion() {
        let mut card = card();
        card.delete(Utc::now()).unwrap();
        assert!(card.update_limit(100, Utc::now()).is_err());
    }

    #[test]
    fn bill_rejects_closing_after_due() {
        let outcome = CreditCardBill::create(
            NewCreditCardBill {
                credit_card_id: Uuid::new_v4(),
                budget_id: Uuid::new_v4(),
                closing_date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                amount_minor: 0,
            },
            Utc::now(),
        );
        assert_eq!(outcome.errors(), &[DomainError::BillDatesOutOfOrder]);
    }

    #[test]
    fn pay_sets_paid_at_and_is_terminal() {
        let mut bill = bill();
        let now = Utc::now();
        bill.pay(now, now).unwrap();

        assert_eq!(bill.status(), BillStatus::Paid);
        assert_eq!(bill.paid_at(), Some(now));
        assert!(bill.pay(now, now).is_err());
    }

    #[test]
    fn pay_rejects_future_instant() {
        let mut bill = bill();
        let now = Utc::now();
        assert!(bill.pay(now + chrono::Duration::hours(1), now).is_err());
        assert_eq!(bill.status(), BillStatus::Open);
        assert_eq!(bill.paid_at(), None);
    }

    #[test]
    fn overdue_ages_only_past_due_open_bills() {
        let mut bill = bill();
        let before_due = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let after_due = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();

        assert!(bill.mark_overdue(before_due, Utc::now()).is_err());
        bill.mark_overdue(after_due, Utc::now()).unwrap();
        assert_eq!(bill.status(), BillStatus::Overdue);

        // Overdue bills can still be paid.
        let now = Utc::now();
        bill.pay(now, now).unwrap();
        assert_eq!(bill.status(), BillStatus::Paid);
    }

    #[test]
    fn restore_rejects_paid_without_timestamp() {
        let outcome = CreditCardBill::restore(CreditCardBillSnapshot {
            id: Uuid::new_v4(),
            credit_card_id: Uuid::new_v4(),
            budget_id: Uuid::new_v4(),
            closing_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            amount_minor: 100,
            status: "PAID".to_string(),
            paid_at: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        assert!(outcome.has_error());
    }
}
