use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use application::{
    AccountRepository, AppResult, ApplicationError, ContributeToEnvelope,
    ContributeToEnvelopeUseCase, ContributeToGoal, ContributeToGoalUseCase, EnvelopeRepository,
    EventPublisher, FindOverdueScheduledTransactions, GoalRepository, LateTransactionScheduler,
    MoveBetweenEnvelopes,
    MoveBetweenEnvelopesUseCase, TransactionRepository, TransferFunds, TransferFundsUseCase,
    UnitOfWork, WriteBatch,
};
use domain::{
    Account, AccountKind, DomainError, DomainEvent, Envelope, Goal, NewAccount, NewEnvelope,
    NewGoal, NewTransaction, Transaction, TransactionKind, TransactionStatus,
};

#[derive(Default)]
struct InMemoryAccounts(Mutex<HashMap<Uuid, Account>>);

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn get(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, account: &Account) -> AppResult<()> {
        self.0.lock().unwrap().insert(account.id(), account.clone());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryEnvelopes(Mutex<HashMap<Uuid, Envelope>>);

#[async_trait]
impl EnvelopeRepository for InMemoryEnvelopes {
    async fn get(&self, id: Uuid) -> AppResult<Option<Envelope>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, envelope: &Envelope) -> AppResult<()> {
        self.0
            .lock()
            .unwrap()
            .insert(envelope.id(), envelope.clone());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryGoals(Mutex<HashMap<Uuid, Goal>>);

#[async_trait]
impl GoalRepository for InMemoryGoals {
    async fn get(&self, id: Uuid) -> AppResult<Option<Goal>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, goal: &Goal) -> AppResult<()> {
        self.0.lock().unwrap().insert(goal.id(), goal.clone());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryTransactions {
    rows: Mutex<HashMap<Uuid, Transaction>>,
    fail_save_for: Option<Uuid>,
}

#[async_trait]
impl TransactionRepository for InMemoryTransactions {
    async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, transaction: &Transaction) -> AppResult<()> {
        if self.fail_save_for == Some(transaction.id()) {
            return Err(ApplicationError::Repository("disk full".to_string()));
        }
        self.rows
            .lock()
            .unwrap()
            .insert(transaction.id(), transaction.clone());
        Ok(())
    }
}

#[async_trait]
impl FindOverdueScheduledTransactions for InMemoryTransactions {
    async fn execute(&self, reference: DateTime<Utc>) -> AppResult<Vec<Transaction>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|t| {
                t.status() == TransactionStatus::Scheduled && t.transaction_date() < reference
            })
            .cloned()
            .collect())
    }
}

/// Applies the whole batch to the in-memory stores, mimicking a committed
/// database transaction.
struct ApplyingUow {
    accounts: Arc<InMemoryAccounts>,
    envelopes: Arc<InMemoryEnvelopes>,
    goals: Arc<InMemoryGoals>,
    transactions: Arc<InMemoryTransactions>,
}

#[async_trait]
impl UnitOfWork for ApplyingUow {
    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        for account in &batch.accounts {
            self.accounts.save(account).await?;
        }
        for envelope in &batch.envelopes {
            self.envelopes.save(envelope).await?;
        }
        for goal in &batch.goals {
            self.goals.save(goal).await?;
        }
        for transaction in &batch.transactions {
            self.transactions.save(transaction).await?;
        }
        Ok(())
    }
}

struct FailingUow;

#[async_trait]
impl UnitOfWork for FailingUow {
    async fn commit(&self, _batch: WriteBatch) -> AppResult<()> {
        Err(ApplicationError::Repository(
            "serialization conflict".to_string(),
        ))
    }
}

#[derive(Default)]
struct CollectingPublisher(Mutex<Vec<DomainEvent>>);

#[async_trait]
impl EventPublisher for CollectingPublisher {
    async fn publish_many(&self, events: Vec<DomainEvent>) -> AppResult<()> {
        self.0.lock().unwrap().extend(events);
        Ok(())
    }
}

struct World {
    accounts: Arc<InMemoryAccounts>,
    envelopes: Arc<InMemoryEnvelopes>,
    goals: Arc<InMemoryGoals>,
    transactions: Arc<InMemoryTransactions>,
    uow: Arc<ApplyingUow>,
    publisher: Arc<CollectingPublisher>,
}

fn world() -> World {
    let accounts = Arc::new(InMemoryAccounts::default());
    let envelopes = Arc::new(InMemoryEnvelopes::default());
    let goals = Arc::new(InMemoryGoals::default());
    let transactions = Arc::new(InMemoryTransactions::default());
    let uow = Arc::new(ApplyingUow {
        accounts: accounts.clone(),
        envelopes: envelopes.clone(),
        goals: goals.clone(),
        transactions: transactions.clone(),
    });
    World {
        accounts,
        envelopes,
        goals,
        transactions,
        uow,
        publisher: Arc::new(CollectingPublisher::default()),
    }
}

fn account(budget_id: Uuid, balance_minor: i64) -> Account {
    Account::create(
        NewAccount {
            name: "Checking".to_string(),
            kind: AccountKind::Checking,
            budget_id,
            initial_balance_minor: balance_minor,
        },
        Utc::now(),
    )
    .into_result()
    .unwrap()
}

fn envelope(budget_id: Uuid, limit_minor: i64, balance_minor: i64) -> Envelope {
    let mut envelope = Envelope::create(
        NewEnvelope {
            name: "Groceries".to_string(),
            monthly_limit_minor: limit_minor,
            budget_id,
            category_id: None,
        },
        Utc::now(),
    )
    .into_result()
    .unwrap();
    if balance_minor > 0 {
        envelope.fund(balance_minor, Utc::now()).unwrap();
        envelope.drain_events();
    }
    envelope
}

fn goal(budget_id: Uuid, total_minor: i64, accumulated_minor: i64) -> Goal {
    let mut goal = Goal::create(
        NewGoal {
            name: "New bike".to_string(),
            total_minor,
            deadline: None,
            budget_id,
            source_account_id: None,
        },
        Utc::now(),
    )
    .into_result()
    .unwrap();
    if accumulated_minor > 0 {
        goal.add_amount(accumulated_minor, Utc::now()).unwrap();
        goal.drain_events();
    }
    goal
}

fn scheduled_transaction(budget_id: Uuid, date: DateTime<Utc>) -> Transaction {
    Transaction::create(
        NewTransaction {
            description: "Rent for January".to_string(),
            amount_minor: 80_000,
            kind: TransactionKind::Expense,
            account_id: Uuid::new_v4(),
            category_id: None,
            budget_id,
            transaction_date: date,
        },
        Utc::now(),
    )
    .into_result()
    .unwrap()
}

#[tokio::test]
async fn transfer_moves_money_and_books_paired_legs() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 10_000);
    let target = account(budget_id, 0);
    w.accounts.save(&source).await.unwrap();
    w.accounts.save(&target).await.unwrap();

    let use_case = TransferFundsUseCase::new(
        w.accounts.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let transfer_id = use_case
        .execute(
            TransferFunds {
                source_account_id: source.id(),
                target_account_id: target.id(),
                amount_minor: 2_500,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let stored_source = w.accounts.get(source.id()).await.unwrap().unwrap();
    let stored_target = w.accounts.get(target.id()).await.unwrap().unwrap();
    assert_eq!(stored_source.balance_minor(), 7_500);
    assert_eq!(stored_target.balance_minor(), 2_500);
    // Conservation: total across both accounts is unchanged.
    assert_eq!(
        stored_source.balance_minor() + stored_target.balance_minor(),
        10_000
    );

    let legs: Vec<Transaction> = w
        .transactions
        .rows
        .lock()
        .unwrap()
        .values()
        .cloned()
        .collect();
    assert_eq!(legs.len(), 2);
    for leg in &legs {
        assert_eq!(leg.kind(), TransactionKind::Transfer);
        assert_eq!(leg.status(), TransactionStatus::Completed);
        assert_eq!(leg.transfer_id(), Some(transfer_id));
        assert_eq!(leg.amount_minor(), 2_500);
    }

    let events = w.publisher.0.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, DomainEvent::AccountDebited { .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, DomainEvent::AccountCredited { .. }))
    );
}

#[tokio::test]
async fn transfer_rejects_cross_budget_accounts() {
    let w = world();
    let source = account(Uuid::new_v4(), 10_000);
    let target = account(Uuid::new_v4(), 0);
    w.accounts.save(&source).await.unwrap();
    w.accounts.save(&target).await.unwrap();

    let use_case = TransferFundsUseCase::new(
        w.accounts.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            TransferFunds {
                source_account_id: source.id(),
                target_account_id: target.id(),
                amount_minor: 100,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::AccountsMustBelongToSameBudget)
    );
    let stored = w.accounts.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored.balance_minor(), 10_000);
    assert!(w.transactions.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transfer_rejects_insufficient_funds_without_writing() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 100);
    let target = account(budget_id, 0);
    w.accounts.save(&source).await.unwrap();
    w.accounts.save(&target).await.unwrap();

    let use_case = TransferFundsUseCase::new(
        w.accounts.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            TransferFunds {
                source_account_id: source.id(),
                target_account_id: target.id(),
                amount_minor: 500,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::InsufficientAccountFunds {
            balance_minor: 100,
            amount_minor: 500,
        })
    );
    assert!(w.transactions.rows.lock().unwrap().is_empty());
    assert!(w.publisher.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transfer_rejects_non_positive_amount() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 100);
    let target = account(budget_id, 0);
    w.accounts.save(&source).await.unwrap();
    w.accounts.save(&target).await.unwrap();

    let use_case = TransferFundsUseCase::new(
        w.accounts.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            TransferFunds {
                source_account_id: source.id(),
                target_account_id: target.id(),
                amount_minor: 0,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::InvalidTransferAmount { amount_minor: 0 })
    );
}

#[tokio::test]
async fn envelope_contribution_debits_and_funds_in_one_commit() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 5_000);
    let bucket = envelope(budget_id, 10_000, 0);
    w.accounts.save(&source).await.unwrap();
    w.envelopes.save(&bucket).await.unwrap();

    let use_case = ContributeToEnvelopeUseCase::new(
        w.accounts.clone(),
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    use_case
        .execute(
            ContributeToEnvelope {
                source_account_id: source.id(),
                envelope_id: bucket.id(),
                amount_minor: 1_200,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    let stored_envelope = w.envelopes.get(bucket.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 3_800);
    assert_eq!(stored_envelope.balance_minor(), 1_200);
}

#[tokio::test]
async fn envelope_cap_failure_writes_nothing() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 5_000);
    let bucket = envelope(budget_id, 1_000, 900);
    w.accounts.save(&source).await.unwrap();
    w.envelopes.save(&bucket).await.unwrap();

    let use_case = ContributeToEnvelopeUseCase::new(
        w.accounts.clone(),
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            ContributeToEnvelope {
                source_account_id: source.id(),
                envelope_id: bucket.id(),
                amount_minor: 200,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::EnvelopeLimitExceeded {
            limit_minor: 1_000,
            balance_minor: 900,
            amount_minor: 200,
        })
    );
    // The already-applied debit never reaches the store.
    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    let stored_envelope = w.envelopes.get(bucket.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 5_000);
    assert_eq!(stored_envelope.balance_minor(), 900);
}

#[tokio::test]
async fn failed_commit_leaves_stores_untouched() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 5_000);
    let bucket = envelope(budget_id, 10_000, 0);
    w.accounts.save(&source).await.unwrap();
    w.envelopes.save(&bucket).await.unwrap();

    let use_case = ContributeToEnvelopeUseCase::new(
        w.accounts.clone(),
        w.envelopes.clone(),
        Arc::new(FailingUow),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            ContributeToEnvelope {
                source_account_id: source.id(),
                envelope_id: bucket.id(),
                amount_minor: 1_200,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Repository(_)));
    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 5_000);
    assert!(w.publisher.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn goal_contribution_publishes_achievement() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 10_000);
    let target = goal(budget_id, 5_000, 1_000);
    w.accounts.save(&source).await.unwrap();
    w.goals.save(&target).await.unwrap();

    let use_case = ContributeToGoalUseCase::new(
        w.accounts.clone(),
        w.goals.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    use_case
        .execute(
            ContributeToGoal {
                source_account_id: source.id(),
                goal_id: target.id(),
                amount_minor: 4_000,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let stored_goal = w.goals.get(target.id()).await.unwrap().unwrap();
    assert!(stored_goal.is_achieved());
    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 6_000);

    let events = w.publisher.0.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, DomainEvent::GoalAchieved { .. }))
    );
}

#[tokio::test]
async fn goal_contribution_rejects_cross_budget_account() {
    let w = world();
    let source = account(Uuid::new_v4(), 10_000);
    let foreign = goal(Uuid::new_v4(), 5_000, 0);
    w.accounts.save(&source).await.unwrap();
    w.goals.save(&foreign).await.unwrap();

    let use_case = ContributeToGoalUseCase::new(
        w.accounts.clone(),
        w.goals.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            ContributeToGoal {
                source_account_id: source.id(),
                goal_id: foreign.id(),
                amount_minor: 1_000,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::AccountBudgetMismatch { target: "goal" })
    );
    let stored_goal = w.goals.get(foreign.id()).await.unwrap().unwrap();
    assert_eq!(stored_goal.accumulated_minor(), 0);
    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 10_000);
}

#[tokio::test]
async fn envelope_contribution_rejects_cross_budget_account() {
    let w = world();
    let source = account(Uuid::new_v4(), 10_000);
    let foreign = envelope(Uuid::new_v4(), 5_000, 0);
    w.accounts.save(&source).await.unwrap();
    w.envelopes.save(&foreign).await.unwrap();

    let use_case = ContributeToEnvelopeUseCase::new(
        w.accounts.clone(),
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            ContributeToEnvelope {
                source_account_id: source.id(),
                envelope_id: foreign.id(),
                amount_minor: 1_000,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::AccountBudgetMismatch { target: "envelope" })
    );
    let stored_envelope = w.envelopes.get(foreign.id()).await.unwrap().unwrap();
    assert_eq!(stored_envelope.balance_minor(), 0);
}

#[tokio::test]
async fn contribution_rejects_non_positive_amount() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 5_000);
    let bucket = envelope(budget_id, 10_000, 0);
    let target = goal(budget_id, 5_000, 0);
    w.accounts.save(&source).await.unwrap();
    w.envelopes.save(&bucket).await.unwrap();
    w.goals.save(&target).await.unwrap();

    let envelope_use_case = ContributeToEnvelopeUseCase::new(
        w.accounts.clone(),
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = envelope_use_case
        .execute(
            ContributeToEnvelope {
                source_account_id: source.id(),
                envelope_id: bucket.id(),
                amount_minor: 0,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::InvalidAmount {
            field: "amount",
            amount_minor: 0,
        })
    );

    let goal_use_case = ContributeToGoalUseCase::new(
        w.accounts.clone(),
        w.goals.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = goal_use_case
        .execute(
            ContributeToGoal {
                source_account_id: source.id(),
                goal_id: target.id(),
                amount_minor: -50,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::InvalidAmount {
            field: "amount",
            amount_minor: -50,
        })
    );
}

#[tokio::test]
async fn goal_overshoot_rejected_without_debit() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = account(budget_id, 10_000);
    let target = goal(budget_id, 5_000, 1_000);
    w.accounts.save(&source).await.unwrap();
    w.goals.save(&target).await.unwrap();

    let use_case = ContributeToGoalUseCase::new(
        w.accounts.clone(),
        w.goals.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            ContributeToGoal {
                source_account_id: source.id(),
                goal_id: target.id(),
                amount_minor: 4_001,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::InvalidGoalAmount {
            amount_minor: 4_001
        })
    );
    let stored_account = w.accounts.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored_account.balance_minor(), 10_000);
}

#[tokio::test]
async fn envelope_move_commits_both_sides() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = envelope(budget_id, 10_000, 600);
    let target = envelope(budget_id, 10_000, 100);
    w.envelopes.save(&source).await.unwrap();
    w.envelopes.save(&target).await.unwrap();

    let use_case = MoveBetweenEnvelopesUseCase::new(
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    use_case
        .execute(
            MoveBetweenEnvelopes {
                budget_id,
                source_envelope_id: source.id(),
                target_envelope_id: target.id(),
                amount_minor: 250,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let stored_source = w.envelopes.get(source.id()).await.unwrap().unwrap();
    let stored_target = w.envelopes.get(target.id()).await.unwrap().unwrap();
    assert_eq!(stored_source.balance_minor(), 350);
    assert_eq!(stored_target.balance_minor(), 350);
}

#[tokio::test]
async fn envelope_move_rejects_cross_budget() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let source = envelope(budget_id, 10_000, 600);
    let foreign = envelope(Uuid::new_v4(), 10_000, 0);
    w.envelopes.save(&source).await.unwrap();
    w.envelopes.save(&foreign).await.unwrap();

    let use_case = MoveBetweenEnvelopesUseCase::new(
        w.envelopes.clone(),
        w.uow.clone(),
        w.publisher.clone(),
    );
    let err = use_case
        .execute(
            MoveBetweenEnvelopes {
                budget_id,
                source_envelope_id: source.id(),
                target_envelope_id: foreign.id(),
                amount_minor: 100,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Domain(DomainError::EnvelopesMustBelongToSameBudget)
    );
    let stored_source = w.envelopes.get(source.id()).await.unwrap().unwrap();
    assert_eq!(stored_source.balance_minor(), 600);
}

#[tokio::test]
async fn scheduler_ages_only_past_scheduled_transactions() {
    let w = world();
    let budget_id = Uuid::new_v4();
    let reference = Utc::now();
    let past = scheduled_transaction(budget_id, reference - Duration::days(3));
    let future = scheduled_transaction(budget_id, reference + Duration::days(3));
    let mut completed = scheduled_transaction(budget_id, reference - Duration::days(3));
    completed.complete(reference).unwrap();
    completed.drain_events();
    w.transactions.save(&past).await.unwrap();
    w.transactions.save(&future).await.unwrap();
    w.transactions.save(&completed).await.unwrap();

    let scheduler = LateTransactionScheduler::new(
        w.transactions.clone(),
        w.transactions.clone(),
        w.publisher.clone(),
    );
    let aged = scheduler
        .process_late_transactions(reference, reference)
        .await
        .unwrap();

    assert_eq!(aged, vec![past.id()]);
    let stored = w.transactions.get(past.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), TransactionStatus::Late);
    let untouched = w.transactions.get(future.id()).await.unwrap().unwrap();
    assert_eq!(untouched.status(), TransactionStatus::Scheduled);

    let events = w.publisher.0.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, DomainEvent::TransactionMarkedLate { .. }))
    );
}

#[tokio::test]
async fn scheduler_skips_save_failures_and_continues() {
    let budget_id = Uuid::new_v4();
    let reference = Utc::now();
    let poisoned = scheduled_transaction(budget_id, reference - Duration::days(1));
    let healthy = scheduled_transaction(budget_id, reference - Duration::days(1));

    let transactions = Arc::new(InMemoryTransactions {
        rows: Mutex::new(HashMap::from([
            (poisoned.id(), poisoned.clone()),
            (healthy.id(), healthy.clone()),
        ])),
        fail_save_for: Some(poisoned.id()),
    });
    let publisher = Arc::new(CollectingPublisher::default());

    let scheduler = LateTransactionScheduler::new(transactions.clone(), transactions.clone(), publisher);
    let aged = scheduler
        .process_late_transactions(reference, reference)
        .await
        .unwrap();

    assert_eq!(aged, vec![healthy.id()]);
    let skipped = transactions.get(poisoned.id()).await.unwrap().unwrap();
    assert_eq!(skipped.status(), TransactionStatus::Scheduled);
}

#[test]
fn write_batch_transfer_rejects_mismatched_legs() {
    let budget_id = Uuid::new_v4();
    let now = Utc::now();
    let from = account(budget_id, 1_000);
    let to = account(budget_id, 0);
    let transfer_id = Uuid::new_v4();

    let debit = Transaction::transfer_leg(
        "Transfer to Savings",
        500,
        from.id(),
        budget_id,
        transfer_id,
        now,
        now,
    )
    .into_result()
    .unwrap();
    let mismatched_amount = Transaction::transfer_leg(
        "Transfer from Checking",
        400,
        to.id(),
        budget_id,
        transfer_id,
        now,
        now,
    )
    .into_result()
    .unwrap();
    let mismatched_id = Transaction::transfer_leg(
        "Transfer from Checking",
        500,
        to.id(),
        budget_id,
        Uuid::new_v4(),
        now,
        now,
    )
    .into_result()
    .unwrap();
    let matching = Transaction::transfer_leg(
        "Transfer from Checking",
        500,
        to.id(),
        budget_id,
        transfer_id,
        now,
        now,
    )
    .into_result()
    .unwrap();

    assert!(matches!(
        WriteBatch::transfer(from.clone(), to.clone(), debit.clone(), mismatched_amount),
        Err(ApplicationError::InconsistentTransfer(_))
    ));
    assert!(matches!(
        WriteBatch::transfer(from.clone(), to.clone(), debit.clone(), mismatched_id),
        Err(ApplicationError::InconsistentTransfer(_))
    ));

    let batch = WriteBatch::transfer(from, to, debit, matching).unwrap();
    assert_eq!(batch.accounts.len(), 2);
    assert_eq!(batch.transactions.len(), 2);
}
