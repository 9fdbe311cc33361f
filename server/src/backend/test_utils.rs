//! Shared fixtures for service and handler tests: a temp-dir backed
//! connection, a pinned clock and a fully built `AppState`.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{BillingPeriod, ObligationKind, PaymentSourceKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::OwnedMutexGuard;

use crate::backend::domain::clock::{Clock, FixedClock};
use crate::backend::domain::models::{
    BalanceSnapshot, MonthKey, MonthLedger, ObligationInstance, Occurrence, PaymentSource,
    RecurringDefinition,
};
use crate::backend::storage::csv::month_repository::MonthRepository;
use crate::backend::storage::csv::CsvConnection;
use crate::backend::storage::{
    BalanceStorage, Connection, DefinitionStorage, MonthStorage, PaymentSourceStorage,
};
use crate::backend::{build_state, AppState};

pub const PAYOFF_CATEGORY: &str = "credit-card-payoff";

pub fn june() -> MonthKey {
    MonthKey::new(2025, 6).unwrap()
}

/// A day in June 2025
pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

/// Non-ad-hoc bill paid from "checking" with one open occurrence
pub fn regular_bill(name: &str, amount: i64, expected_date: NaiveDate) -> ObligationInstance {
    ObligationInstance {
        id: ObligationInstance::generate_id(),
        definition_id: None,
        name: name.to_string(),
        kind: ObligationKind::Bill,
        category_id: "utilities".to_string(),
        payment_source_id: "checking".to_string(),
        is_adhoc: false,
        is_payoff_bill: false,
        billing_period: BillingPeriod::Monthly,
        occurrences: vec![Occurrence::scheduled(1, expected_date, amount)],
    }
}

pub fn bank_account(id: &str) -> PaymentSource {
    PaymentSource {
        id: id.to_string(),
        name: id.to_string(),
        kind: PaymentSourceKind::BankAccount,
        balance: 0,
        track_payoff: false,
        payoff_due_day: None,
    }
}

/// Tracked card due on the 25th
pub fn credit_card(id: &str, balance: i64) -> PaymentSource {
    PaymentSource {
        id: id.to_string(),
        name: id.to_string(),
        kind: PaymentSourceKind::CreditCard,
        balance,
        track_payoff: true,
        payoff_due_day: Some(25),
    }
}

pub fn monthly_definition(name: &str, amount: i64, due_day: u32) -> RecurringDefinition {
    RecurringDefinition {
        id: RecurringDefinition::generate_id(),
        name: name.to_string(),
        kind: ObligationKind::Bill,
        category_id: "housing".to_string(),
        payment_source_id: "checking".to_string(),
        amount,
        billing_period: BillingPeriod::Monthly,
        due_day: Some(due_day),
        anchor_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        is_active: true,
    }
}

pub fn snapshot(payment_source_id: &str, balance: i64) -> BalanceSnapshot {
    BalanceSnapshot {
        month: june(),
        payment_source_id: payment_source_id.to_string(),
        balance,
        recorded_on: date(1),
    }
}

pub struct TestBackend {
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub clock: Arc<dyn Clock>,
    pub state: AppState,
}

impl TestBackend {
    pub async fn new(today: NaiveDate) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(today));
        let state = build_state(
            Arc::new(connection.clone()),
            clock.clone(),
            PAYOFF_CATEGORY.to_string(),
        );
        Self {
            _temp_dir: temp_dir,
            connection,
            clock,
            state,
        }
    }

    /// Add an instance to the month of its first occurrence. Returns the
    /// instance id and the first occurrence id.
    pub async fn store_instance(&self, instance: ObligationInstance) -> (String, String) {
        let month = MonthKey::of(instance.occurrences[0].expected_date);
        let repository = self.connection.create_month_repository();
        let mut ledger = repository
            .load_month(month)
            .await
            .unwrap()
            .unwrap_or_else(|| MonthLedger::new(month));
        let ids = (instance.id.clone(), instance.occurrences[0].id.clone());
        ledger.instances.push(instance);
        repository.store_month(&ledger).await.unwrap();
        ids
    }

    pub async fn seed_payment_source(&self, source: PaymentSource) {
        self.connection
            .create_payment_source_repository()
            .store_payment_source(&source)
            .await
            .unwrap();
    }

    pub async fn seed_definition(&self, definition: RecurringDefinition) {
        self.connection
            .create_definition_repository()
            .store_definition(&definition)
            .await
            .unwrap();
    }

    pub async fn seed_snapshots(&self, snapshots: Vec<BalanceSnapshot>) {
        self.connection
            .create_balance_repository()
            .upsert_snapshots(&snapshots)
            .await
            .unwrap();
    }

    pub async fn try_load_ledger(&self, month: MonthKey) -> Option<MonthLedger> {
        self.connection
            .create_month_repository()
            .load_month(month)
            .await
            .unwrap()
    }

    pub async fn load_ledger(&self, month: MonthKey) -> MonthLedger {
        self.try_load_ledger(month).await.unwrap()
    }

    pub async fn payment_source(&self, source_id: &str) -> PaymentSource {
        self.connection
            .create_payment_source_repository()
            .get_payment_source(source_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn definitions(&self) -> Vec<RecurringDefinition> {
        self.connection
            .create_definition_repository()
            .list_definitions()
            .await
            .unwrap()
    }
}

#[derive(Clone)]
pub struct FailingMonthRepository {
    inner: MonthRepository,
    writes: Arc<AtomicUsize>,
    fail_from: usize,
}

#[async_trait]
impl MonthStorage for FailingMonthRepository {
    async fn load_month(&self, month: MonthKey) -> anyhow::Result<Option<MonthLedger>> {
        self.inner.load_month(month).await
    }

    async fn store_month(&self, ledger: &MonthLedger) -> anyhow::Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.fail_from {
            return Err(anyhow!("disk full"));
        }
        self.inner.store_month(ledger).await
    }

    async fn lock_month(&self, month: MonthKey) -> OwnedMutexGuard<()> {
        self.inner.lock_month(month).await
    }
}

/// Connection over the same files whose month writes start failing after
/// `fail_from` successful writes
#[derive(Clone)]
pub struct FailingConnection {
    inner: CsvConnection,
    writes: Arc<AtomicUsize>,
    fail_from: usize,
}

impl FailingConnection {
    pub fn month_writes_fail_from(inner: &CsvConnection, fail_from: usize) -> Self {
        Self {
            inner: inner.clone(),
            writes: Arc::new(AtomicUsize::new(0)),
            fail_from,
        }
    }
}

impl Connection for FailingConnection {
    type MonthRepository = FailingMonthRepository;
    type BalanceRepository = <CsvConnection as Connection>::BalanceRepository;
    type PaymentSourceRepository = <CsvConnection as Connection>::PaymentSourceRepository;
    type DefinitionRepository = <CsvConnection as Connection>::DefinitionRepository;

    fn create_month_repository(&self) -> Self::MonthRepository {
        FailingMonthRepository {
            inner: self.inner.create_month_repository(),
            writes: self.writes.clone(),
            fail_from: self.fail_from,
        }
    }

    fn create_balance_repository(&self) -> Self::BalanceRepository {
        self.inner.create_balance_repository()
    }

    fn create_payment_source_repository(&self) -> Self::PaymentSourceRepository {
        self.inner.create_payment_source_repository()
    }

    fn create_definition_repository(&self) -> Self::DefinitionRepository {
        self.inner.create_definition_repository()
    }
}
