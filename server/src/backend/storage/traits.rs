//! # Storage Traits
//!
//! Storage abstractions the domain services are written against, so the
//! flat-file backend can be swapped without touching business rules.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::backend::domain::models::{
    BalanceSnapshot, MonthKey, MonthLedger, PaymentSource, RecurringDefinition,
};

/// Per-month ledger documents
#[async_trait]
pub trait MonthStorage: Send + Sync {
    /// Load a month, `None` when nothing was ever stored for it
    async fn load_month(&self, month: MonthKey) -> Result<Option<MonthLedger>>;

    /// Replace the stored month atomically
    async fn store_month(&self, ledger: &MonthLedger) -> Result<()>;

    /// Exclusive lock for a load-modify-store cycle on one month.
    /// Reads do not need it.
    async fn lock_month(&self, month: MonthKey) -> OwnedMutexGuard<()>;
}

/// Bank balance snapshots keyed by (month, payment source)
#[async_trait]
pub trait BalanceStorage: Send + Sync {
    async fn list_snapshots(&self, month: MonthKey) -> Result<Vec<BalanceSnapshot>>;

    /// Insert or replace snapshots, one per (month, payment source)
    async fn upsert_snapshots(&self, snapshots: &[BalanceSnapshot]) -> Result<()>;
}

#[async_trait]
pub trait PaymentSourceStorage: Send + Sync {
    async fn list_payment_sources(&self) -> Result<Vec<PaymentSource>>;

    async fn get_payment_source(&self, source_id: &str) -> Result<Option<PaymentSource>>;

    /// Insert or replace by id
    async fn store_payment_source(&self, source: &PaymentSource) -> Result<()>;

    /// Exclusive lock for a read-modify-write of one source's balance.
    /// Taken after any month locks the caller needs.
    async fn lock_source(&self, source_id: &str) -> OwnedMutexGuard<()>;
}

#[async_trait]
pub trait DefinitionStorage: Send + Sync {
    async fn list_definitions(&self) -> Result<Vec<RecurringDefinition>>;

    async fn get_definition(&self, definition_id: &str) -> Result<Option<RecurringDefinition>>;

    /// Insert or replace by id
    async fn store_definition(&self, definition: &RecurringDefinition) -> Result<()>;
}

/// Factory for the repositories of one storage backend
pub trait Connection: Send + Sync + Clone {
    type MonthRepository: MonthStorage + Clone;
    type BalanceRepository: BalanceStorage + Clone;
    type PaymentSourceRepository: PaymentSourceStorage + Clone;
    type DefinitionRepository: DefinitionStorage + Clone;

    fn create_month_repository(&self) -> Self::MonthRepository;
    fn create_balance_repository(&self) -> Self::BalanceRepository;
    fn create_payment_source_repository(&self) -> Self::PaymentSourceRepository;
    fn create_definition_repository(&self) -> Self::DefinitionRepository;
}
