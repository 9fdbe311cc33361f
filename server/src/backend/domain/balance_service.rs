//! Bank balance snapshots recorded per month.

use log::info;
use shared::{BankBalanceEntry, BankBalancesResponse};
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{BalanceSnapshot, MonthKey};
use crate::backend::domain::retry::with_read_retry;
use crate::backend::io::rest::mappers::payment_source_mapper::PaymentSourceMapper;
use crate::backend::storage::{BalanceStorage, Connection, PaymentSourceStorage};

#[derive(Clone)]
pub struct BalanceService<C: Connection> {
    balance_repository: C::BalanceRepository,
    payment_source_repository: C::PaymentSourceRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> BalanceService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            balance_repository: connection.create_balance_repository(),
            payment_source_repository: connection.create_payment_source_repository(),
            clock,
        }
    }

    /// Record one snapshot per entry, replacing earlier ones for the same
    /// source and month. Every source must be known.
    pub async fn update_bank_balances(
        &self,
        month: MonthKey,
        entries: Vec<BankBalanceEntry>,
    ) -> Result<BankBalancesResponse, DomainError> {
        let sources = self.payment_source_repository.list_payment_sources().await?;
        if let Some(unknown) = entries
            .iter()
            .find(|e| !sources.iter().any(|s| s.id == e.payment_source_id))
        {
            return Err(DomainError::PaymentSourceNotFound(unknown.payment_source_id.clone()));
        }

        let recorded_on = self.clock.today();
        let snapshots: Vec<BalanceSnapshot> = entries
            .into_iter()
            .map(|entry| BalanceSnapshot {
                month,
                payment_source_id: entry.payment_source_id,
                balance: entry.balance,
                recorded_on,
            })
            .collect();
        self.balance_repository.upsert_snapshots(&snapshots).await?;
        info!("Recorded {} bank balances for {}", snapshots.len(), month);

        self.list_bank_balances(month).await
    }

    pub async fn list_bank_balances(&self, month: MonthKey) -> Result<BankBalancesResponse, DomainError> {
        let snapshots = with_read_retry("list balance snapshots", || {
            self.balance_repository.list_snapshots(month)
        })
        .await?;
        Ok(BankBalancesResponse {
            month: month.to_string(),
            balances: snapshots
                .into_iter()
                .map(PaymentSourceMapper::snapshot_to_dto)
                .collect(),
        })
    }
}
