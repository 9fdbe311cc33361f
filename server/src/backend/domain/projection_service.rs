//! Loads everything a month forecast needs and runs `forecast::project`.

use log::debug;
use shared::DailyProjection;
use std::sync::Arc;

use crate::backend::domain::aggregation;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::forecast::{self, ForecastInput};
use crate::backend::domain::models::{MonthKey, MonthLedger};
use crate::backend::domain::retry::with_read_retry;
use crate::backend::storage::{BalanceStorage, Connection, MonthStorage, PaymentSourceStorage};

#[derive(Clone)]
pub struct ProjectionService<C: Connection> {
    month_repository: C::MonthRepository,
    payment_source_repository: C::PaymentSourceRepository,
    balance_repository: C::BalanceRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> ProjectionService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
            payment_source_repository: connection.create_payment_source_repository(),
            balance_repository: connection.create_balance_repository(),
            clock,
        }
    }

    async fn load_or_empty(&self, month: MonthKey) -> Result<MonthLedger, DomainError> {
        Ok(with_read_retry("load month", || self.month_repository.load_month(month))
            .await?
            .unwrap_or_else(|| MonthLedger::new(month)))
    }

    /// Project daily balances for `month`. Without an explicit starting
    /// balance the month's bank snapshots are used, and only when every
    /// participating source has one.
    pub async fn project(
        &self,
        month: MonthKey,
        starting_balance: Option<i64>,
        run_rate: i64,
    ) -> Result<DailyProjection, DomainError> {
        if run_rate < 0 {
            return Err(DomainError::InvalidRunRate(run_rate));
        }
        let ledger = self.load_or_empty(month).await?;
        let previous = self.load_or_empty(month.previous()).await?;
        let sources = with_read_retry("list payment sources", || {
            self.payment_source_repository.list_payment_sources()
        })
        .await?;
        let snapshots = with_read_retry("list balance snapshots", || {
            self.balance_repository.list_snapshots(month)
        })
        .await?;

        let coverage = aggregation::balance_coverage(&ledger, &sources, &snapshots);
        let starting_balance = starting_balance
            .or_else(|| coverage.is_valid().then_some(coverage.bank_balances));
        debug!(
            "Projecting {} from {:?} with run rate {}",
            month, starting_balance, run_rate
        );

        let mut projection = forecast::project(&ForecastInput {
            month,
            today: self.clock.today(),
            starting_balance,
            instances: &ledger.instances,
            carried_over: &previous.instances,
            run_rate,
        });
        projection.is_valid = coverage.is_valid();
        projection.missing_balances = coverage.missing;
        Ok(projection)
    }
}
