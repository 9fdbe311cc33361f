//! Payment sources and their externally fed balances.

use log::info;
use shared::{PaymentSourceListResponse, PaymentSourceView};
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::MonthKey;
use crate::backend::domain::payoff;
use crate::backend::domain::retry::with_read_retry;
use crate::backend::io::rest::mappers::payment_source_mapper::PaymentSourceMapper;
use crate::backend::storage::{Connection, MonthStorage, PaymentSourceStorage};

#[derive(Clone)]
pub struct PaymentSourceService<C: Connection> {
    month_repository: C::MonthRepository,
    payment_source_repository: C::PaymentSourceRepository,
    clock: Arc<dyn Clock>,
    payoff_category_id: String,
}

impl<C: Connection> PaymentSourceService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>, payoff_category_id: String) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
            payment_source_repository: connection.create_payment_source_repository(),
            clock,
            payoff_category_id,
        }
    }

    pub async fn list_payment_sources(&self) -> Result<PaymentSourceListResponse, DomainError> {
        let sources = with_read_retry("list payment sources", || {
            self.payment_source_repository.list_payment_sources()
        })
        .await?;
        Ok(PaymentSourceListResponse {
            payment_sources: sources.into_iter().map(PaymentSourceMapper::to_dto).collect(),
        })
    }

    /// Store a new balance from the external feed. A tracked card also moves
    /// the current month's payoff remainder, if that month exists. Locks the
    /// current month and then the source, the order payoff payments use.
    pub async fn update_balance(
        &self,
        source_id: &str,
        balance: i64,
    ) -> Result<PaymentSourceView, DomainError> {
        let month = MonthKey::of(self.clock.today());
        let _month_guard = self.month_repository.lock_month(month).await;
        let _source_guard = self.payment_source_repository.lock_source(source_id).await;

        let mut source = self
            .payment_source_repository
            .get_payment_source(source_id)
            .await?
            .ok_or_else(|| DomainError::PaymentSourceNotFound(source_id.to_string()))?;
        source.balance = balance;
        self.payment_source_repository.store_payment_source(&source).await?;
        info!("Balance of {} set to {}", source.id, balance);

        if source.track_payoff {
            if let Some(mut ledger) = self.month_repository.load_month(month).await? {
                let sources = self.payment_source_repository.list_payment_sources().await?;
                payoff::sync_ledger(&mut ledger, &sources, &self.payoff_category_id);
                self.month_repository.store_month(&ledger).await?;
                info!("Resynced payoff bill for {} in {}", source.id, month);
            }
        }

        Ok(PaymentSourceMapper::to_dto(source))
    }
}
