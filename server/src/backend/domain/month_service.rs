//! Month generation and the read-side month view.

use log::info;
use shared::{GenerateMonthResponse, LeftoverBreakdown, MonthView};
use std::sync::Arc;

use crate::backend::domain::aggregation;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{BalanceSnapshot, MonthKey, MonthLedger, PaymentSource};
use crate::backend::domain::payoff;
use crate::backend::domain::retry::with_read_retry;
use crate::backend::domain::schedule;
use crate::backend::storage::{
    BalanceStorage, Connection, DefinitionStorage, MonthStorage, PaymentSourceStorage,
};

#[derive(Clone)]
pub struct MonthService<C: Connection> {
    month_repository: C::MonthRepository,
    definition_repository: C::DefinitionRepository,
    payment_source_repository: C::PaymentSourceRepository,
    balance_repository: C::BalanceRepository,
    payoff_category_id: String,
}

impl<C: Connection> MonthService<C> {
    pub fn new(connection: Arc<C>, payoff_category_id: String) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
            definition_repository: connection.create_definition_repository(),
            payment_source_repository: connection.create_payment_source_repository(),
            balance_repository: connection.create_balance_repository(),
            payoff_category_id,
        }
    }

    /// Create the month's instances from every active definition that does
    /// not have one yet, then bring payoff bills up to date. Safe to repeat.
    pub async fn generate_month(&self, month: MonthKey) -> Result<GenerateMonthResponse, DomainError> {
        let _guard = self.month_repository.lock_month(month).await;
        let mut ledger = self
            .month_repository
            .load_month(month)
            .await?
            .unwrap_or_else(|| MonthLedger::new(month));
        let definitions = self.definition_repository.list_definitions().await?;
        let sources = self.payment_source_repository.list_payment_sources().await?;

        let mut created_instance_ids = Vec::new();
        for definition in definitions.iter().filter(|d| d.is_active) {
            if ledger.instance_for_definition(&definition.id).is_some() {
                continue;
            }
            if let Some(instance) = schedule::instantiate(definition, month) {
                created_instance_ids.push(instance.id.clone());
                ledger.instances.push(instance);
            }
        }
        created_instance_ids.extend(payoff::sync_ledger(
            &mut ledger,
            &sources,
            &self.payoff_category_id,
        ));
        self.month_repository.store_month(&ledger).await?;

        info!("Generated {}: {} new instances", month, created_instance_ids.len());
        Ok(GenerateMonthResponse {
            month: month.to_string(),
            success_message: format!(
                "Generated {} new items for {}",
                created_instance_ids.len(),
                month
            ),
            created_instance_ids,
        })
    }

    async fn read_inputs(
        &self,
        month: MonthKey,
    ) -> Result<(MonthLedger, Vec<PaymentSource>, Vec<BalanceSnapshot>), DomainError> {
        let ledger = with_read_retry("load month", || self.month_repository.load_month(month))
            .await?
            .unwrap_or_else(|| MonthLedger::new(month));
        let sources = with_read_retry("list payment sources", || {
            self.payment_source_repository.list_payment_sources()
        })
        .await?;
        let snapshots = with_read_retry("list balance snapshots", || {
            self.balance_repository.list_snapshots(month)
        })
        .await?;
        Ok((ledger, sources, snapshots))
    }

    pub async fn month_view(&self, month: MonthKey) -> Result<MonthView, DomainError> {
        let (ledger, sources, snapshots) = self.read_inputs(month).await?;
        Ok(aggregation::month_view(&ledger, &sources, &snapshots))
    }

    pub async fn leftover(&self, month: MonthKey) -> Result<LeftoverBreakdown, DomainError> {
        let (ledger, sources, snapshots) = self.read_inputs(month).await?;
        Ok(aggregation::leftover(&ledger, &sources, &snapshots))
    }
}
