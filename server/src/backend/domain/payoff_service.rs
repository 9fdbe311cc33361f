//! Payoff bills backed by stored month ledgers and payment sources.

use log::{error, info};
use shared::{PayoffPayResponse, PayoffSummaryResponse};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::payoff::PayoffPaymentCommand;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{MonthKey, MonthLedger, PaymentSource};
use crate::backend::domain::payoff;
use crate::backend::domain::retry::with_read_retry;
use crate::backend::io::rest::mappers::instance_mapper::InstanceMapper;
use crate::backend::storage::{Connection, MonthStorage, PaymentSourceStorage};

#[derive(Clone)]
pub struct PayoffService<C: Connection> {
    month_repository: C::MonthRepository,
    payment_source_repository: C::PaymentSourceRepository,
    clock: Arc<dyn Clock>,
    payoff_category_id: String,
}

impl<C: Connection> PayoffService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>, payoff_category_id: String) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
            payment_source_repository: connection.create_payment_source_repository(),
            clock,
            payoff_category_id,
        }
    }

    fn response(month: MonthKey, ledger: &MonthLedger, sources: &[PaymentSource]) -> PayoffSummaryResponse {
        PayoffSummaryResponse {
            month: month.to_string(),
            payoff_summaries: payoff::summaries(ledger, sources),
        }
    }

    pub async fn sync(&self, month: MonthKey) -> Result<PayoffSummaryResponse, DomainError> {
        let _guard = self.month_repository.lock_month(month).await;
        let sources = self.payment_source_repository.list_payment_sources().await?;
        let mut ledger = self
            .month_repository
            .load_month(month)
            .await?
            .unwrap_or_else(|| MonthLedger::new(month));

        let created = payoff::sync_ledger(&mut ledger, &sources, &self.payoff_category_id);
        self.month_repository.store_month(&ledger).await?;
        info!("Synced payoff bills for {} ({} created)", month, created.len());
        Ok(Self::response(month, &ledger, &sources))
    }

    /// Resync a month only when it has already been generated
    pub async fn sync_if_generated(&self, month: MonthKey) -> Result<(), DomainError> {
        let _guard = self.month_repository.lock_month(month).await;
        self.resync_generated(month).await
    }

    /// Caller holds the month lock
    async fn resync_generated(&self, month: MonthKey) -> Result<(), DomainError> {
        let Some(mut ledger) = self.month_repository.load_month(month).await? else {
            return Ok(());
        };
        let sources = self.payment_source_repository.list_payment_sources().await?;
        payoff::sync_ledger(&mut ledger, &sources, &self.payoff_category_id);
        self.month_repository.store_month(&ledger).await?;
        Ok(())
    }

    /// Lock one or two months, earlier month first
    async fn lock_months(&self, first: MonthKey, second: MonthKey) -> Vec<OwnedMutexGuard<()>> {
        let (earlier, later) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        let mut guards = vec![self.month_repository.lock_month(earlier).await];
        if later != earlier {
            guards.push(self.month_repository.lock_month(later).await);
        }
        guards
    }

    pub async fn summaries(&self, month: MonthKey) -> Result<PayoffSummaryResponse, DomainError> {
        let ledger = with_read_retry("load month", || self.month_repository.load_month(month))
            .await?
            .unwrap_or_else(|| MonthLedger::new(month));
        let sources = with_read_retry("list payment sources", || {
            self.payment_source_repository.list_payment_sources()
        })
        .await?;
        Ok(Self::response(month, &ledger, &sources))
    }

    /// Pay toward a payoff bill.
    ///
    /// Holds the bill's month, the current month and the card, in that lock
    /// order. The card balance is written before the ledger; when the ledger
    /// cannot be stored the old balance is put back, so a retry pays again
    /// instead of replaying a payment that never reached the card. Paying an
    /// earlier month also resyncs the current month's remainder.
    pub async fn pay(
        &self,
        month: MonthKey,
        instance_id: &str,
        command: PayoffPaymentCommand,
    ) -> Result<PayoffPayResponse, DomainError> {
        let current = MonthKey::of(self.clock.today());
        let _month_guards = self.lock_months(month, current).await;
        let mut ledger = self
            .month_repository
            .load_month(month)
            .await?
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;
        let source_id = ledger
            .instance(instance_id)
            .filter(|i| i.is_payoff_bill)
            .map(|i| i.payment_source_id.clone())
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;
        let _source_guard = self.payment_source_repository.lock_source(&source_id).await;
        let mut source = self
            .payment_source_repository
            .get_payment_source(&source_id)
            .await?
            .ok_or_else(|| DomainError::PaymentSourceNotFound(source_id.clone()))?;

        if ledger.replayed(command.request_id.as_deref()).is_some() {
            if current != month {
                self.resync_generated(current).await?;
            }
            let instance = ledger
                .instance(instance_id)
                .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;
            return Ok(PayoffPayResponse {
                instance: InstanceMapper::to_dto(instance),
                expected_new_balance: source.balance,
                updated_balance: source.balance,
                paid_so_far: payoff::paid_so_far(instance),
                remaining: payoff::owed(source.balance),
            });
        }

        let previous = source.clone();
        let outcome = payoff::apply_payment(
            &mut ledger,
            instance_id,
            &mut source,
            &command,
            self.clock.today(),
        )?;
        ledger.remember_request(command.request_id.as_deref(), instance_id);

        self.payment_source_repository.store_payment_source(&source).await?;
        if let Err(e) = self.month_repository.store_month(&ledger).await {
            if let Err(restore_error) = self
                .payment_source_repository
                .store_payment_source(&previous)
                .await
            {
                error!(
                    "Could not restore {} balance to {}: {}",
                    previous.id, previous.balance, restore_error
                );
            }
            return Err(DomainError::Storage(e));
        }
        info!(
            "Paid {} toward {} payoff, balance now {}",
            command.amount, source.id, outcome.updated_balance
        );

        if current != month {
            self.resync_generated(current).await?;
            info!("Resynced {} payoff bill in {}", source.id, current);
        }

        let instance = ledger
            .instance(instance_id)
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;
        Ok(PayoffPayResponse {
            instance: InstanceMapper::to_dto(instance),
            expected_new_balance: outcome.expected_new_balance,
            updated_balance: outcome.updated_balance,
            paid_so_far: outcome.paid_so_far,
            remaining: outcome.remaining,
        })
    }
}
