//! Applies reconciliation operations to stored month ledgers.
//!
//! Every mutation runs under the month lock: load the ledger, apply one pure
//! operation from `reconciliation`, persist atomically. Requests carrying a
//! `request_id` that was already applied return the current state instead of
//! applying twice.

use chrono::NaiveDate;
use log::{info, warn};
use shared::{DeleteOccurrenceResponse, InstanceView, MakeRegularResponse};
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::reconciliation::{
    AddOccurrenceCommand, CloseOccurrenceCommand, CreateAdHocCommand, InstanceTarget,
    OccurrenceTarget, PromoteAdHocCommand, RecordPaymentCommand, SplitOccurrenceCommand,
    UpdateOccurrenceCommand,
};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{MonthKey, MonthLedger};
use crate::backend::domain::reconciliation;
use crate::backend::io::rest::mappers::definition_mapper::DefinitionMapper;
use crate::backend::io::rest::mappers::instance_mapper::InstanceMapper;
use crate::backend::storage::{Connection, DefinitionStorage, MonthStorage};

#[derive(Clone)]
pub struct ReconciliationService<C: Connection> {
    month_repository: C::MonthRepository,
    definition_repository: C::DefinitionRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> ReconciliationService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
            definition_repository: connection.create_definition_repository(),
            clock,
        }
    }

    async fn load_for_update(&self, month: MonthKey) -> Result<MonthLedger, DomainError> {
        Ok(self
            .month_repository
            .load_month(month)
            .await?
            .unwrap_or_else(|| MonthLedger::new(month)))
    }

    /// Lock, load, apply, persist
    async fn mutate<T, F>(&self, month: MonthKey, apply: F) -> Result<(MonthLedger, T), DomainError>
    where
        F: FnOnce(&mut MonthLedger, NaiveDate) -> Result<T, DomainError> + Send,
        T: Send,
    {
        let _guard = self.month_repository.lock_month(month).await;
        let mut ledger = self.load_for_update(month).await?;
        let result = apply(&mut ledger, self.clock.today())?;
        self.month_repository.store_month(&ledger).await?;
        Ok((ledger, result))
    }

    fn instance_view(ledger: &MonthLedger, instance_id: &str) -> Result<InstanceView, DomainError> {
        ledger
            .instance(instance_id)
            .map(InstanceMapper::to_dto)
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))
    }

    pub async fn add_occurrence(
        &self,
        target: InstanceTarget,
        command: AddOccurrenceCommand,
    ) -> Result<InstanceView, DomainError> {
        let (ledger, occurrence_id) = self
            .mutate(target.month, |ledger, _today| {
                if let Some(existing) = ledger.replayed(command.request_id.as_deref()) {
                    return Ok(existing);
                }
                let occurrence_id = reconciliation::add_occurrence(ledger, &target, &command)?;
                ledger.remember_request(command.request_id.as_deref(), &occurrence_id);
                Ok(occurrence_id)
            })
            .await?;
        info!(
            "Occurrence {} on instance {} in {}",
            occurrence_id, target.instance_id, target.month
        );
        Self::instance_view(&ledger, &target.instance_id)
    }

    pub async fn record_payment(
        &self,
        target: OccurrenceTarget,
        command: RecordPaymentCommand,
    ) -> Result<InstanceView, DomainError> {
        let (ledger, ()) = self
            .mutate(target.month, |ledger, today| {
                if ledger.replayed(command.request_id.as_deref()).is_some() {
                    return Ok(());
                }
                let payment = reconciliation::record_payment(
                    ledger,
                    &target,
                    command.amount,
                    command.date,
                    today,
                )?;
                ledger.remember_request(command.request_id.as_deref(), &payment.id);
                info!(
                    "Recorded payment {} of {} on occurrence {}",
                    payment.id, payment.amount, target.occurrence_id
                );
                Ok(())
            })
            .await?;
        Self::instance_view(&ledger, &target.instance_id)
    }

    /// Pay whatever is outstanding, persist, then close on the same date.
    /// A failure after the payment is stored is reported as
    /// `PayFullIncomplete` and the payment stays.
    pub async fn pay_full(&self, target: OccurrenceTarget) -> Result<InstanceView, DomainError> {
        let _guard = self.month_repository.lock_month(target.month).await;
        let mut ledger = self.load_for_update(target.month).await?;
        let today = self.clock.today();
        let date = reconciliation::default_settlement_date(target.month, today);

        let payment = reconciliation::record_outstanding_payment(&mut ledger, &target, date, today)?;
        if let Some(payment) = &payment {
            self.month_repository.store_month(&ledger).await?;
            info!(
                "Pay-full recorded payment {} of {} on occurrence {}",
                payment.id, payment.amount, target.occurrence_id
            );
        }

        let closed = match reconciliation::close_occurrence(&mut ledger, &target, date, None, today) {
            Ok(()) => self
                .month_repository
                .store_month(&ledger)
                .await
                .map_err(DomainError::Storage),
            Err(e) => Err(e),
        };
        match (closed, payment) {
            (Ok(()), _) => {
                info!("Pay-full closed occurrence {} on {}", target.occurrence_id, date);
                Self::instance_view(&ledger, &target.instance_id)
            }
            (Err(source), Some(payment)) => {
                warn!(
                    "Pay-full on {} stored payment {} but failed to close: {}",
                    target.occurrence_id, payment.id, source
                );
                Err(DomainError::PayFullIncomplete {
                    payment_id: payment.id,
                    source: Box::new(source),
                })
            }
            (Err(source), None) => Err(source),
        }
    }

    pub async fn close_occurrence(
        &self,
        target: OccurrenceTarget,
        command: CloseOccurrenceCommand,
    ) -> Result<InstanceView, DomainError> {
        let (ledger, ()) = self
            .mutate(target.month, |ledger, today| {
                reconciliation::close_occurrence(
                    ledger,
                    &target,
                    command.closed_date,
                    command.notes,
                    today,
                )
            })
            .await?;
        info!("Closed occurrence {} on {}", target.occurrence_id, command.closed_date);
        Self::instance_view(&ledger, &target.instance_id)
    }

    pub async fn reopen_occurrence(&self, target: OccurrenceTarget) -> Result<InstanceView, DomainError> {
        let (ledger, ()) = self
            .mutate(target.month, |ledger, _today| {
                reconciliation::reopen_occurrence(ledger, &target)
            })
            .await?;
        info!("Reopened occurrence {}", target.occurrence_id);
        Self::instance_view(&ledger, &target.instance_id)
    }

    pub async fn split_occurrence(
        &self,
        target: OccurrenceTarget,
        command: SplitOccurrenceCommand,
    ) -> Result<InstanceView, DomainError> {
        let (ledger, sibling_id) = self
            .mutate(target.month, |ledger, today| {
                if let Some(existing) = ledger.replayed(command.request_id.as_deref()) {
                    return Ok(existing);
                }
                let sibling_id = reconciliation::split_occurrence(
                    ledger,
                    &target,
                    command.paid_amount,
                    command.closed_date,
                    today,
                )?;
                ledger.remember_request(command.request_id.as_deref(), &sibling_id);
                Ok(sibling_id)
            })
            .await?;
        info!(
            "Split occurrence {} at {}, remainder in {}",
            target.occurrence_id, command.paid_amount, sibling_id
        );
        Self::instance_view(&ledger, &target.instance_id)
    }

    pub async fn update_occurrence(
        &self,
        target: OccurrenceTarget,
        command: UpdateOccurrenceCommand,
    ) -> Result<InstanceView, DomainError> {
        let (ledger, ()) = self
            .mutate(target.month, |ledger, _today| {
                reconciliation::update_occurrence(ledger, &target, &command)
            })
            .await?;
        info!("Updated occurrence {}", target.occurrence_id);
        Self::instance_view(&ledger, &target.instance_id)
    }

    pub async fn delete_occurrence(
        &self,
        target: OccurrenceTarget,
    ) -> Result<DeleteOccurrenceResponse, DomainError> {
        let (ledger, outcome) = self
            .mutate(target.month, |ledger, _today| {
                reconciliation::delete_occurrence(ledger, &target)
            })
            .await?;
        info!(
            "Deleted occurrence {} (instance removed: {})",
            target.occurrence_id, outcome.instance_removed
        );

        let instance = if outcome.instance_removed {
            None
        } else {
            Some(Self::instance_view(&ledger, &outcome.instance_id)?)
        };
        let success_message = if outcome.instance_removed {
            "Occurrence deleted and its ad-hoc item removed".to_string()
        } else {
            "Occurrence deleted".to_string()
        };
        Ok(DeleteOccurrenceResponse {
            instance,
            instance_removed: outcome.instance_removed,
            success_message,
        })
    }

    pub async fn create_adhoc(&self, command: CreateAdHocCommand) -> Result<InstanceView, DomainError> {
        let month = command.month;
        let (ledger, instance_id) = self
            .mutate(month, |ledger, _today| {
                if let Some(existing) = ledger.replayed(command.request_id.as_deref()) {
                    return Ok(existing);
                }
                let instance_id = reconciliation::create_adhoc(ledger, &command)?;
                ledger.remember_request(command.request_id.as_deref(), &instance_id);
                Ok(instance_id)
            })
            .await?;
        info!("Created ad-hoc instance {} in {}", instance_id, month);
        Self::instance_view(&ledger, &instance_id)
    }

    /// Link an ad-hoc instance to a new recurring definition. The definition
    /// is stored while the month lock is still held.
    pub async fn promote_adhoc(
        &self,
        target: InstanceTarget,
        command: PromoteAdHocCommand,
    ) -> Result<MakeRegularResponse, DomainError> {
        let _guard = self.month_repository.lock_month(target.month).await;
        let mut ledger = self.load_for_update(target.month).await?;

        let replayed = match ledger.replayed(command.request_id.as_deref()) {
            Some(definition_id) => self.definition_repository.get_definition(&definition_id).await?,
            None => None,
        };
        let definition = match replayed {
            Some(definition) => definition,
            None => {
                let definition = reconciliation::promote_adhoc(&mut ledger, &target, &command)?;
                ledger.remember_request(command.request_id.as_deref(), &definition.id);
                self.definition_repository.store_definition(&definition).await?;
                self.month_repository.store_month(&ledger).await?;
                info!(
                    "Promoted instance {} to recurring definition {}",
                    target.instance_id, definition.id
                );
                definition
            }
        };

        Ok(MakeRegularResponse {
            instance: Self::instance_view(&ledger, &target.instance_id)?,
            definition: DefinitionMapper::to_dto(definition),
        })
    }
}
