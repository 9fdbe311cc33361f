//! Recurring definitions that drive month generation.

use log::info;
use shared::{DefinitionListResponse, DefinitionView};
use std::sync::Arc;

use crate::backend::domain::commands::definitions::CreateDefinitionCommand;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::RecurringDefinition;
use crate::backend::domain::retry::with_read_retry;
use crate::backend::io::rest::mappers::definition_mapper::DefinitionMapper;
use crate::backend::storage::{Connection, DefinitionStorage};

#[derive(Clone)]
pub struct DefinitionService<C: Connection> {
    definition_repository: C::DefinitionRepository,
}

impl<C: Connection> DefinitionService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            definition_repository: connection.create_definition_repository(),
        }
    }

    pub async fn list_definitions(&self) -> Result<DefinitionListResponse, DomainError> {
        let definitions = with_read_retry("list definitions", || {
            self.definition_repository.list_definitions()
        })
        .await?;
        Ok(DefinitionListResponse {
            definitions: definitions.into_iter().map(DefinitionMapper::to_dto).collect(),
        })
    }

    pub async fn create_definition(
        &self,
        command: CreateDefinitionCommand,
    ) -> Result<DefinitionView, DomainError> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        if command.amount <= 0 {
            return Err(DomainError::invalid_amount(command.amount, "must be greater than zero"));
        }
        if let Some(day) = command.due_day.filter(|d| !(1..=31).contains(d)) {
            return Err(DomainError::InvalidDayOfMonth(day));
        }

        let definition = RecurringDefinition {
            id: RecurringDefinition::generate_id(),
            name: name.to_string(),
            kind: command.kind,
            category_id: command.category_id,
            payment_source_id: command.payment_source_id,
            amount: command.amount,
            billing_period: command.billing_period,
            due_day: command.due_day,
            anchor_date: command.anchor_date,
            is_active: true,
        };
        self.definition_repository.store_definition(&definition).await?;
        info!("Created definition {} ({})", definition.id, definition.name);
        Ok(DefinitionMapper::to_dto(definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{date, TestBackend};
    use shared::{BillingPeriod, ObligationKind};

    fn command(name: &str, amount: i64, due_day: Option<u32>) -> CreateDefinitionCommand {
        CreateDefinitionCommand {
            name: name.to_string(),
            kind: ObligationKind::Income,
            category_id: "salary".to_string(),
            payment_source_id: "checking".to_string(),
            amount,
            billing_period: BillingPeriod::BiWeekly,
            due_day,
            anchor_date: date(6),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let env = TestBackend::new(date(1)).await;
        let service = &env.state.definition_service;

        let created = service
            .create_definition(command("  Paycheck ", 2100_00, None))
            .await
            .unwrap();
        assert_eq!(created.name, "Paycheck");
        assert!(created.is_active);

        let listed = service.list_definitions().await.unwrap();
        assert_eq!(listed.definitions, vec![created]);
    }

    #[tokio::test]
    async fn test_validation() {
        let env = TestBackend::new(date(1)).await;
        let service = &env.state.definition_service;

        assert!(matches!(
            service.create_definition(command(" ", 10_00, None)).await,
            Err(DomainError::EmptyName)
        ));
        assert!(matches!(
            service.create_definition(command("Paycheck", 0, None)).await,
            Err(DomainError::InvalidAmount { .. })
        ));
        assert!(matches!(
            service.create_definition(command("Paycheck", 10_00, Some(32))).await,
            Err(DomainError::InvalidDayOfMonth(32))
        ));
        assert!(env.definitions().await.is_empty());
    }
}
