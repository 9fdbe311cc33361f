use crate::backend::domain::commands::definitions::CreateDefinitionCommand;
use crate::backend::domain::models::RecurringDefinition as DomainDefinition;
use shared::{CreateDefinitionRequest, DefinitionView};

pub struct DefinitionMapper;

impl DefinitionMapper {
    pub fn to_dto(domain: DomainDefinition) -> DefinitionView {
        DefinitionView {
            id: domain.id,
            name: domain.name,
            kind: domain.kind,
            category_id: domain.category_id,
            payment_source_id: domain.payment_source_id,
            amount: domain.amount,
            billing_period: domain.billing_period,
            due_day: domain.due_day,
            anchor_date: domain.anchor_date,
            is_active: domain.is_active,
        }
    }

    pub fn to_command(request: CreateDefinitionRequest) -> CreateDefinitionCommand {
        CreateDefinitionCommand {
            name: request.name,
            kind: request.kind,
            category_id: request.category_id,
            payment_source_id: request.payment_source_id,
            amount: request.amount,
            billing_period: request.billing_period,
            due_day: request.due_day,
            anchor_date: request.anchor_date,
        }
    }
}
