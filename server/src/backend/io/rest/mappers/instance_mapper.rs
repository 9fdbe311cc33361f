use crate::backend::domain::models::{
    ObligationInstance as DomainInstance, Occurrence as DomainOccurrence, Payment as DomainPayment,
};
use shared::{InstanceView, OccurrenceView, Payment as SharedPayment};

pub struct InstanceMapper;

impl InstanceMapper {
    pub fn to_dto(domain: &DomainInstance) -> InstanceView {
        InstanceView {
            id: domain.id.clone(),
            definition_id: domain.definition_id.clone(),
            name: domain.name.clone(),
            kind: domain.kind,
            category_id: domain.category_id.clone(),
            payment_source_id: domain.payment_source_id.clone(),
            is_adhoc: domain.is_adhoc,
            is_payoff_bill: domain.is_payoff_bill,
            billing_period: domain.billing_period,
            expected_amount: domain.expected_amount(),
            actual_amount: domain.actual_amount(),
            remaining: domain.remaining(),
            is_closed: domain.is_closed(),
            closed_date: domain.closed_date(),
            occurrences: domain.occurrences.iter().map(Self::occurrence_to_dto).collect(),
        }
    }

    pub fn occurrence_to_dto(domain: &DomainOccurrence) -> OccurrenceView {
        OccurrenceView {
            id: domain.id.clone(),
            sequence: domain.sequence,
            expected_date: domain.expected_date,
            expected_amount: domain.expected_amount,
            is_closed: domain.is_closed,
            closed_date: domain.closed_date,
            is_adhoc: domain.is_adhoc,
            notes: domain.notes.clone(),
            payment_source_id: domain.payment_source_id.clone(),
            payments: domain.payments.iter().map(Self::payment_to_dto).collect(),
            paid_to_date: domain.paid_to_date(),
            state: domain.state(),
        }
    }

    fn payment_to_dto(domain: &DomainPayment) -> SharedPayment {
        SharedPayment {
            id: domain.id.clone(),
            amount: domain.amount,
            date: domain.date,
        }
    }
}
