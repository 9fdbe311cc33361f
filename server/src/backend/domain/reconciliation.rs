//! Occurrence state machine.
//!
//! Every function here validates against a `MonthLedger` and mutates it in
//! place. Nothing touches storage; `ReconciliationService` loads the ledger,
//! applies one of these under the month lock and persists the result.
//!
//! Payoff-bill instances are managed by the payoff synchronizer only, so every
//! operation here refuses them.

use chrono::NaiveDate;

use crate::backend::domain::commands::reconciliation::{
    AddOccurrenceCommand, CreateAdHocCommand, DeleteOccurrenceOutcome, InstanceTarget,
    OccurrenceTarget, PromoteAdHocCommand, UpdateOccurrenceCommand,
};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{
    MonthKey, MonthLedger, ObligationInstance, Occurrence, Payment, RecurringDefinition,
};

/// Close and payment dates must fall inside the month and not after today
pub(crate) fn validate_settlement_date(
    month: MonthKey,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), DomainError> {
    if !month.contains(date) {
        return Err(DomainError::InvalidDate {
            date,
            reason: format!("must fall within {}", month),
        });
    }
    if date > today {
        return Err(DomainError::InvalidDate {
            date,
            reason: "cannot be in the future".to_string(),
        });
    }
    Ok(())
}

/// Today clamped into the month
pub fn default_settlement_date(month: MonthKey, today: NaiveDate) -> NaiveDate {
    month.clamp_date(today)
}

fn instance_mut<'a>(
    ledger: &'a mut MonthLedger,
    target: &InstanceTarget,
) -> Result<&'a mut ObligationInstance, DomainError> {
    let instance = ledger
        .instance_mut(&target.instance_id)
        .ok_or_else(|| DomainError::InstanceNotFound(target.instance_id.clone()))?;
    if instance.kind != target.kind {
        return Err(DomainError::KindMismatch {
            id: target.instance_id.clone(),
            expected: target.kind,
        });
    }
    Ok(instance)
}

fn editable_instance_mut<'a>(
    ledger: &'a mut MonthLedger,
    target: &InstanceTarget,
) -> Result<&'a mut ObligationInstance, DomainError> {
    let instance = instance_mut(ledger, target)?;
    if instance.is_payoff_bill {
        return Err(DomainError::NotEditable(format!(
            "'{}' is a payoff bill and only changes through payoff payments",
            instance.name
        )));
    }
    Ok(instance)
}

fn occurrence_in<'a>(
    instance: &'a mut ObligationInstance,
    occurrence_id: &str,
) -> Result<&'a mut Occurrence, DomainError> {
    instance
        .occurrence_mut(occurrence_id)
        .ok_or_else(|| DomainError::OccurrenceNotFound(occurrence_id.to_string()))
}

fn open_occurrence_in<'a>(
    instance: &'a mut ObligationInstance,
    occurrence_id: &str,
) -> Result<&'a mut Occurrence, DomainError> {
    let occurrence = occurrence_in(instance, occurrence_id)?;
    if occurrence.is_closed {
        return Err(DomainError::AlreadyClosed(occurrence_id.to_string()));
    }
    Ok(occurrence)
}

fn require_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::invalid_amount(amount, "must be greater than zero"));
    }
    Ok(())
}

fn require_in_month(month: MonthKey, date: NaiveDate) -> Result<(), DomainError> {
    if !month.contains(date) {
        return Err(DomainError::OutOfMonth { date, month });
    }
    Ok(())
}

fn require_day_of_month(due_day: Option<u32>) -> Result<(), DomainError> {
    match due_day {
        Some(day) if !(1..=31).contains(&day) => Err(DomainError::InvalidDayOfMonth(day)),
        _ => Ok(()),
    }
}

pub fn record_payment(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
    amount: i64,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Payment, DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let occurrence = open_occurrence_in(instance, &target.occurrence_id)?;
    require_positive(amount)?;
    let date = date.unwrap_or_else(|| default_settlement_date(month, today));
    validate_settlement_date(month, date, today)?;

    let payment = Payment::new(amount, date);
    occurrence.payments.push(payment.clone());
    Ok(payment)
}

/// First half of PayFull: pay whatever is still outstanding.
/// Returns `None` when payments already cover the expected amount.
pub fn record_outstanding_payment(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Option<Payment>, DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let occurrence = open_occurrence_in(instance, &target.occurrence_id)?;
    validate_settlement_date(month, date, today)?;

    let outstanding = occurrence.expected_amount - occurrence.paid_to_date();
    if outstanding <= 0 {
        return Ok(None);
    }
    let payment = Payment::new(outstanding, date);
    occurrence.payments.push(payment.clone());
    Ok(Some(payment))
}

pub fn close_occurrence(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
    closed_date: NaiveDate,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<(), DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let occurrence = open_occurrence_in(instance, &target.occurrence_id)?;
    validate_settlement_date(month, closed_date, today)?;

    occurrence.close(closed_date);
    if notes.is_some() {
        occurrence.notes = notes;
    }
    Ok(())
}

pub fn reopen_occurrence(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
) -> Result<(), DomainError> {
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let occurrence = occurrence_in(instance, &target.occurrence_id)?;
    if !occurrence.is_closed {
        return Err(DomainError::NotClosed(target.occurrence_id.clone()));
    }
    occurrence.reopen();
    Ok(())
}

/// Close part of an occurrence and carry the rest in a new open sibling.
/// Returns the sibling's id.
pub fn split_occurrence(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
    paid_amount: i64,
    closed_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<String, DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let sibling_is_adhoc = !instance.is_adhoc;
    let occurrence = open_occurrence_in(instance, &target.occurrence_id)?;

    let original = occurrence.expected_amount;
    if paid_amount <= 0 || paid_amount >= original {
        return Err(DomainError::invalid_amount(
            paid_amount,
            format!("must be between 0 and {} exclusive", original),
        ));
    }
    let closed_date = closed_date.unwrap_or_else(|| default_settlement_date(month, today));
    validate_settlement_date(month, closed_date, today)?;

    occurrence.expected_amount = paid_amount;
    occurrence.close(closed_date);
    let sequence = occurrence.sequence;
    let expected_date = occurrence.expected_date;
    let payment_source_id = occurrence.payment_source_id.clone();

    for later in instance.occurrences.iter_mut().filter(|o| o.sequence > sequence) {
        later.sequence += 1;
    }
    let mut sibling = Occurrence::scheduled(sequence + 1, expected_date, original - paid_amount);
    sibling.is_adhoc = sibling_is_adhoc;
    sibling.payment_source_id = payment_source_id;
    let sibling_id = sibling.id.clone();
    instance.occurrences.push(sibling);
    instance.sort_occurrences();
    Ok(sibling_id)
}

pub fn add_occurrence(
    ledger: &mut MonthLedger,
    target: &InstanceTarget,
    command: &AddOccurrenceCommand,
) -> Result<String, DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, target)?;
    require_in_month(month, command.expected_date)?;
    require_positive(command.expected_amount)?;

    let mut occurrence = Occurrence::adhoc(
        instance.next_sequence(),
        command.expected_date,
        command.expected_amount,
    );
    occurrence.notes = command.notes.clone();
    let occurrence_id = occurrence.id.clone();
    instance.occurrences.push(occurrence);
    Ok(occurrence_id)
}

pub fn update_occurrence(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
    command: &UpdateOccurrenceCommand,
) -> Result<(), DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, &target.instance())?;
    let occurrence = occurrence_in(instance, &target.occurrence_id)?;

    let edits_schedule = command.expected_amount.is_some() || command.expected_date.is_some();
    if edits_schedule && occurrence.is_closed {
        return Err(DomainError::OccurrenceClosed(target.occurrence_id.clone()));
    }
    if let Some(amount) = command.expected_amount {
        require_positive(amount)?;
    }
    if let Some(date) = command.expected_date {
        require_in_month(month, date)?;
    }

    if let Some(amount) = command.expected_amount {
        occurrence.expected_amount = amount;
    }
    if let Some(date) = command.expected_date {
        occurrence.expected_date = date;
    }
    if command.notes.is_some() {
        occurrence.notes = command.notes.clone();
    }
    Ok(())
}

pub fn delete_occurrence(
    ledger: &mut MonthLedger,
    target: &OccurrenceTarget,
) -> Result<DeleteOccurrenceOutcome, DomainError> {
    let instance = instance_mut(ledger, &target.instance())?;
    if instance.is_payoff_bill {
        return Err(DomainError::NotDeletable(format!(
            "'{}' is a payoff bill and its occurrences cannot be deleted",
            instance.name
        )));
    }
    let occurrence = occurrence_in(instance, &target.occurrence_id)?;
    if !occurrence.is_adhoc {
        return Err(DomainError::NotDeletable(format!(
            "occurrence {} was generated by a schedule and cannot be deleted",
            target.occurrence_id
        )));
    }
    if occurrence.is_closed {
        return Err(DomainError::AlreadyClosed(target.occurrence_id.clone()));
    }

    instance.occurrences.retain(|o| o.id != target.occurrence_id);
    let instance_removed = instance.is_adhoc && instance.occurrences.is_empty();
    if instance_removed {
        ledger.instances.retain(|i| i.id != target.instance_id);
    }
    Ok(DeleteOccurrenceOutcome {
        instance_id: target.instance_id.clone(),
        instance_removed,
    })
}

/// Create a one-off instance holding a single ad-hoc occurrence.
/// Returns the new instance's id.
pub fn create_adhoc(
    ledger: &mut MonthLedger,
    command: &CreateAdHocCommand,
) -> Result<String, DomainError> {
    if command.name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }
    require_in_month(ledger.month, command.expected_date)?;
    require_positive(command.expected_amount)?;

    let mut occurrence = Occurrence::adhoc(1, command.expected_date, command.expected_amount);
    occurrence.notes = command.notes.clone();
    let instance = ObligationInstance {
        id: ObligationInstance::generate_id(),
        definition_id: None,
        name: command.name.trim().to_string(),
        kind: command.kind,
        category_id: command.category_id.clone(),
        payment_source_id: command.payment_source_id.clone(),
        is_adhoc: true,
        is_payoff_bill: false,
        billing_period: shared::BillingPeriod::Monthly,
        occurrences: vec![occurrence],
    };
    let instance_id = instance.id.clone();
    ledger.instances.push(instance);
    Ok(instance_id)
}

/// Build a recurring definition from an ad-hoc instance and link the two.
/// The month's occurrences are left as they are.
pub fn promote_adhoc(
    ledger: &mut MonthLedger,
    target: &InstanceTarget,
    command: &PromoteAdHocCommand,
) -> Result<RecurringDefinition, DomainError> {
    let month = ledger.month;
    let instance = editable_instance_mut(ledger, target)?;
    if instance.definition_id.is_some() {
        return Err(DomainError::AlreadyRecurring(target.instance_id.clone()));
    }
    require_day_of_month(command.due_day)?;

    let anchor_date = instance
        .occurrences
        .iter()
        .map(|o| o.expected_date)
        .min()
        .unwrap_or_else(|| month.first_day());
    let definition = RecurringDefinition {
        id: RecurringDefinition::generate_id(),
        name: instance.name.clone(),
        kind: instance.kind,
        category_id: command
            .category_id
            .clone()
            .unwrap_or_else(|| instance.category_id.clone()),
        payment_source_id: command
            .payment_source_id
            .clone()
            .unwrap_or_else(|| instance.payment_source_id.clone()),
        amount: instance.expected_amount(),
        billing_period: command.billing_period,
        due_day: command.due_day,
        anchor_date,
        is_active: true,
    };
    instance.definition_id = Some(definition.id.clone());
    instance.billing_period = command.billing_period;
    Ok(definition)
}
