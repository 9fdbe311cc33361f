//! Credit-card payoff bills.
//!
//! A payoff instance mirrors a tracked card's debt: one closed occurrence per
//! payment made this month plus at most one open remainder equal to what is
//! still owed. Debt is a negative balance.

use chrono::NaiveDate;
use shared::{BillingPeriod, ObligationKind, PayoffSummary};

use crate::backend::domain::commands::payoff::{PayoffOutcome, PayoffPaymentCommand};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{
    MonthKey, MonthLedger, ObligationInstance, Occurrence, Payment, PaymentSource,
};
use crate::backend::domain::reconciliation::{default_settlement_date, validate_settlement_date};

/// Amount owed on a balance; zero when the card is paid off or in credit
pub fn owed(balance: i64) -> i64 {
    (-balance).max(0)
}

/// Sum of payoff payments already made in the month
pub fn paid_so_far(instance: &ObligationInstance) -> i64 {
    instance
        .occurrences
        .iter()
        .filter(|o| o.is_closed)
        .map(|o| o.expected_amount)
        .sum()
}

fn due_date(source: &PaymentSource, month: MonthKey) -> NaiveDate {
    source
        .payoff_due_day
        .map(|day| month.day(day))
        .unwrap_or_else(|| month.last_day())
}

fn new_payoff_instance(source: &PaymentSource, category_id: &str) -> ObligationInstance {
    ObligationInstance {
        id: ObligationInstance::generate_id(),
        definition_id: None,
        name: format!("{} payoff", source.name),
        kind: ObligationKind::Bill,
        category_id: category_id.to_string(),
        payment_source_id: source.id.clone(),
        is_adhoc: false,
        is_payoff_bill: true,
        billing_period: BillingPeriod::Monthly,
        occurrences: Vec::new(),
    }
}

/// Point the open remainder at the current amount owed. A zero remainder is
/// dropped so the instance can close.
pub fn sync_remainder(instance: &mut ObligationInstance, source: &PaymentSource, month: MonthKey) {
    let existing = instance.occurrences.iter().position(|o| !o.is_closed);
    let remainder = existing.map(|index| instance.occurrences.remove(index));
    // any further open rows are stale
    instance.occurrences.retain(|o| o.is_closed);

    let amount = owed(source.balance);
    if amount > 0 {
        let due = due_date(source, month);
        let mut remainder = remainder.unwrap_or_else(|| Occurrence::scheduled(0, due, amount));
        remainder.expected_amount = amount;
        remainder.expected_date = due;
        remainder.sequence = instance.next_sequence();
        instance.occurrences.push(remainder);
    }
    instance.sort_occurrences();
    // payments first, remainder last, numbered without gaps
    for (occurrence, sequence) in instance.occurrences.iter_mut().zip(1u32..) {
        occurrence.sequence = sequence;
    }
}

/// Ensure every tracked source has a payoff instance with an up-to-date
/// remainder. Returns the ids of instances created by this call.
pub fn sync_ledger(
    ledger: &mut MonthLedger,
    sources: &[PaymentSource],
    category_id: &str,
) -> Vec<String> {
    let month = ledger.month;
    let mut created = Vec::new();

    for source in sources.iter().filter(|s| s.track_payoff) {
        let position = ledger
            .instances
            .iter()
            .position(|i| i.is_payoff_bill && i.payment_source_id == source.id);
        let index = match position {
            Some(index) => index,
            None => {
                let instance = new_payoff_instance(source, category_id);
                created.push(instance.id.clone());
                ledger.instances.push(instance);
                ledger.instances.len() - 1
            }
        };
        sync_remainder(&mut ledger.instances[index], source, month);
    }
    created
}

/// Record a payment against a payoff bill and move the card balance.
///
/// The new balance is `balance + amount` unless an override is supplied, in
/// which case the override is stored as-is.
pub fn apply_payment(
    ledger: &mut MonthLedger,
    instance_id: &str,
    source: &mut PaymentSource,
    command: &PayoffPaymentCommand,
    today: NaiveDate,
) -> Result<PayoffOutcome, DomainError> {
    let month = ledger.month;
    let instance = ledger
        .instance_mut(instance_id)
        .filter(|i| i.is_payoff_bill)
        .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;
    if command.amount <= 0 {
        return Err(DomainError::invalid_amount(command.amount, "must be greater than zero"));
    }
    let date = command
        .date
        .unwrap_or_else(|| default_settlement_date(month, today));
    validate_settlement_date(month, date, today)?;

    let mut payment_row = Occurrence::scheduled(instance.next_sequence(), date, command.amount);
    payment_row.payments.push(Payment::new(command.amount, date));
    payment_row.close(date);
    instance.occurrences.push(payment_row);

    let expected_new_balance = source.balance + command.amount;
    source.balance = command.new_balance_override.unwrap_or(expected_new_balance);
    sync_remainder(instance, source, month);

    Ok(PayoffOutcome {
        expected_new_balance,
        updated_balance: source.balance,
        paid_so_far: paid_so_far(instance),
        remaining: owed(source.balance),
    })
}

pub fn summary(instance: &ObligationInstance, balance: i64) -> PayoffSummary {
    PayoffSummary {
        payment_source_id: instance.payment_source_id.clone(),
        balance,
        paid: paid_so_far(instance),
        remaining: owed(balance),
    }
}

/// Summaries for every payoff instance in the ledger. Sources that are no
/// longer known fall back to the open remainder for their balance.
pub fn summaries(ledger: &MonthLedger, sources: &[PaymentSource]) -> Vec<PayoffSummary> {
    ledger
        .instances
        .iter()
        .filter(|i| i.is_payoff_bill)
        .map(|instance| {
            let balance = sources
                .iter()
                .find(|s| s.id == instance.payment_source_id)
                .map(|s| s.balance)
                .unwrap_or_else(|| -(instance.expected_amount() - paid_so_far(instance)));
            summary(instance, balance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PaymentSourceKind;

    fn june() -> MonthKey {
        MonthKey::new(2025, 6).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn card(balance: i64) -> PaymentSource {
        PaymentSource {
            id: "visa".to_string(),
            name: "Visa".to_string(),
            kind: PaymentSourceKind::CreditCard,
            balance,
            track_payoff: true,
            payoff_due_day: Some(25),
        }
    }

    fn payment(amount: i64) -> PayoffPaymentCommand {
        PayoffPaymentCommand {
            amount,
            date: Some(date(10)),
            new_balance_override: None,
            request_id: None,
        }
    }

    #[test]
    fn test_owed() {
        assert_eq!(owed(-500_00), 500_00);
        assert_eq!(owed(0), 0);
        assert_eq!(owed(20_00), 0);
    }

    #[test]
    fn test_payoff_sync_scenario() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-500_00);
        let created = sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        assert_eq!(created.len(), 1);

        let instance = ledger.payoff_instance_for("visa").unwrap();
        assert_eq!(instance.expected_amount(), 500_00);
        assert_eq!(instance.occurrences[0].expected_date, date(25));
        let instance_id = instance.id.clone();

        let outcome = apply_payment(&mut ledger, &instance_id, &mut source, &payment(100_00), date(20))
            .unwrap();
        assert_eq!(outcome.paid_so_far, 100_00);
        assert_eq!(outcome.remaining, 400_00);
        assert_eq!(outcome.updated_balance, -400_00);
        assert_eq!(outcome.expected_new_balance, -400_00);
        assert_eq!(source.balance, -400_00);

        let instance = ledger.instance(&instance_id).unwrap();
        assert_eq!(instance.expected_amount(), 500_00);
        assert_eq!(instance.actual_amount(), 100_00);
        assert_eq!(instance.remaining(), 400_00);
        assert_eq!(instance.occurrences.iter().filter(|o| !o.is_closed).count(), 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut ledger = MonthLedger::new(june());
        let source = card(-120_00);
        sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        let created = sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        assert!(created.is_empty());
        assert_eq!(ledger.instances.len(), 1);
        assert_eq!(ledger.instances[0].occurrences.len(), 1);
    }

    #[test]
    fn test_paying_everything_closes_instance() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-80_00);
        sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        let instance_id = ledger.instances[0].id.clone();

        let outcome = apply_payment(&mut ledger, &instance_id, &mut source, &payment(80_00), date(20))
            .unwrap();
        assert_eq!(outcome.remaining, 0);
        assert!(ledger.instance(&instance_id).unwrap().is_closed());
    }

    #[test]
    fn test_override_diverges_from_arithmetic() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-500_00);
        sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        let instance_id = ledger.instances[0].id.clone();

        let command = PayoffPaymentCommand {
            new_balance_override: Some(-380_00),
            ..payment(100_00)
        };
        let outcome = apply_payment(&mut ledger, &instance_id, &mut source, &command, date(20)).unwrap();
        assert_eq!(outcome.expected_new_balance, -400_00);
        assert_eq!(outcome.updated_balance, -380_00);
        assert_eq!(outcome.remaining, 380_00);
    }

    #[test]
    fn test_payment_validation() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-500_00);
        sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        let instance_id = ledger.instances[0].id.clone();

        let zero = apply_payment(&mut ledger, &instance_id, &mut source, &payment(0), date(20));
        assert!(matches!(zero, Err(DomainError::InvalidAmount { .. })));

        let future = apply_payment(&mut ledger, &instance_id, &mut source, &payment(10_00), date(5));
        assert!(matches!(future, Err(DomainError::InvalidDate { .. })));

        let unknown = apply_payment(&mut ledger, "instance::nope", &mut source, &payment(10_00), date(20));
        assert!(matches!(unknown, Err(DomainError::InstanceNotFound(_))));
        assert_eq!(source.balance, -500_00);
    }

    #[test]
    fn test_untracked_sources_are_ignored() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-500_00);
        source.track_payoff = false;
        assert!(sync_ledger(&mut ledger, &[source], "cc").is_empty());
        assert!(ledger.instances.is_empty());
    }

    #[test]
    fn test_summaries() {
        let mut ledger = MonthLedger::new(june());
        let mut source = card(-300_00);
        sync_ledger(&mut ledger, std::slice::from_ref(&source), "cc");
        let instance_id = ledger.instances[0].id.clone();
        apply_payment(&mut ledger, &instance_id, &mut source, &payment(50_00), date(20)).unwrap();

        let summaries = summaries(&ledger, &[source]);
        assert_eq!(
            summaries,
            vec![PayoffSummary {
                payment_source_id: "visa".to_string(),
                balance: -250_00,
                paid: 50_00,
                remaining: 250_00,
            }]
        );
    }
}
