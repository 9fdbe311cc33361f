//! Expands recurring definitions into month instances.

use chrono::{Datelike, Duration, NaiveDate};
use shared::BillingPeriod;

use crate::backend::domain::models::{MonthKey, ObligationInstance, Occurrence, RecurringDefinition};

/// Dates a definition falls on within `month`, in order
pub fn occurrence_dates(definition: &RecurringDefinition, month: MonthKey) -> Vec<NaiveDate> {
    let anchor = definition.anchor_date;
    if anchor > month.last_day() {
        return Vec::new();
    }
    let due_day = definition.due_day.unwrap_or_else(|| anchor.day());

    match definition.billing_period {
        BillingPeriod::Monthly => on_due_day(month, due_day, anchor),
        BillingPeriod::SemiAnnually => {
            if month.months_since(MonthKey::of(anchor)) % 6 == 0 {
                on_due_day(month, due_day, anchor)
            } else {
                Vec::new()
            }
        }
        BillingPeriod::Weekly => stepping(month, anchor, 7),
        BillingPeriod::BiWeekly => stepping(month, anchor, 14),
    }
}

fn on_due_day(month: MonthKey, due_day: u32, anchor: NaiveDate) -> Vec<NaiveDate> {
    let date = month.day(due_day);
    if date < anchor {
        Vec::new()
    } else {
        vec![date]
    }
}

fn stepping(month: MonthKey, anchor: NaiveDate, step_days: i64) -> Vec<NaiveDate> {
    let mut date = anchor;
    if date < month.first_day() {
        let behind = (month.first_day() - anchor).num_days();
        let steps = (behind + step_days - 1) / step_days;
        date = anchor + Duration::days(steps * step_days);
    }

    let mut dates = Vec::new();
    while date <= month.last_day() {
        dates.push(date);
        date += Duration::days(step_days);
    }
    dates
}

/// A fresh instance of `definition` for `month`, or `None` when the schedule
/// has no dates in it
pub fn instantiate(definition: &RecurringDefinition, month: MonthKey) -> Option<ObligationInstance> {
    let dates = occurrence_dates(definition, month);
    if dates.is_empty() {
        return None;
    }
    let occurrences = dates
        .into_iter()
        .zip(1u32..)
        .map(|(date, sequence)| Occurrence::scheduled(sequence, date, definition.amount))
        .collect();

    Some(ObligationInstance {
        id: ObligationInstance::generate_id(),
        definition_id: Some(definition.id.clone()),
        name: definition.name.clone(),
        kind: definition.kind,
        category_id: definition.category_id.clone(),
        payment_source_id: definition.payment_source_id.clone(),
        is_adhoc: false,
        is_payoff_bill: false,
        billing_period: definition.billing_period,
        occurrences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ObligationKind;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn definition(period: BillingPeriod, anchor: NaiveDate, due_day: Option<u32>) -> RecurringDefinition {
        RecurringDefinition {
            id: "definition::test".to_string(),
            name: "Test".to_string(),
            kind: ObligationKind::Bill,
            category_id: "misc".to_string(),
            payment_source_id: "checking".to_string(),
            amount: 25_00,
            billing_period: period,
            due_day,
            anchor_date: anchor,
            is_active: true,
        }
    }

    #[test]
    fn test_monthly_clamps_due_day() {
        let def = definition(BillingPeriod::Monthly, ymd(2025, 1, 31), None);
        let feb = MonthKey::new(2025, 2).unwrap();
        assert_eq!(occurrence_dates(&def, feb), vec![ymd(2025, 2, 28)]);

        let with_due_day = definition(BillingPeriod::Monthly, ymd(2025, 1, 1), Some(15));
        assert_eq!(occurrence_dates(&with_due_day, feb), vec![ymd(2025, 2, 15)]);
    }

    #[test]
    fn test_nothing_before_anchor() {
        let def = definition(BillingPeriod::Monthly, ymd(2025, 6, 1), Some(5));
        assert!(occurrence_dates(&def, MonthKey::new(2025, 5).unwrap()).is_empty());
        assert!(instantiate(&def, MonthKey::new(2025, 5).unwrap()).is_none());
    }

    #[test]
    fn test_weekly_steps_from_anchor() {
        let def = definition(BillingPeriod::Weekly, ymd(2025, 5, 30), None);
        let dates = occurrence_dates(&def, MonthKey::new(2025, 6).unwrap());
        assert_eq!(
            dates,
            vec![ymd(2025, 6, 6), ymd(2025, 6, 13), ymd(2025, 6, 20), ymd(2025, 6, 27)]
        );
    }

    #[test]
    fn test_biweekly_keeps_phase_across_months() {
        let def = definition(BillingPeriod::BiWeekly, ymd(2025, 1, 3), None);
        let dates = occurrence_dates(&def, MonthKey::new(2025, 5).unwrap());
        assert_eq!(dates, vec![ymd(2025, 5, 9), ymd(2025, 5, 23)]);

        let anchor_month = occurrence_dates(&def, MonthKey::new(2025, 1).unwrap());
        assert_eq!(anchor_month, vec![ymd(2025, 1, 3), ymd(2025, 1, 17), ymd(2025, 1, 31)]);
    }

    #[test]
    fn test_semi_annual() {
        let def = definition(BillingPeriod::SemiAnnually, ymd(2025, 3, 10), None);
        assert_eq!(
            occurrence_dates(&def, MonthKey::new(2025, 9).unwrap()),
            vec![ymd(2025, 9, 10)]
        );
        assert!(occurrence_dates(&def, MonthKey::new(2025, 6).unwrap()).is_empty());
        assert_eq!(
            occurrence_dates(&def, MonthKey::new(2026, 3).unwrap()),
            vec![ymd(2026, 3, 10)]
        );
    }

    #[test]
    fn test_instantiate_numbers_occurrences() {
        let def = definition(BillingPeriod::Weekly, ymd(2025, 6, 2), None);
        let instance = instantiate(&def, MonthKey::new(2025, 6).unwrap()).unwrap();
        let sequences: Vec<u32> = instance.occurrences.iter().map(|o| o.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(instance.expected_amount(), 125_00);
        assert_eq!(instance.definition_id.as_deref(), Some("definition::test"));
        assert!(instance.occurrences.iter().all(|o| !o.is_adhoc));
    }
}
