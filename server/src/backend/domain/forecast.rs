//! Day-by-day balance projection for a month.
//!
//! `project` is pure: the same input always yields the same projection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::{
    DailyProjection, ObligationKind, OverdueBill, ProjectedDay, ProjectionEvent,
    ProjectionEventKind,
};

use crate::backend::domain::models::{MonthKey, ObligationInstance};

pub const RUN_RATE_EVENT: &str = "Daily Run Rate";
pub const OVERDUE_EVENT: &str = "Overdue bills";

pub struct ForecastInput<'a> {
    pub month: MonthKey,
    pub today: NaiveDate,
    pub starting_balance: Option<i64>,
    pub instances: &'a [ObligationInstance],
    /// Previous month's instances, only consulted for overdue bills
    pub carried_over: &'a [ObligationInstance],
    /// Simulated spend per day, never persisted
    pub run_rate: i64,
}

/// First day the projection carries a balance for
pub fn window_start(month: MonthKey, today: NaiveDate) -> NaiveDate {
    if month.contains(today) {
        today
    } else {
        month.first_day()
    }
}

fn overdue_bills<'a>(
    instances: impl Iterator<Item = &'a ObligationInstance>,
    before: NaiveDate,
) -> Vec<OverdueBill> {
    instances
        .filter(|i| i.kind == ObligationKind::Bill)
        .flat_map(|instance| {
            instance
                .occurrences
                .iter()
                .filter(move |o| !o.is_closed && o.expected_date < before)
                .map(move |o| OverdueBill {
                    instance_id: instance.id.clone(),
                    occurrence_id: o.id.clone(),
                    name: instance.name.clone(),
                    expected_date: o.expected_date,
                    amount: o.expected_amount,
                })
        })
        .collect()
}

fn scheduled_events(
    instances: &[ObligationInstance],
    window: (NaiveDate, NaiveDate),
) -> BTreeMap<NaiveDate, Vec<ProjectionEvent>> {
    let mut events: BTreeMap<NaiveDate, Vec<ProjectionEvent>> = BTreeMap::new();
    for instance in instances {
        let kind = match instance.kind {
            ObligationKind::Income => ProjectionEventKind::Income,
            ObligationKind::Bill => ProjectionEventKind::Expense,
        };
        for occurrence in &instance.occurrences {
            let date = occurrence.ledger_date();
            if date < window.0 || date > window.1 {
                continue;
            }
            events.entry(date).or_default().push(ProjectionEvent {
                name: instance.name.clone(),
                instance_id: Some(instance.id.clone()),
                occurrence_id: Some(occurrence.id.clone()),
                amount: occurrence.expected_amount,
                kind,
            });
        }
    }
    events
}

pub fn project(input: &ForecastInput) -> DailyProjection {
    let month = input.month;
    let start = window_start(month, input.today);

    // Last month's payoff remainder is the debt this month's payoff bill carries
    let mut overdue = overdue_bills(
        input.carried_over.iter().filter(|i| !i.is_payoff_bill),
        start,
    );
    overdue.extend(overdue_bills(input.instances.iter(), start));
    let overdue_total: i64 = overdue.iter().map(|b| b.amount).sum();

    let mut scheduled = scheduled_events(input.instances, (start, month.last_day()));
    let mut balance = input.starting_balance;
    let mut lowest_balance: Option<i64> = None;
    let mut days = Vec::with_capacity(month.days_in_month() as usize);

    for date in month.days() {
        if date < start {
            days.push(ProjectedDay {
                date,
                income: 0,
                expense: 0,
                balance: None,
                is_deficit: false,
                events: Vec::new(),
            });
            continue;
        }

        let mut events = scheduled.remove(&date).unwrap_or_default();
        if date == start && overdue_total > 0 {
            events.insert(
                0,
                ProjectionEvent {
                    name: OVERDUE_EVENT.to_string(),
                    instance_id: None,
                    occurrence_id: None,
                    amount: overdue_total,
                    kind: ProjectionEventKind::Overdue,
                },
            );
        }
        if balance.is_some() && input.run_rate > 0 {
            events.push(ProjectionEvent {
                name: RUN_RATE_EVENT.to_string(),
                instance_id: None,
                occurrence_id: None,
                amount: input.run_rate,
                kind: ProjectionEventKind::RunRate,
            });
        }

        let income: i64 = events
            .iter()
            .filter(|e| e.kind == ProjectionEventKind::Income)
            .map(|e| e.amount)
            .sum();
        let expense: i64 = events
            .iter()
            .filter(|e| e.kind != ProjectionEventKind::Income)
            .map(|e| e.amount)
            .sum();

        balance = balance.map(|b| b + income - expense);
        if let Some(b) = balance {
            lowest_balance = Some(lowest_balance.map_or(b, |low| low.min(b)));
        }
        days.push(ProjectedDay {
            date,
            income,
            expense,
            balance,
            is_deficit: balance.map_or(false, |b| b < 0),
            events,
        });
    }

    DailyProjection {
        month: month.to_string(),
        starting_balance: input.starting_balance,
        run_rate: input.run_rate,
        window_start: start,
        days,
        overdue_bills: overdue,
        overdue_total,
        lowest_balance,
        is_valid: true,
        missing_balances: Vec::new(),
    }
}
