//! Month totals, category sections and the leftover breakdown.
//!
//! Everything here is recomputed from occurrences on every call.

use std::collections::{BTreeMap, BTreeSet};

use shared::{
    CategoryBreakdown, CategorySection, LeftoverBreakdown, MonthTallies, MonthView, ObligationKind,
    Tally,
};

use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::{BalanceSnapshot, MonthLedger, ObligationInstance, PaymentSource};
use crate::backend::domain::payoff;
use crate::backend::io::rest::mappers::instance_mapper::InstanceMapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    Regular,
    AdHoc,
    CcPayoff,
}

pub fn instance_type(instance: &ObligationInstance) -> InstanceType {
    if instance.is_payoff_bill {
        InstanceType::CcPayoff
    } else if instance.is_adhoc {
        InstanceType::AdHoc
    } else {
        InstanceType::Regular
    }
}

pub fn instance_tally(instance: &ObligationInstance) -> Tally {
    Tally {
        expected: instance.expected_amount(),
        actual: instance.actual_amount(),
    }
}

fn add_to_breakdown(breakdown: &mut CategoryBreakdown, instance: &ObligationInstance) {
    let tally = instance_tally(instance);
    match instance_type(instance) {
        InstanceType::Regular => breakdown.regular += tally,
        InstanceType::AdHoc => breakdown.adhoc += tally,
        InstanceType::CcPayoff => breakdown.cc_payoff += tally,
    }
}

/// Instances of one kind grouped by category, categories in id order
pub fn category_sections(ledger: &MonthLedger, kind: ObligationKind) -> Vec<CategorySection> {
    let mut sections: BTreeMap<&str, CategorySection> = BTreeMap::new();
    for instance in ledger.instances.iter().filter(|i| i.kind == kind) {
        let section = sections
            .entry(instance.category_id.as_str())
            .or_insert_with(|| CategorySection {
                category_id: instance.category_id.clone(),
                kind,
                instances: Vec::new(),
                subtotal: Tally::default(),
                breakdown: CategoryBreakdown::default(),
            });
        section.subtotal += instance_tally(instance);
        add_to_breakdown(&mut section.breakdown, instance);
        section.instances.push(InstanceMapper::to_dto(instance));
    }
    sections.into_values().collect()
}

pub fn month_tallies(ledger: &MonthLedger) -> MonthTallies {
    let mut tallies = MonthTallies::default();
    for instance in &ledger.instances {
        let tally = instance_tally(instance);
        match (instance.kind, instance_type(instance)) {
            (ObligationKind::Bill, InstanceType::Regular) => tallies.bills += tally,
            (ObligationKind::Bill, InstanceType::AdHoc) => tallies.adhoc_bills += tally,
            (ObligationKind::Bill, InstanceType::CcPayoff) => tallies.cc_payoffs += tally,
            (ObligationKind::Income, InstanceType::AdHoc) => tallies.adhoc_income += tally,
            (ObligationKind::Income, _) => tallies.income += tally,
        }
    }
    tallies.total_expenses = tallies.bills + tallies.adhoc_bills + tallies.cc_payoffs;
    tallies.total_income = tallies.income + tallies.adhoc_income;
    tallies
}

/// Which bank balances a month needs and how many of them are on record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCoverage {
    pub bank_balances: i64,
    /// Participating sources without a snapshot, sorted
    pub missing: Vec<String>,
}

impl BalanceCoverage {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn error_message(&self) -> Option<String> {
        if self.is_valid() {
            None
        } else {
            Some(DomainError::MissingBalances(self.missing.clone()).to_string())
        }
    }
}

fn is_credit_card(sources: &[PaymentSource], source_id: &str) -> bool {
    sources
        .iter()
        .any(|s| s.id == source_id && s.is_credit_card())
}

/// Non-credit-card sources referenced by the month's instances or occurrence
/// overrides. Ids that match no known source still participate.
pub fn participating_sources(ledger: &MonthLedger, sources: &[PaymentSource]) -> BTreeSet<String> {
    let mut participating = BTreeSet::new();
    for instance in &ledger.instances {
        participating.insert(instance.payment_source_id.as_str());
        for occurrence in &instance.occurrences {
            participating.insert(instance.source_for(occurrence));
        }
    }
    participating
        .into_iter()
        .filter(|id| !is_credit_card(sources, id))
        .map(str::to_string)
        .collect()
}

pub fn balance_coverage(
    ledger: &MonthLedger,
    sources: &[PaymentSource],
    snapshots: &[BalanceSnapshot],
) -> BalanceCoverage {
    let month_snapshots: Vec<&BalanceSnapshot> = snapshots
        .iter()
        .filter(|s| s.month == ledger.month)
        .collect();

    let bank_balances = month_snapshots
        .iter()
        .filter(|s| !is_credit_card(sources, &s.payment_source_id))
        .map(|s| s.balance)
        .sum();
    let missing = participating_sources(ledger, sources)
        .into_iter()
        .filter(|id| !month_snapshots.iter().any(|s| &s.payment_source_id == id))
        .collect();

    BalanceCoverage {
        bank_balances,
        missing,
    }
}

pub fn leftover(
    ledger: &MonthLedger,
    sources: &[PaymentSource],
    snapshots: &[BalanceSnapshot],
) -> LeftoverBreakdown {
    let coverage = balance_coverage(ledger, sources, snapshots);
    let remaining_of = |kind: ObligationKind| -> i64 {
        ledger
            .instances
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.remaining())
            .sum()
    };
    let remaining_income = remaining_of(ObligationKind::Income);
    let remaining_expenses = remaining_of(ObligationKind::Bill);

    LeftoverBreakdown {
        bank_balances: coverage.bank_balances,
        remaining_income,
        remaining_expenses,
        leftover: coverage
            .is_valid()
            .then(|| coverage.bank_balances + remaining_income - remaining_expenses),
        is_valid: coverage.is_valid(),
        error_message: coverage.error_message(),
        missing_balances: coverage.missing,
    }
}

pub fn month_view(
    ledger: &MonthLedger,
    sources: &[PaymentSource],
    snapshots: &[BalanceSnapshot],
) -> MonthView {
    MonthView {
        month: ledger.month.to_string(),
        bill_sections: category_sections(ledger, ObligationKind::Bill),
        income_sections: category_sections(ledger, ObligationKind::Income),
        tallies: month_tallies(ledger),
        leftover: leftover(ledger, sources, snapshots),
        payoff_summaries: payoff::summaries(ledger, sources),
    }
}
