use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{BillingPeriod, ObligationKind};
use uuid::Uuid;

use super::occurrence::Occurrence;

/// A bill or income for one month. Totals are always derived from the
/// occurrences and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationInstance {
    pub id: String,
    /// Recurring definition this instance was generated from or promoted to
    #[serde(default)]
    pub definition_id: Option<String>,
    pub name: String,
    pub kind: ObligationKind,
    pub category_id: String,
    pub payment_source_id: String,
    pub is_adhoc: bool,
    #[serde(default)]
    pub is_payoff_bill: bool,
    pub billing_period: BillingPeriod,
    pub occurrences: Vec<Occurrence>,
}

impl ObligationInstance {
    pub fn generate_id() -> String {
        format!("instance::{}", Uuid::new_v4())
    }

    pub fn expected_amount(&self) -> i64 {
        self.occurrences.iter().map(|o| o.expected_amount).sum()
    }

    pub fn actual_amount(&self) -> i64 {
        self.occurrences.iter().map(|o| o.actual_amount()).sum()
    }

    pub fn remaining(&self) -> i64 {
        (self.expected_amount() - self.actual_amount()).max(0)
    }

    /// Closed once every occurrence is closed; an empty instance is open
    pub fn is_closed(&self) -> bool {
        !self.occurrences.is_empty() && self.occurrences.iter().all(|o| o.is_closed)
    }

    /// Latest occurrence close date, only while the instance is closed
    pub fn closed_date(&self) -> Option<NaiveDate> {
        if !self.is_closed() {
            return None;
        }
        self.occurrences.iter().filter_map(|o| o.closed_date).max()
    }

    pub fn occurrence(&self, occurrence_id: &str) -> Option<&Occurrence> {
        self.occurrences.iter().find(|o| o.id == occurrence_id)
    }

    pub fn occurrence_mut(&mut self, occurrence_id: &str) -> Option<&mut Occurrence> {
        self.occurrences.iter_mut().find(|o| o.id == occurrence_id)
    }

    pub fn next_sequence(&self) -> u32 {
        self.occurrences.iter().map(|o| o.sequence).max().unwrap_or(0) + 1
    }

    pub fn sort_occurrences(&mut self) {
        self.occurrences.sort_by_key(|o| o.sequence);
    }

    /// Payment source of an occurrence, honouring per-occurrence overrides
    pub fn source_for<'a>(&'a self, occurrence: &'a Occurrence) -> &'a str {
        occurrence
            .payment_source_id
            .as_deref()
            .unwrap_or(&self.payment_source_id)
    }
}
