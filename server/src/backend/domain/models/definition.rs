use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{BillingPeriod, ObligationKind};
use uuid::Uuid;

/// Template that produces one instance per month it has dates in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: String,
    pub name: String,
    pub kind: ObligationKind,
    pub category_id: String,
    pub payment_source_id: String,
    /// Amount of every generated occurrence
    pub amount: i64,
    pub billing_period: BillingPeriod,
    /// Day of month for monthly and semi-annual schedules, defaults to the anchor day
    #[serde(default)]
    pub due_day: Option<u32>,
    /// First date of the schedule
    pub anchor_date: NaiveDate,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RecurringDefinition {
    pub fn generate_id() -> String {
        format!("definition::{}", Uuid::new_v4())
    }
}
