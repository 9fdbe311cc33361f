use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::month::MonthKey;

/// Balance of one payment source as recorded for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub month: MonthKey,
    pub payment_source_id: String,
    pub balance: i64,
    pub recorded_on: NaiveDate,
}
