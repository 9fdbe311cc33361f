use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::OccurrenceState;
use uuid::Uuid;

/// A payment (bill) or receipt (income) recorded against an occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub amount: i64,
    pub date: NaiveDate,
}

impl Payment {
    pub fn new(amount: i64, date: NaiveDate) -> Self {
        Self {
            id: format!("payment::{}", Uuid::new_v4()),
            amount,
            date,
        }
    }
}

/// One dated expected payment or receipt inside an obligation instance.
///
/// An occurrence is either open or closed. Closing realizes its full expected
/// amount; payments recorded while open are progress only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    /// 1-based order within the instance
    pub sequence: u32,
    pub expected_date: NaiveDate,
    pub expected_amount: i64,
    pub is_closed: bool,
    #[serde(default)]
    pub closed_date: Option<NaiveDate>,
    pub is_adhoc: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_source_id: Option<String>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Occurrence {
    pub fn generate_id() -> String {
        format!("occurrence::{}", Uuid::new_v4())
    }

    /// Open occurrence produced by a schedule
    pub fn scheduled(sequence: u32, expected_date: NaiveDate, expected_amount: i64) -> Self {
        Self {
            id: Self::generate_id(),
            sequence,
            expected_date,
            expected_amount,
            is_closed: false,
            closed_date: None,
            is_adhoc: false,
            notes: None,
            payment_source_id: None,
            payments: Vec::new(),
        }
    }

    /// Open occurrence added by hand
    pub fn adhoc(sequence: u32, expected_date: NaiveDate, expected_amount: i64) -> Self {
        Self {
            is_adhoc: true,
            ..Self::scheduled(sequence, expected_date, expected_amount)
        }
    }

    pub fn paid_to_date(&self) -> i64 {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Amount this occurrence contributes to its instance's actual total
    pub fn actual_amount(&self) -> i64 {
        if self.is_closed {
            self.expected_amount
        } else {
            0
        }
    }

    pub fn state(&self) -> OccurrenceState {
        if self.is_closed {
            OccurrenceState::Closed
        } else if self.paid_to_date() > 0 {
            OccurrenceState::PartiallyPaid
        } else {
            OccurrenceState::Open
        }
    }

    /// Date the occurrence lands on the ledger: closed date once settled
    pub fn ledger_date(&self) -> NaiveDate {
        match (self.is_closed, self.closed_date) {
            (true, Some(date)) => date,
            _ => self.expected_date,
        }
    }

    pub fn close(&mut self, date: NaiveDate) {
        self.is_closed = true;
        self.closed_date = Some(date);
    }

    pub fn reopen(&mut self) {
        self.is_closed = false;
        self.closed_date = None;
    }
}
