use serde::{Deserialize, Serialize};
use shared::PaymentSourceKind;

/// An account money moves through. Credit card debt is a negative balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: String,
    pub name: String,
    pub kind: PaymentSourceKind,
    /// Current balance from the external feed
    #[serde(default)]
    pub balance: i64,
    /// Generate a payoff bill from this source's balance
    #[serde(default)]
    pub track_payoff: bool,
    /// Day of month the payoff bill is due, month end when absent
    #[serde(default)]
    pub payoff_due_day: Option<u32>,
}

impl PaymentSource {
    pub fn is_credit_card(&self) -> bool {
        self.kind == PaymentSourceKind::CreditCard
    }
}
