use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an obligation takes money out (bill) or brings it in (income)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    Bill,
    Income,
}

impl ObligationKind {
    /// Path segment used by the REST layer (`bills` / `incomes`)
    pub fn path_segment(&self) -> &'static str {
        match self {
            ObligationKind::Bill => "bills",
            ObligationKind::Income => "incomes",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "bills" => Some(ObligationKind::Bill),
            "incomes" => Some(ObligationKind::Income),
            _ => None,
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::Bill => write!(f, "bill"),
            ObligationKind::Income => write!(f, "income"),
        }
    }
}

/// How often a recurring definition produces occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    BiWeekly,
    Weekly,
    SemiAnnually,
}

/// Kind of account a payment source represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSourceKind {
    BankAccount,
    Cash,
    CreditCard,
}

/// Display state of an occurrence. `PartiallyPaid` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceState {
    Open,
    PartiallyPaid,
    Closed,
}

/// A single payment (or receipt) recorded against an occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Amount in minor currency units
    pub amount: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceView {
    pub id: String,
    pub sequence: u32,
    pub expected_date: NaiveDate,
    pub expected_amount: i64,
    pub is_closed: bool,
    pub closed_date: Option<NaiveDate>,
    pub is_adhoc: bool,
    pub notes: Option<String>,
    /// Override of the instance's payment source for this occurrence only
    pub payment_source_id: Option<String>,
    pub payments: Vec<Payment>,
    /// Sum of recorded payments
    pub paid_to_date: i64,
    pub state: OccurrenceState,
}

/// One bill or income in a month, with totals derived from its occurrences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub id: String,
    pub definition_id: Option<String>,
    pub name: String,
    pub kind: ObligationKind,
    pub category_id: String,
    pub payment_source_id: String,
    pub is_adhoc: bool,
    pub is_payoff_bill: bool,
    pub billing_period: BillingPeriod,
    pub expected_amount: i64,
    /// Total paid (bills) or received (income)
    pub actual_amount: i64,
    pub remaining: i64,
    pub is_closed: bool,
    pub closed_date: Option<NaiveDate>,
    pub occurrences: Vec<OccurrenceView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub expected: i64,
    pub actual: i64,
}

impl Tally {
    pub fn remaining(&self) -> i64 {
        self.expected - self.actual
    }
}

impl std::ops::Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            expected: self.expected + other.expected,
            actual: self.actual + other.actual,
        }
    }
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Tally) {
        *self = *self + other;
    }
}

/// Category subtotal split by instance type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub regular: Tally,
    pub adhoc: Tally,
    pub cc_payoff: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    pub category_id: String,
    pub kind: ObligationKind,
    pub instances: Vec<InstanceView>,
    pub subtotal: Tally,
    pub breakdown: CategoryBreakdown,
}

/// Month-wide expected/actual tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTallies {
    pub bills: Tally,
    pub adhoc_bills: Tally,
    pub cc_payoffs: Tally,
    pub income: Tally,
    pub adhoc_income: Tally,
    pub total_expenses: Tally,
    pub total_income: Tally,
}

/// Projected cash position at the end of the month.
///
/// `leftover` is only present when every participating payment source has a
/// balance snapshot for the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeftoverBreakdown {
    pub bank_balances: i64,
    pub remaining_income: i64,
    pub remaining_expenses: i64,
    pub leftover: Option<i64>,
    pub is_valid: bool,
    pub missing_balances: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSummary {
    pub payment_source_id: String,
    pub balance: i64,
    pub paid: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthView {
    /// Month in `YYYY-MM` form
    pub month: String,
    pub bill_sections: Vec<CategorySection>,
    pub income_sections: Vec<CategorySection>,
    pub tallies: MonthTallies,
    pub leftover: LeftoverBreakdown,
    pub payoff_summaries: Vec<PayoffSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateMonthResponse {
    pub month: String,
    /// Ids of the instances created by this call
    pub created_instance_ids: Vec<String>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOccurrenceRequest {
    pub expected_date: NaiveDate,
    pub expected_amount: i64,
    pub notes: Option<String>,
    /// Client-chosen idempotency key; a resend returns the original result
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: i64,
    /// Defaults to today when omitted
    pub date: Option<NaiveDate>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseOccurrenceRequest {
    pub closed_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitOccurrenceRequest {
    pub paid_amount: i64,
    /// Defaults to today (clamped into the month) when omitted
    pub closed_date: Option<NaiveDate>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOccurrenceRequest {
    pub expected_amount: Option<i64>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOccurrenceResponse {
    /// The parent instance after deletion, absent when it was removed
    pub instance: Option<InstanceView>,
    pub instance_removed: bool,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAdHocRequest {
    pub name: String,
    pub category_id: String,
    pub payment_source_id: String,
    pub expected_date: NaiveDate,
    pub expected_amount: i64,
    pub notes: Option<String>,
    pub request_id: Option<String>,
}

/// Schedule used to promote an ad-hoc instance to a recurring definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeRegularRequest {
    /// Defaults to the instance's category
    pub category_id: Option<String>,
    /// Defaults to the instance's payment source
    pub payment_source_id: Option<String>,
    pub billing_period: BillingPeriod,
    pub due_day: Option<u32>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeRegularResponse {
    pub definition: DefinitionView,
    pub instance: InstanceView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPayRequest {
    pub amount: i64,
    /// Defaults to today when omitted
    pub date: Option<NaiveDate>,
    /// Statement balance to store instead of the arithmetic result
    pub new_balance_override: Option<i64>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPayResponse {
    pub instance: InstanceView,
    pub expected_new_balance: i64,
    pub updated_balance: i64,
    pub paid_so_far: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSummaryResponse {
    pub month: String,
    pub payoff_summaries: Vec<PayoffSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankBalanceEntry {
    pub payment_source_id: String,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBankBalancesRequest {
    pub balances: Vec<BankBalanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshotView {
    pub payment_source_id: String,
    pub balance: i64,
    pub recorded_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankBalancesResponse {
    pub month: String,
    pub balances: Vec<BalanceSnapshotView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionEventKind {
    Income,
    Expense,
    Overdue,
    RunRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionEvent {
    pub name: String,
    pub instance_id: Option<String>,
    pub occurrence_id: Option<String>,
    pub amount: i64,
    pub kind: ProjectionEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedDay {
    pub date: NaiveDate,
    pub income: i64,
    pub expense: i64,
    /// `None` for days the engine has no balance for
    pub balance: Option<i64>,
    pub is_deficit: bool,
    pub events: Vec<ProjectionEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueBill {
    pub instance_id: String,
    pub occurrence_id: String,
    pub name: String,
    pub expected_date: NaiveDate,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProjection {
    pub month: String,
    pub starting_balance: Option<i64>,
    pub run_rate: i64,
    /// First day the projection carries a balance for
    pub window_start: NaiveDate,
    pub days: Vec<ProjectedDay>,
    pub overdue_bills: Vec<OverdueBill>,
    pub overdue_total: i64,
    pub lowest_balance: Option<i64>,
    pub is_valid: bool,
    pub missing_balances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSourceView {
    pub id: String,
    pub name: String,
    pub kind: PaymentSourceKind,
    pub balance: i64,
    pub track_payoff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSourceListResponse {
    pub payment_sources: Vec<PaymentSourceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePaymentSourceBalanceRequest {
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionView {
    pub id: String,
    pub name: String,
    pub kind: ObligationKind,
    pub category_id: String,
    pub payment_source_id: String,
    pub amount: i64,
    pub billing_period: BillingPeriod,
    pub due_day: Option<u32>,
    pub anchor_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionListResponse {
    pub definitions: Vec<DefinitionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDefinitionRequest {
    pub name: String,
    pub kind: ObligationKind,
    pub category_id: String,
    pub payment_source_id: String,
    pub amount: i64,
    pub billing_period: BillingPeriod,
    pub due_day: Option<u32>,
    pub anchor_date: NaiveDate,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}
