//! Domain-level command types.
//!
//! These are used by services inside the domain layer and are not exposed over
//! the public API. The REST layer maps the `shared` DTOs onto them.

pub mod reconciliation {
    use chrono::NaiveDate;
    use shared::{BillingPeriod, ObligationKind};

    use crate::backend::domain::models::MonthKey;

    /// Addresses one instance in one month through its kind collection
    #[derive(Debug, Clone, PartialEq)]
    pub struct InstanceTarget {
        pub month: MonthKey,
        pub kind: ObligationKind,
        pub instance_id: String,
    }

    /// Addresses one occurrence through its parent instance
    #[derive(Debug, Clone, PartialEq)]
    pub struct OccurrenceTarget {
        pub month: MonthKey,
        pub kind: ObligationKind,
        pub instance_id: String,
        pub occurrence_id: String,
    }

    impl OccurrenceTarget {
        pub fn instance(&self) -> InstanceTarget {
            InstanceTarget {
                month: self.month,
                kind: self.kind,
                instance_id: self.instance_id.clone(),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct RecordPaymentCommand {
        pub amount: i64,
        pub date: Option<NaiveDate>,
        pub request_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CloseOccurrenceCommand {
        pub closed_date: NaiveDate,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SplitOccurrenceCommand {
        pub paid_amount: i64,
        pub closed_date: Option<NaiveDate>,
        pub request_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct AddOccurrenceCommand {
        pub expected_date: NaiveDate,
        pub expected_amount: i64,
        pub notes: Option<String>,
        pub request_id: Option<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateOccurrenceCommand {
        pub expected_amount: Option<i64>,
        pub expected_date: Option<NaiveDate>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateAdHocCommand {
        pub month: MonthKey,
        pub kind: ObligationKind,
        pub name: String,
        pub category_id: String,
        pub payment_source_id: String,
        pub expected_date: NaiveDate,
        pub expected_amount: i64,
        pub notes: Option<String>,
        pub request_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct PromoteAdHocCommand {
        pub category_id: Option<String>,
        pub payment_source_id: Option<String>,
        pub billing_period: BillingPeriod,
        pub due_day: Option<u32>,
        pub request_id: Option<String>,
    }

    /// What a delete left behind
    #[derive(Debug, Clone, PartialEq)]
    pub struct DeleteOccurrenceOutcome {
        pub instance_id: String,
        pub instance_removed: bool,
    }
}

pub mod payoff {
    use chrono::NaiveDate;

    #[derive(Debug, Clone)]
    pub struct PayoffPaymentCommand {
        pub amount: i64,
        pub date: Option<NaiveDate>,
        pub new_balance_override: Option<i64>,
        pub request_id: Option<String>,
    }

    /// Balances after a payoff payment
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PayoffOutcome {
        pub expected_new_balance: i64,
        pub updated_balance: i64,
        pub paid_so_far: i64,
        pub remaining: i64,
    }
}

pub mod definitions {
    use chrono::NaiveDate;
    use shared::{BillingPeriod, ObligationKind};

    #[derive(Debug, Clone)]
    pub struct CreateDefinitionCommand {
        pub name: String,
        pub kind: ObligationKind,
        pub category_id: String,
        pub payment_source_id: String,
        pub amount: i64,
        pub billing_period: BillingPeriod,
        pub due_day: Option<u32>,
        pub anchor_date: NaiveDate,
    }
}
