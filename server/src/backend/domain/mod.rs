//! # Domain Module
//!
//! Business rules for reconciling a month of bills and income.
//!
//! ## Module Organization
//!
//! - **models**: month ledgers, instances, occurrences, payments and the
//!   reference data around them (definitions, payment sources, snapshots)
//! - **reconciliation**: the occurrence state machine as pure functions over a
//!   ledger
//! - **aggregation**: tallies, category sections and leftover, always
//!   recomputed from occurrences
//! - **payoff**: credit-card payoff bills that mirror a card's debt
//! - **forecast**: day-by-day balance projection
//! - **schedule**: turns recurring definitions into a month's instances
//! - **\*_service**: load, apply, persist around the pure modules
//!
//! ## Business Rules
//!
//! - Amounts are integer cents
//! - A closed occurrence realizes its expected amount and is read-only until
//!   reopened
//! - Reopening keeps the payment history
//! - Payoff bills are only changed through the payoff operations
//! - Nothing is settled in the future: every "today" comes from a `Clock`

pub mod aggregation;
pub mod balance_service;
pub mod clock;
pub mod commands;
pub mod definition_service;
pub mod errors;
pub mod forecast;
pub mod models;
pub mod month_service;
pub mod payment_source_service;
pub mod payoff;
pub mod payoff_service;
pub mod projection_service;
pub mod reconciliation;
pub mod reconciliation_service;
pub mod retry;
pub mod schedule;

pub use balance_service::BalanceService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use definition_service::DefinitionService;
pub use errors::{DomainError, ErrorKind};
pub use month_service::MonthService;
pub use payment_source_service::PaymentSourceService;
pub use payoff_service::PayoffService;
pub use projection_service::ProjectionService;
pub use reconciliation_service::ReconciliationService;
