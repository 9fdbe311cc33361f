//! # Storage Module
//!
//! Persists month ledgers, balance snapshots, payment sources and recurring
//! definitions.
//!
//! ## Key Responsibilities
//!
//! - **Storage Abstraction**: the domain depends on the traits in `traits`,
//!   never on file formats
//! - **Atomic Writes**: every document is written to a temp file and renamed
//!   into place, so readers never see a partial write
//! - **Month Locking**: the connection owns one async mutex per month that
//!   serializes mutations of that month
//!
//! ## Current Implementation
//!
//! - **csv**: flat files under the data directory (YAML month ledgers,
//!   CSV balance snapshots)

pub mod csv;
pub mod traits;

pub use traits::{BalanceStorage, Connection, DefinitionStorage, MonthStorage, PaymentSourceStorage};
