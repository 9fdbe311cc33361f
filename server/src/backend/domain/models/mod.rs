pub mod balance;
pub mod definition;
pub mod instance;
pub mod ledger;
pub mod month;
pub mod occurrence;
pub mod payment_source;

pub use balance::BalanceSnapshot;
pub use definition::RecurringDefinition;
pub use instance::ObligationInstance;
pub use ledger::MonthLedger;
pub use month::MonthKey;
pub use occurrence::{Occurrence, Payment};
pub use payment_source::PaymentSource;
