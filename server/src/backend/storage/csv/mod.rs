pub mod balance_repository;
pub mod connection;
pub mod definition_repository;
pub mod month_repository;
pub mod payment_source_repository;

pub use connection::CsvConnection;
