//! # REST API Interface Layer
//!
//! HTTP endpoints for month reconciliation, payoff bills, balances and the
//! forecast. Handlers translate DTOs from `shared` into domain commands and
//! map every `DomainError` to a status code with an `ErrorResponse` body.
//!
//! ## Design Principles
//!
//! - **Domain Separation**: no business rules here, only parsing and mapping
//! - **Uniform Errors**: bad path segments fail the same way domain errors do
//! - **Request Logging**: every handler logs its route and input

pub mod adhoc_apis;
pub mod balance_apis;
pub mod definition_apis;
pub mod error;
pub mod mappers;
pub mod month_apis;
pub mod occurrence_apis;
pub mod params;
pub mod payment_source_apis;
pub mod payoff_apis;
pub mod projection_apis;
