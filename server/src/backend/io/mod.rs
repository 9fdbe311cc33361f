//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services.
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum, one `router()` per resource merged under `/api`
//! - **Serialization**: Serde JSON using the DTOs in the `shared` crate
//! - **State Management**: services injected through `AppState`
//! - **Error Handling**: `ErrorKind` decides the status code

pub mod rest;
