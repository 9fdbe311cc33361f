//! # Backend Module
//!
//! Contains all non-UI logic for the bill tracker.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Domain**: reconciliation rules, aggregation, payoff bills and the forecast
//! - **Storage**: flat-file persistence of month ledgers and reference data
//! - **IO**: the REST API that exposes the domain to clients
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (business logic, services)
//!     ↓
//! Storage Layer (CSV / YAML files)
//! ```

pub mod domain;
pub mod io;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::domain::{
    BalanceService, Clock, DefinitionService, MonthService, PaymentSourceService, PayoffService,
    ProjectionService, ReconciliationService, SystemClock,
};
use crate::backend::io::rest::{
    adhoc_apis, balance_apis, definition_apis, month_apis, occurrence_apis, payment_source_apis,
    payoff_apis, projection_apis,
};
use crate::backend::storage::csv::CsvConnection;
use crate::config::AppConfig;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub month_service: MonthService<CsvConnection>,
    pub reconciliation_service: ReconciliationService<CsvConnection>,
    pub payoff_service: PayoffService<CsvConnection>,
    pub balance_service: BalanceService<CsvConnection>,
    pub projection_service: ProjectionService<CsvConnection>,
    pub payment_source_service: PaymentSourceService<CsvConnection>,
    pub definition_service: DefinitionService<CsvConnection>,
}

/// Wire every service to one connection and clock
pub fn build_state(
    connection: Arc<CsvConnection>,
    clock: Arc<dyn Clock>,
    payoff_category_id: String,
) -> AppState {
    AppState {
        month_service: MonthService::new(connection.clone(), payoff_category_id.clone()),
        reconciliation_service: ReconciliationService::new(connection.clone(), clock.clone()),
        payoff_service: PayoffService::new(
            connection.clone(),
            clock.clone(),
            payoff_category_id.clone(),
        ),
        balance_service: BalanceService::new(connection.clone(), clock.clone()),
        projection_service: ProjectionService::new(connection.clone(), clock.clone()),
        payment_source_service: PaymentSourceService::new(
            connection.clone(),
            clock,
            payoff_category_id,
        ),
        definition_service: DefinitionService::new(connection),
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up storage in {}", config.data_directory.display());
    let connection = Arc::new(CsvConnection::new(&config.data_directory)?);

    info!("Setting up application state");
    Ok(build_state(
        connection,
        Arc::new(SystemClock),
        config.payoff_category_id.clone(),
    ))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: HeaderValue) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(month_apis::router())
        .merge(occurrence_apis::router())
        .merge(adhoc_apis::router())
        .merge(payoff_apis::router())
        .merge(balance_apis::router())
        .merge(projection_apis::router())
        .merge(payment_source_apis::router())
        .merge(definition_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{credit_card, date, june, regular_bill, TestBackend};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use shared::{MonthView, PayoffSummaryResponse};
    use tower::ServiceExt;

    fn app(env: &TestBackend) -> Router {
        create_router(
            env.state.clone(),
            HeaderValue::from_static("http://localhost:8080"),
        )
    }

    #[tokio::test]
    async fn test_routes_are_nested_under_api() {
        let env = TestBackend::new(date(10)).await;
        env.store_instance(regular_bill("Rent", 1200_00, date(1))).await;

        let response = app(&env)
            .oneshot(
                Request::builder()
                    .uri("/api/months/2025-06")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:8080"))
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: MonthView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.tallies.bills.expected, 1200_00);
    }

    #[tokio::test]
    async fn test_static_segments_win_over_kind() {
        let env = TestBackend::new(date(10)).await;
        env.seed_payment_source(credit_card("visa", -80_00)).await;
        env.state.payoff_service.sync(june()).await.unwrap();

        let response = app(&env)
            .oneshot(
                Request::builder()
                    .uri("/api/months/2025-06/payoff-bills")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let summaries: PayoffSummaryResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(summaries.payoff_summaries[0].remaining, 80_00);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let env = TestBackend::new(date(10)).await;
        let response = app(&env)
            .oneshot(Request::builder().uri("/api/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
