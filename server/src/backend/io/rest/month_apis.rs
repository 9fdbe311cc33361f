//! # REST API for Months
//!
//! Month generation and the aggregated month view.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;

use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::MonthPath;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/months/:month", get(get_month))
        .route("/months/:month/generate", post(generate_month))
        .route("/months/:month/leftover", get(get_leftover))
}

/// Create the month's instances from active definitions
pub async fn generate_month(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("POST /api/months/{}/generate", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.month_service.generate_month(month).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to generate month", e),
    }
}

pub async fn get_month(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("GET /api/months/{}", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.month_service.month_view(month).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => error_response("Failed to load month", e),
    }
}

pub async fn get_leftover(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("GET /api/months/{}/leftover", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.month_service.leftover(month).await {
        Ok(leftover) => (StatusCode::OK, Json(leftover)).into_response(),
        Err(e) => error_response("Failed to compute leftover", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{date, monthly_definition, TestBackend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use shared::{ErrorResponse, GenerateMonthResponse, MonthView};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_generate_then_view() {
        let env = TestBackend::new(date(2)).await;
        env.seed_definition(monthly_definition("Rent", 1500_00, 1)).await;
        let app = router().with_state(env.state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/months/2025-06/generate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let generated: GenerateMonthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(generated.created_instance_ids.len(), 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/months/2025-06")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: MonthView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.tallies.bills.expected, 1500_00);
        assert_eq!(view.bill_sections[0].category_id, "housing");
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let env = TestBackend::new(date(2)).await;
        let response = router()
            .with_state(env.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/months/2025-13/leftover")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.kind, "validation_error");
    }
}
