//! # REST API for Bank Balances
//!
//! Per-month bank balance snapshots used by leftover and the forecast.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use shared::UpdateBankBalancesRequest;

use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::MonthPath;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/months/:month/bank-balances",
        get(list_bank_balances).put(update_bank_balances),
    )
}

pub async fn list_bank_balances(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("GET /api/months/{}/bank-balances", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.balance_service.list_bank_balances(month).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list bank balances", e),
    }
}

pub async fn update_bank_balances(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
    Json(request): Json<UpdateBankBalancesRequest>,
) -> impl IntoResponse {
    info!("PUT /api/months/{}/bank-balances - request: {:?}", path.month, request);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.balance_service.update_bank_balances(month, request.balances).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update bank balances", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{bank_account, date, TestBackend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use shared::BankBalancesResponse;
    use tower::ServiceExt;

    fn put(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri("/months/2025-06/bank-balances")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let env = TestBackend::new(date(3)).await;
        env.seed_payment_source(bank_account("checking")).await;
        let app = router().with_state(env.state.clone());

        let response = app
            .clone()
            .oneshot(put(json!({
                "balances": [{ "payment_source_id": "checking", "balance": 2400_00 }]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/months/2025-06/bank-balances")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let listed: BankBalancesResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.balances.len(), 1);
        assert_eq!(listed.balances[0].balance, 2400_00);
        assert_eq!(listed.balances[0].recorded_on, date(3));
    }

    #[tokio::test]
    async fn test_unknown_source_is_not_found() {
        let env = TestBackend::new(date(3)).await;
        let response = router()
            .with_state(env.state.clone())
            .oneshot(put(json!({
                "balances": [{ "payment_source_id": "ghost", "balance": 1 }]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
