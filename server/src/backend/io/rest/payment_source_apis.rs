//! # REST API for Payment Sources
//!
//! Lists sources and accepts balance updates from the external feed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;
use shared::UpdatePaymentSourceBalanceRequest;

use crate::backend::io::rest::error::error_response;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment-sources", get(list_payment_sources))
        .route("/payment-sources/:source_id/balance", put(update_payment_source_balance))
}

pub async fn list_payment_sources(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/payment-sources");

    match state.payment_source_service.list_payment_sources().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list payment sources", e),
    }
}

pub async fn update_payment_source_balance(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Json(request): Json<UpdatePaymentSourceBalanceRequest>,
) -> impl IntoResponse {
    info!("PUT /api/payment-sources/{}/balance - request: {:?}", source_id, request);

    match state
        .payment_source_service
        .update_balance(&source_id, request.balance)
        .await
    {
        Ok(source) => (StatusCode::OK, Json(source)).into_response(),
        Err(e) => error_response("Failed to update payment source balance", e),
    }
}
