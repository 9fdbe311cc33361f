//! # REST API for Payoff Bills
//!
//! Credit-card payoff bills: summaries, resync and payments.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;
use shared::PayoffPayRequest;

use crate::backend::domain::commands::payoff::PayoffPaymentCommand;
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::{parse_month, MonthPath, PayoffPath};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/months/:month/payoff-bills", get(list_payoff_bills))
        .route("/months/:month/payoff-bills/sync", post(sync_payoff_bills))
        .route("/months/:month/payoff-bills/:instance_id/pay", post(pay_payoff_bill))
}

pub async fn list_payoff_bills(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("GET /api/months/{}/payoff-bills", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.payoff_service.summaries(month).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list payoff bills", e),
    }
}

/// Create missing payoff bills and refresh every remainder
pub async fn sync_payoff_bills(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> impl IntoResponse {
    info!("POST /api/months/{}/payoff-bills/sync", path.month);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state.payoff_service.sync(month).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to sync payoff bills", e),
    }
}

pub async fn pay_payoff_bill(
    State(state): State<AppState>,
    Path(path): Path<PayoffPath>,
    Json(request): Json<PayoffPayRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/months/{}/payoff-bills/{}/pay - request: {:?}",
        path.month, path.instance_id, request
    );

    let month = match parse_month(&path.month) {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    let command = PayoffPaymentCommand {
        amount: request.amount,
        date: request.date,
        new_balance_override: request.new_balance_override,
        request_id: request.request_id,
    };
    match state.payoff_service.pay(month, &path.instance_id, command).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to pay payoff bill", e),
    }
}
