//! # REST API for Occurrences
//!
//! Reconciliation of individual occurrences within a month's bills or
//! incomes. Every route is addressed as
//! `/months/{month}/{bills|incomes}/{instance_id}/occurrences/...`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{post, put},
    Router,
};
use log::info;
use shared::{
    AddOccurrenceRequest, CloseOccurrenceRequest, RecordPaymentRequest, SplitOccurrenceRequest,
    UpdateOccurrenceRequest,
};

use crate::backend::domain::commands::reconciliation::{
    AddOccurrenceCommand, CloseOccurrenceCommand, RecordPaymentCommand, SplitOccurrenceCommand,
    UpdateOccurrenceCommand,
};
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::{InstancePath, OccurrencePath};
use crate::backend::AppState;

const OCCURRENCES: &str = "/months/:month/:kind/:instance_id/occurrences";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(OCCURRENCES, post(add_occurrence))
        .route(
            &format!("{OCCURRENCES}/:occurrence_id"),
            put(update_occurrence).delete(delete_occurrence),
        )
        .route(&format!("{OCCURRENCES}/:occurrence_id/payments"), post(record_payment))
        .route(&format!("{OCCURRENCES}/:occurrence_id/pay-full"), post(pay_full))
        .route(&format!("{OCCURRENCES}/:occurrence_id/close"), post(close_occurrence))
        .route(&format!("{OCCURRENCES}/:occurrence_id/reopen"), post(reopen_occurrence))
        .route(&format!("{OCCURRENCES}/:occurrence_id/split"), post(split_occurrence))
}

pub async fn add_occurrence(
    State(state): State<AppState>,
    Path(path): Path<InstancePath>,
    Json(request): Json<AddOccurrenceRequest>,
) -> impl IntoResponse {
    info!("POST occurrence on {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    let command = AddOccurrenceCommand {
        expected_date: request.expected_date,
        expected_amount: request.expected_amount,
        notes: request.notes,
        request_id: request.request_id,
    };
    match state.reconciliation_service.add_occurrence(target, command).await {
        Ok(instance) => (StatusCode::CREATED, Json(instance)).into_response(),
        Err(e) => error_response("Failed to add occurrence", e),
    }
}

pub async fn record_payment(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
    Json(request): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    info!("POST payment on {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    let command = RecordPaymentCommand {
        amount: request.amount,
        date: request.date,
        request_id: request.request_id,
    };
    match state.reconciliation_service.record_payment(target, command).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to record payment", e),
    }
}

pub async fn pay_full(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
) -> impl IntoResponse {
    info!("POST pay-full on {:?}", path);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    match state.reconciliation_service.pay_full(target).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to pay in full", e),
    }
}

pub async fn close_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
    Json(request): Json<CloseOccurrenceRequest>,
) -> impl IntoResponse {
    info!("POST close on {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    let command = CloseOccurrenceCommand {
        closed_date: request.closed_date,
        notes: request.notes,
    };
    match state.reconciliation_service.close_occurrence(target, command).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to close occurrence", e),
    }
}

pub async fn reopen_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
) -> impl IntoResponse {
    info!("POST reopen on {:?}", path);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    match state.reconciliation_service.reopen_occurrence(target).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to reopen occurrence", e),
    }
}

pub async fn split_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
    Json(request): Json<SplitOccurrenceRequest>,
) -> impl IntoResponse {
    info!("POST split on {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    let command = SplitOccurrenceCommand {
        paid_amount: request.paid_amount,
        closed_date: request.closed_date,
        request_id: request.request_id,
    };
    match state.reconciliation_service.split_occurrence(target, command).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to split occurrence", e),
    }
}

pub async fn update_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
    Json(request): Json<UpdateOccurrenceRequest>,
) -> impl IntoResponse {
    info!("PUT occurrence {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    let command = UpdateOccurrenceCommand {
        expected_amount: request.expected_amount,
        expected_date: request.expected_date,
        notes: request.notes,
    };
    match state.reconciliation_service.update_occurrence(target, command).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(e) => error_response("Failed to update occurrence", e),
    }
}

pub async fn delete_occurrence(
    State(state): State<AppState>,
    Path(path): Path<OccurrencePath>,
) -> impl IntoResponse {
    info!("DELETE occurrence {:?}", path);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid occurrence path", e),
    };
    match state.reconciliation_service.delete_occurrence(target).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to delete occurrence", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{date, regular_bill, TestBackend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use shared::{ErrorResponse, InstanceView, OccurrenceState};
    use tower::ServiceExt;

    fn post(uri: String, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_payment_then_close() {
        let env = TestBackend::new(date(20)).await;
        let (instance_id, occurrence_id) = env
            .store_instance(regular_bill("Electric", 150_00, date(10)))
            .await;
        let app = router().with_state(env.state.clone());
        let base = format!("/months/2025-06/bills/{instance_id}/occurrences/{occurrence_id}");

        let response = app
            .clone()
            .oneshot(post(format!("{base}/payments"), json!({ "amount": 50_00 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: InstanceView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.occurrences[0].state, OccurrenceState::PartiallyPaid);
        assert_eq!(view.occurrences[0].payments[0].date, date(20));

        let response = app
            .clone()
            .oneshot(post(format!("{base}/close"), json!({ "closed_date": "2025-06-18" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post(format!("{base}/close"), json!({ "closed_date": "2025-06-18" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_kind_segment_must_match_instance() {
        let env = TestBackend::new(date(20)).await;
        let (instance_id, occurrence_id) = env
            .store_instance(regular_bill("Electric", 150_00, date(10)))
            .await;
        let app = router().with_state(env.state.clone());

        let response = app
            .clone()
            .oneshot(post(
                format!("/months/2025-06/incomes/{instance_id}/occurrences/{occurrence_id}/pay-full"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(post(
                format!("/months/2025-06/widgets/{instance_id}/occurrences/{occurrence_id}/reopen"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.kind, "not_found");
    }

    #[tokio::test]
    async fn test_future_payment_is_bad_request() {
        let env = TestBackend::new(date(20)).await;
        let (instance_id, occurrence_id) = env
            .store_instance(regular_bill("Water", 40_00, date(10)))
            .await;
        let response = router()
            .with_state(env.state.clone())
            .oneshot(post(
                format!("/months/2025-06/bills/{instance_id}/occurrences/{occurrence_id}/payments"),
                json!({ "amount": 10_00, "date": "2025-06-25" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_scheduled_occurrence_is_forbidden() {
        let env = TestBackend::new(date(20)).await;
        let (instance_id, occurrence_id) = env
            .store_instance(regular_bill("Water", 40_00, date(10)))
            .await;
        let response = router()
            .with_state(env.state.clone())
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!(
                        "/months/2025-06/bills/{instance_id}/occurrences/{occurrence_id}"
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
