//! # REST API for Ad-hoc Items
//!
//! One-off bills and incomes, and promoting them to recurring definitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use log::info;
use shared::{CreateAdHocRequest, MakeRegularRequest};

use crate::backend::domain::commands::reconciliation::{CreateAdHocCommand, PromoteAdHocCommand};
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::{InstancePath, KindPath};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/months/:month/adhoc/:kind", post(create_adhoc))
        .route("/months/:month/:kind/:instance_id/make-regular", post(make_regular))
}

pub async fn create_adhoc(
    State(state): State<AppState>,
    Path(path): Path<KindPath>,
    Json(request): Json<CreateAdHocRequest>,
) -> impl IntoResponse {
    info!("POST /api/months/{}/adhoc/{} - request: {:?}", path.month, path.kind, request);

    let (month, kind) = match path.parse() {
        Ok(parsed) => parsed,
        Err(e) => return error_response("Invalid ad-hoc path", e),
    };
    let command = CreateAdHocCommand {
        month,
        kind,
        name: request.name,
        category_id: request.category_id,
        payment_source_id: request.payment_source_id,
        expected_date: request.expected_date,
        expected_amount: request.expected_amount,
        notes: request.notes,
        request_id: request.request_id,
    };
    match state.reconciliation_service.create_adhoc(command).await {
        Ok(instance) => (StatusCode::CREATED, Json(instance)).into_response(),
        Err(e) => error_response("Failed to create ad-hoc item", e),
    }
}

/// Turn an ad-hoc instance into a recurring definition
pub async fn make_regular(
    State(state): State<AppState>,
    Path(path): Path<InstancePath>,
    Json(request): Json<MakeRegularRequest>,
) -> impl IntoResponse {
    info!("POST make-regular on {:?} - request: {:?}", path, request);

    let target = match path.target() {
        Ok(target) => target,
        Err(e) => return error_response("Invalid instance path", e),
    };
    let command = PromoteAdHocCommand {
        category_id: request.category_id,
        payment_source_id: request.payment_source_id,
        billing_period: request.billing_period,
        due_day: request.due_day,
        request_id: request.request_id,
    };
    match state.reconciliation_service.promote_adhoc(target, command).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to make item regular", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::{date, june, TestBackend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use shared::{BillingPeriod, InstanceView, MakeRegularResponse};
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
    async fn test_create_and_promote() {
        let env = TestBackend::new(date(20)).await;
        let app = router().with_state(env.state.clone());
        let create = json!({
            "name": "Gym",
            "category_id": "health",
            "payment_source_id": "checking",
            "expected_date": "2025-06-09",
            "expected_amount": 45_00,
            "request_id": "gym-1"
        });

        let response = app
            .clone()
            .oneshot(post("/months/2025-06/adhoc/bills".to_string(), create.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: InstanceView = serde_json::from_slice(&body).unwrap();
        assert!(created.is_adhoc);

        let replay = app
            .clone()
            .oneshot(post("/months/2025-06/adhoc/bills".to_string(), create))
            .await
            .unwrap();
        let body = axum::body::to_bytes(replay.into_body(), usize::MAX).await.unwrap();
        let replayed: InstanceView = serde_json::from_slice(&body).unwrap();
        assert_eq!(replayed.id, created.id);
        assert_eq!(env.load_ledger(june()).await.instances.len(), 1);

        let response = app
            .oneshot(post(
                format!("/months/2025-06/bills/{}/make-regular", created.id),
                json!({ "billing_period": "monthly", "due_day": 9 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let promoted: MakeRegularResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(promoted.definition.billing_period, BillingPeriod::Monthly);
        assert_eq!(promoted.definition.anchor_date, date(9));
        assert_eq!(promoted.instance.definition_id, Some(promoted.definition.id));
    }

    #[tokio::test]
    async fn test_adhoc_outside_month_is_bad_request() {
        let env = TestBackend::new(date(20)).await;
        let response = router()
            .with_state(env.state.clone())
            .oneshot(post(
                "/months/2025-06/adhoc/incomes".to_string(),
                json!({
                    "name": "Refund",
                    "category_id": "misc",
                    "payment_source_id": "checking",
                    "expected_date": "2025-07-02",
                    "expected_amount": 12_00
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
