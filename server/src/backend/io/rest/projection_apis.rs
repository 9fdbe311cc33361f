//! # REST API for the Daily Projection

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;

use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::params::MonthPath;
use crate::backend::AppState;

// Query parameters for the projection API, amounts in cents
#[derive(Debug, Deserialize)]
pub struct ProjectionQuery {
    pub starting_balance: Option<i64>,
    #[serde(default)]
    pub run_rate: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/months/:month/projection", get(get_projection))
}

pub async fn get_projection(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
    Query(query): Query<ProjectionQuery>,
) -> impl IntoResponse {
    info!("GET /api/months/{}/projection - query: {:?}", path.month, query);

    let month = match path.month() {
        Ok(month) => month,
        Err(e) => return error_response("Invalid month", e),
    };
    match state
        .projection_service
        .project(month, query.starting_balance, query.run_rate)
        .await
    {
        Ok(projection) => (StatusCode::OK, Json(projection)).into_response(),
        Err(e) => error_response("Failed to project balances", e),
    }
}
