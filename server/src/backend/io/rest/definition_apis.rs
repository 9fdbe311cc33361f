//! # REST API for Recurring Definitions

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use shared::CreateDefinitionRequest;

use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::mappers::definition_mapper::DefinitionMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/definitions", get(list_definitions).post(create_definition))
}

pub async fn list_definitions(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/definitions");

    match state.definition_service.list_definitions().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list definitions", e),
    }
}

pub async fn create_definition(
    State(state): State<AppState>,
    Json(request): Json<CreateDefinitionRequest>,
) -> impl IntoResponse {
    info!("POST /api/definitions - request: {:?}", request);

    let command = DefinitionMapper::to_command(request);
    match state.definition_service.create_definition(command).await {
        Ok(definition) => (StatusCode::CREATED, Json(definition)).into_response(),
        Err(e) => error_response("Failed to create definition", e),
    }
}
