//! Translation of domain failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use shared::ErrorResponse;

use crate::backend::domain::errors::{DomainError, ErrorKind};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotDeletable | ErrorKind::NotEditable => StatusCode::FORBIDDEN,
        ErrorKind::MissingDependency => StatusCode::FAILED_DEPENDENCY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log the failure and render it as `ErrorResponse`. Storage failures are
/// errors, everything else is a rejected request.
pub fn error_response(context: &str, e: DomainError) -> Response {
    let kind = e.kind();
    let status = status_for(kind);
    if status.is_server_error() {
        error!("{}: {}", context, e);
    } else {
        warn!("{}: {}", context, e);
    }

    let body = ErrorResponse {
        kind: kind.as_str().to_string(),
        message: e.to_string(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::StateConflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::NotDeletable), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotEditable), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::MissingDependency), StatusCode::FAILED_DEPENDENCY);
        assert_eq!(status_for(ErrorKind::Storage), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_body_carries_kind_and_message() {
        let response = error_response("close", DomainError::AlreadyClosed("occurrence::1".into()));
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.kind, "state_conflict");
        assert!(body.message.contains("occurrence::1"));
    }
}
