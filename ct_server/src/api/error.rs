//! Mapping of engine errors onto HTTP responses.
//!
//! Every error body has the shape `{"error": <message>, "kind": <kind>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use club_tourney::tournament::{ErrorKind, PaymentFailure, TournamentError};
use serde_json::json;

/// Error returned by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Tournament(#[from] TournamentError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Tournament(err) => match (err.kind(), err) {
                (ErrorKind::Validation, _) => StatusCode::BAD_REQUEST,
                (ErrorKind::StateConflict, _) => StatusCode::CONFLICT,
                (ErrorKind::NotFound, _) => StatusCode::NOT_FOUND,
                (
                    ErrorKind::ExternalFailure,
                    TournamentError::PaymentVerificationFailed { reason, .. },
                ) => match reason {
                    PaymentFailure::Rejected => StatusCode::PAYMENT_REQUIRED,
                    PaymentFailure::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    PaymentFailure::Unavailable(_) => StatusCode::BAD_GATEWAY,
                },
                (ErrorKind::ExternalFailure, _) => StatusCode::BAD_GATEWAY,
                (ErrorKind::Internal, _) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn kind_label(&self) -> &'static str {
        match self {
            ApiError::Tournament(err) => match err.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::StateConflict => "state_conflict",
                ErrorKind::NotFound => "not_found",
                ErrorKind::ExternalFailure => "external_failure",
                ErrorKind::Internal => "internal",
            },
            ApiError::BadRequest(_) => "validation",
            ApiError::Unauthorized(_) => "unauthorized",
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Tournament(err) => err.client_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = json!({
            "error": self.client_message(),
            "kind": self.kind_label(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
