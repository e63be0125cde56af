//! Authentication middleware for mutating endpoints.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! authenticated user ID into request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use ct_server::api::middleware::AuthUser;
//!
//! async fn protected_handler(Extension(user): Extension<AuthUser>) -> String {
//!     format!("Authenticated as user {}", user.0)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use club_tourney::tournament::ParticipantId;

use super::{AppState, error::ApiError};

/// Authenticated caller, inserted by [`auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub ParticipantId);

/// Reject requests without a valid bearer token
///
/// - **Missing header or wrong scheme**: `401 Unauthorized`
/// - **Invalid or expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("missing bearer token"))?;

    match state.tokens.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser(claims.sub));
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected bearer token");
            Err(ApiError::Unauthorized("invalid or expired token"))
        }
    }
}
