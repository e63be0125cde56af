//! Registration API handlers.
//!
//! # Examples
//!
//! Register the authenticated user, then confirm payment:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/events/1/register \
//!   -H "Authorization: Bearer TOKEN" -H "Content-Type: application/json" -d '{}'
//!
//! curl -X POST http://localhost:6969/api/v1/registrations/7/confirm-payment \
//!   -H "Authorization: Bearer TOKEN" -H "Content-Type: application/json" \
//!   -d '{"payment_reference": "PAY-2026-0042"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use club_tourney::tournament::{
    EventId, ParticipantId, PaymentFailure, Registration, RegistrationId, TournamentError,
};
use serde::Deserialize;
use std::time::Duration;

use super::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use crate::{logging, metrics};

/// Upper bound on a caller-supplied verification timeout
const MAX_PAYMENT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Defaults to the authenticated user
    #[serde(default)]
    pub participant_id: Option<ParticipantId>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_reference: String,
    /// Overrides the configured verification timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn outcome_label(result: &Result<Registration, TournamentError>) -> &'static str {
    match result {
        Ok(_) => "created",
        Err(TournamentError::CapacityExceeded { .. }) => "full",
        Err(TournamentError::DuplicateRegistration { .. }) => "duplicate",
        Err(TournamentError::RegistrationClosed(_)) => "closed",
        Err(TournamentError::ParticipantNotFound(_)) => "unknown_participant",
        Err(_) => "error",
    }
}

fn verification_label(result: &Result<Registration, TournamentError>) -> Option<&'static str> {
    match result {
        Ok(_) => Some("valid"),
        Err(TournamentError::PaymentVerificationFailed { reason, .. }) => Some(match reason {
            PaymentFailure::Rejected => "rejected",
            PaymentFailure::Timeout(_) => "timeout",
            PaymentFailure::Unavailable(_) => "unavailable",
        }),
        // Rejected before the verifier was asked
        Err(_) => None,
    }
}

/// Register a participant for an event.
///
/// The registration starts `pending`.
///
/// # Errors
///
/// - `404 Not Found`: Unknown event or participant
/// - `409 Conflict`: Event full, already registered, or registration closed
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<EventId>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let participant_id = payload.participant_id.unwrap_or(user.0);

    let result = state
        .manager
        .registrations()
        .register(event_id, participant_id)
        .await;
    metrics::registrations_total(outcome_label(&result));

    let registration = result?;
    logging::log_state_transition("registration", registration.id, "pending", Some(user.0));

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Registration by ID.
pub async fn get_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<RegistrationId>,
) -> ApiResult<Json<Registration>> {
    Ok(Json(
        state
            .manager
            .registrations()
            .registration(registration_id)
            .await?,
    ))
}

/// Confirm a pending registration by verifying its payment reference.
///
/// # Errors
///
/// - `402 Payment Required`: The verifier rejected the reference
/// - `502 Bad Gateway`: The verifier could not be reached
/// - `504 Gateway Timeout`: The verifier did not answer in time
/// - `409 Conflict`: Registration is not pending
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(registration_id): Path<RegistrationId>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> ApiResult<Json<Registration>> {
    let registrations = state.manager.registrations();

    let result = match payload.timeout_ms {
        Some(0) => {
            return Err(ApiError::BadRequest(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        Some(ms) => {
            let timeout = Duration::from_millis(ms.min(MAX_PAYMENT_TIMEOUT_MS));
            registrations
                .confirm_payment_within(registration_id, &payload.payment_reference, timeout)
                .await
        }
        None => {
            registrations
                .confirm_payment(registration_id, &payload.payment_reference)
                .await
        }
    };

    if let Some(label) = verification_label(&result) {
        metrics::payment_verifications_total(label);
    }

    let registration = result?;
    logging::log_state_transition("registration", registration.id, "confirmed", Some(user.0));

    Ok(Json(registration))
}

/// Cancel a registration before the event starts.
///
/// # Errors
///
/// - `409 Conflict`: Already cancelled, or a round has started
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(registration_id): Path<RegistrationId>,
) -> ApiResult<Json<Registration>> {
    let registration = state
        .manager
        .registrations()
        .cancel(registration_id)
        .await?;
    logging::log_state_transition("registration", registration.id, "cancelled", Some(user.0));

    Ok(Json(registration))
}
