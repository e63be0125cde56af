//! Round API handlers.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use club_tourney::tournament::{EventId, Round, RoundDetail, RoundId};
use std::time::Instant;

use super::{AppState, error::ApiResult, middleware::AuthUser, request_id::RequestId};
use crate::{logging, metrics};

/// Pair and create the next round of an event.
///
/// Returns the round with its matches; a bye appears as an already completed
/// match without a second player.
///
/// # Errors
///
/// - `409 Conflict`: A round is still open, too few confirmed participants, or
///   all planned rounds exist
pub async fn create_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(request_id): Extension<RequestId>,
    Path(event_id): Path<EventId>,
) -> ApiResult<(StatusCode, Json<RoundDetail>)> {
    let started = Instant::now();
    let detail = state.manager.rounds().create_round(event_id).await?;
    let elapsed = started.elapsed();

    metrics::rounds_created_total();
    metrics::pairing_duration_ms(elapsed.as_secs_f64() * 1000.0);
    logging::log_performance(
        "create_round",
        elapsed.as_millis() as u64,
        Some(request_id.as_str()),
    );
    logging::log_state_transition("round", detail.round.id, "scheduled", Some(user.0));

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Round with its matches.
pub async fn get_round(
    State(state): State<AppState>,
    Path(round_id): Path<RoundId>,
) -> ApiResult<Json<RoundDetail>> {
    Ok(Json(state.manager.rounds().round(round_id).await?))
}

/// `scheduled -> active`.
pub async fn start_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(round_id): Path<RoundId>,
) -> ApiResult<Json<Round>> {
    let round = state.manager.rounds().start_round(round_id).await?;
    logging::log_state_transition("round", round.id, "active", Some(user.0));

    Ok(Json(round))
}

/// `active -> completed`; refreshes the event's standings.
///
/// # Errors
///
/// - `409 Conflict`: Round not active, or matches still unfinished
pub async fn complete_round(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(round_id): Path<RoundId>,
) -> ApiResult<Json<Round>> {
    let round = state.manager.rounds().complete_round(round_id).await?;
    logging::log_state_transition("round", round.id, "completed", Some(user.0));

    Ok(Json(round))
}
