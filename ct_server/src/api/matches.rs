//! Match API handlers.
//!
//! # Examples
//!
//! Record a result with an optional score:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/matches/12/result \
//!   -H "Authorization: Bearer TOKEN" -H "Content-Type: application/json" \
//!   -d '{"outcome": "player1_win", "score": {"player1_score": 3, "player2_score": 1}}'
//! ```
//!
//! Page through a player's matches:
//! ```bash
//! curl "http://localhost:6969/api/v1/players/42/matches?offset=0&limit=20"
//! ```

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use club_tourney::tournament::{Match, MatchId, ParticipantId, ResultSubmission, ScoreDetail};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiResult, middleware::AuthUser};
use crate::{config::MAX_PAGE_LIMIT, logging, metrics};

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    /// `player1_win`, `player2_win` or `draw`
    pub outcome: String,
    #[serde(default)]
    pub winner: Option<ParticipantId>,
    #[serde(default)]
    pub score: Option<ScoreDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PlayerMatchesResponse {
    pub participant_id: ParticipantId,
    pub offset: usize,
    pub limit: usize,
    pub matches: Vec<Match>,
    /// Offset of the next page, absent on the last page
    pub next_offset: Option<usize>,
}

/// Match by ID.
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<Match>> {
    Ok(Json(state.manager.matches().match_record(match_id).await?))
}

/// `scheduled -> in_progress`; the round must be active.
pub async fn start_match(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<Match>> {
    let m = state.manager.matches().start_match(match_id).await?;
    logging::log_state_transition("match", m.id, "in_progress", Some(user.0));

    Ok(Json(m))
}

/// Record the result of an in-progress match.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown outcome, bye outcome, or winner/score
///   inconsistent with the outcome
/// - `409 Conflict`: Match not in progress
pub async fn record_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<ResultRequest>,
) -> ApiResult<Json<Match>> {
    let submission = ResultSubmission::parse(&payload.outcome, payload.winner, payload.score)?;

    let m = state
        .manager
        .matches()
        .record_result(match_id, submission)
        .await?;

    metrics::results_recorded_total(submission.outcome.as_str());
    logging::log_state_transition("match", m.id, "completed", Some(user.0));

    Ok(Json(m))
}

/// One page of a participant's matches across all events.
///
/// Ordered by round number, then event, then match. `limit` defaults to the
/// configured page size and is capped.
pub async fn player_matches(
    State(state): State<AppState>,
    Path(participant_id): Path<ParticipantId>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PlayerMatchesResponse>> {
    let offset = query.offset.unwrap_or(0);
    let limit = query
        .limit
        .unwrap_or(state.manager.config().player_matches_page_size)
        .clamp(1, MAX_PAGE_LIMIT);

    let matches = state
        .manager
        .matches()
        .player_matches(participant_id)
        .page(offset, limit)
        .await?;

    let next_offset = (matches.len() == limit).then_some(offset + limit);

    Ok(Json(PlayerMatchesResponse {
        participant_id,
        offset,
        limit,
        matches,
        next_offset,
    }))
}
