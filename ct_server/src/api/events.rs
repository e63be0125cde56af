//! Event API handlers.
//!
//! # Examples
//!
//! Create an event:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/events \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Thursday Swiss", "event_type": "swiss", "capacity": 32,
//!        "opens_at": "2026-11-01T18:00:00Z", "closes_at": "2026-11-05T18:00:00Z",
//!        "max_rounds": 5}'
//! ```
//!
//! Standings:
//! ```bash
//! curl http://localhost:6969/api/v1/events/1/standings
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use club_tourney::tournament::{
    Event, EventId, EventInfo, EventType, NewEvent, ParticipantId, Registration,
    RegistrationWindow, Round, Standings,
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiResult, middleware::AuthUser};

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub event_type: EventType,
    pub capacity: u32,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub max_rounds: Option<u32>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(request: CreateEventRequest) -> Self {
        NewEvent {
            name: request.name,
            event_type: request.event_type,
            capacity: request.capacity,
            registration_window: RegistrationWindow::new(request.opens_at, request.closes_at),
            max_rounds: request.max_rounds,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub event_id: EventId,
    pub participants: Vec<ParticipantId>,
}

/// Create an event.
///
/// # Errors
///
/// - `400 Bad Request`: Empty name, capacity below 2, empty window or `max_rounds` of 0
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = state.manager.create_event(payload.into()).await?;

    tracing::info!(event_id = event.id, user_id = user.0, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// List all events with their derived status, newest first.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventInfo>>> {
    Ok(Json(state.manager.events().await?))
}

/// Event with status, registration counts and round counters.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<EventInfo>> {
    Ok(Json(state.manager.event(event_id).await?))
}

/// All registrations of an event, cancelled ones included.
pub async fn list_registrations(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<Vec<Registration>>> {
    Ok(Json(state.manager.registrations().registrations(event_id).await?))
}

/// Confirmed participants, the pool used for pairing.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<ParticipantsResponse>> {
    let participants = state
        .manager
        .registrations()
        .confirmed_participants(event_id)
        .await?;

    Ok(Json(ParticipantsResponse {
        event_id,
        participants,
    }))
}

/// Rounds of an event by number.
pub async fn list_rounds(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<Vec<Round>>> {
    Ok(Json(state.manager.rounds().rounds(event_id).await?))
}

/// Current standings of an event.
///
/// Reflects completed rounds only.
pub async fn get_standings(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Json<Standings>> {
    let standings = state.manager.standings().standings(event_id).await?;
    Ok(Json(Standings::clone(&standings)))
}
