//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`events`]: Event creation, lookup, registrations, rounds and standings
//! - [`registrations`]: Register, confirm payment, cancel
//! - [`rounds`]: Create, start and complete rounds
//! - [`matches`]: Start matches, record results, list a player's matches
//! - [`middleware`]: Bearer token authentication for mutating endpoints
//! - [`request_id`]: Request correlation IDs
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use club_tourney::collaborators::{MemoryParticipantDirectory, MemoryPaymentVerifier};
//! use club_tourney::db::MemoryStore;
//! use club_tourney::tournament::{EngineConfig, TournamentManager};
//! use ct_server::api::{AppState, auth::TokenVerifier, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = TournamentManager::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryPaymentVerifier::new()),
//!     Arc::new(MemoryParticipantDirectory::permissive()),
//!     EngineConfig::default(),
//! );
//! let state = AppState {
//!     manager,
//!     tokens: Arc::new(TokenVerifier::new("a_secret_of_at_least_thirty_two_chars")),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod events;
pub mod matches;
pub mod middleware;
pub mod registrations;
pub mod request_id;
pub mod rounds;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use club_tourney::tournament::TournamentManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use auth::TokenVerifier;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the manager and verifier are shared.
#[derive(Clone)]
pub struct AppState {
    pub manager: TournamentManager,
    pub tokens: Arc<TokenVerifier>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                                - Health check (public)
/// GET  /api/v1/events                         - List events (public)
/// POST /api/v1/events                         - Create event (auth required)
/// GET  /api/v1/events/{id}                    - Event with status (public)
/// GET  /api/v1/events/{id}/registrations      - Registrations (public)
/// GET  /api/v1/events/{id}/participants       - Confirmed participants (public)
/// POST /api/v1/events/{id}/register           - Register (auth required)
/// GET  /api/v1/events/{id}/rounds             - Rounds (public)
/// POST /api/v1/events/{id}/rounds             - Create next round (auth required)
/// GET  /api/v1/events/{id}/standings          - Standings (public)
/// GET  /api/v1/registrations/{id}             - Registration (public)
/// POST /api/v1/registrations/{id}/confirm-payment - Confirm payment (auth required)
/// POST /api/v1/registrations/{id}/cancel      - Cancel (auth required)
/// GET  /api/v1/rounds/{id}                    - Round with matches (public)
/// POST /api/v1/rounds/{id}/start              - Start round (auth required)
/// POST /api/v1/rounds/{id}/complete           - Complete round (auth required)
/// GET  /api/v1/matches/{id}                   - Match (public)
/// POST /api/v1/matches/{id}/start             - Start match (auth required)
/// POST /api/v1/matches/{id}/result            - Record result (auth required)
/// GET  /api/v1/players/{id}/matches           - Player's matches, paged (public)
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Reads are public
    let public_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/events/{event_id}", get(events::get_event))
        .route(
            "/events/{event_id}/registrations",
            get(events::list_registrations),
        )
        .route(
            "/events/{event_id}/participants",
            get(events::list_participants),
        )
        .route("/events/{event_id}/rounds", get(events::list_rounds))
        .route("/events/{event_id}/standings", get(events::get_standings))
        .route(
            "/registrations/{registration_id}",
            get(registrations::get_registration),
        )
        .route("/rounds/{round_id}", get(rounds::get_round))
        .route("/matches/{match_id}", get(matches::get_match))
        .route(
            "/players/{participant_id}/matches",
            get(matches::player_matches),
        );

    // Every mutation requires a bearer token
    let protected_routes = Router::new()
        .route("/events", post(events::create_event))
        .route("/events/{event_id}/register", post(registrations::register))
        .route(
            "/registrations/{registration_id}/confirm-payment",
            post(registrations::confirm_payment),
        )
        .route(
            "/registrations/{registration_id}/cancel",
            post(registrations::cancel),
        )
        .route("/events/{event_id}/rounds", post(rounds::create_round))
        .route("/rounds/{round_id}/start", post(rounds::start_round))
        .route("/rounds/{round_id}/complete", post(rounds::complete_round))
        .route("/matches/{match_id}/start", post(matches::start_match))
        .route("/matches/{match_id}/result", post(matches::record_result))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.4.0","storage":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = match state.manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            false
        }
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
