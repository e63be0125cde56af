//! Shared state behind the engine components.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    config::EngineConfig,
    errors::{TournamentError, TournamentResult},
    locks::{EventLocks, RoundLocks},
    models::{Event, EventId, Match, MatchId, Registration, RegistrationId, Round, RoundId},
    standings::StandingsCache,
};
use crate::collaborators::{ParticipantDirectory, PaymentVerifier};
use crate::db::TournamentStore;

pub(crate) struct EngineContext {
    pub store: Arc<dyn TournamentStore>,
    pub payments: Arc<dyn PaymentVerifier>,
    pub directory: Arc<dyn ParticipantDirectory>,
    pub config: EngineConfig,
    pub event_locks: EventLocks,
    pub round_locks: RoundLocks,
    pub standings: StandingsCache,
}

impl EngineContext {
    pub fn new(
        store: Arc<dyn TournamentStore>,
        payments: Arc<dyn PaymentVerifier>,
        directory: Arc<dyn ParticipantDirectory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            payments,
            directory,
            config,
            event_locks: EventLocks::default(),
            round_locks: RoundLocks::default(),
            standings: StandingsCache::default(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub async fn load_event(&self, event_id: EventId) -> TournamentResult<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(TournamentError::EventNotFound(event_id))
    }

    pub async fn load_registration(
        &self,
        registration_id: RegistrationId,
    ) -> TournamentResult<Registration> {
        self.store
            .get_registration(registration_id)
            .await?
            .ok_or(TournamentError::RegistrationNotFound(registration_id))
    }

    pub async fn load_round(&self, round_id: RoundId) -> TournamentResult<Round> {
        self.store
            .get_round(round_id)
            .await?
            .ok_or(TournamentError::RoundNotFound(round_id))
    }

    pub async fn load_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    /// Whether any round of the event has left `scheduled`
    pub async fn event_started(&self, event_id: EventId) -> TournamentResult<bool> {
        Ok(self
            .store
            .rounds(event_id)
            .await?
            .iter()
            .any(Round::has_started))
    }
}
