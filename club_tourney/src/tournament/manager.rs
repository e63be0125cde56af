//! Tournament manager: entry point wiring the engine components together.

use std::sync::Arc;

use super::{
    config::EngineConfig,
    context::EngineContext,
    errors::TournamentResult,
    matches::MatchManager,
    models::{
        Event, EventId, EventInfo, EventStatus, NewEvent, RegistrationStatus, RoundStatus,
    },
    registration::RegistrationLedger,
    rounds::RoundManager,
    standings::StandingsCalculator,
};
use crate::collaborators::{ParticipantDirectory, PaymentVerifier};
use crate::db::TournamentStore;

/// Tournament manager
///
/// Cheap to clone; clones share storage, locks and the standings cache.
#[derive(Clone)]
pub struct TournamentManager {
    ctx: Arc<EngineContext>,
    registrations: RegistrationLedger,
    rounds: RoundManager,
    matches: MatchManager,
    standings: StandingsCalculator,
}

impl TournamentManager {
    /// Create a new tournament manager
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence for events, registrations, rounds and matches
    /// * `payments` - Verifies payment references on confirmation
    /// * `directory` - Participant existence and ratings
    /// * `config` - Scoring, pairing policy and timeouts
    pub fn new(
        store: Arc<dyn TournamentStore>,
        payments: Arc<dyn PaymentVerifier>,
        directory: Arc<dyn ParticipantDirectory>,
        config: EngineConfig,
    ) -> Self {
        let ctx = Arc::new(EngineContext::new(store, payments, directory, config));
        let standings = StandingsCalculator::new(ctx.clone());

        Self {
            registrations: RegistrationLedger::new(ctx.clone()),
            rounds: RoundManager::new(ctx.clone(), standings.clone()),
            matches: MatchManager::new(ctx.clone()),
            standings,
            ctx,
        }
    }

    /// Create an event after validating its settings
    pub async fn create_event(&self, new_event: NewEvent) -> TournamentResult<Event> {
        new_event.validate()?;

        let event = self.ctx.store.insert_event(&new_event, self.ctx.now()).await?;

        log::info!(
            "Created {} event {} '{}' (capacity {})",
            event.event_type,
            event.id,
            event.name,
            event.capacity
        );

        Ok(event)
    }

    /// Event with its derived status and counters
    pub async fn event(&self, event_id: EventId) -> TournamentResult<EventInfo> {
        let event = self.ctx.load_event(event_id).await?;
        self.describe(event).await
    }

    /// All events with their derived status, newest first
    pub async fn events(&self) -> TournamentResult<Vec<EventInfo>> {
        let events = self.ctx.store.list_events().await?;
        let mut infos = Vec::with_capacity(events.len());
        for event in events {
            infos.push(self.describe(event).await?);
        }
        Ok(infos)
    }

    async fn describe(&self, event: Event) -> TournamentResult<EventInfo> {
        let rounds = self.ctx.store.rounds(event.id).await?;
        let registrations = self.ctx.store.registrations(event.id).await?;

        let status = EventStatus::derive(&event, &rounds, self.ctx.now());
        let registered_count = registrations
            .iter()
            .filter(|r| r.status.is_active())
            .count();
        let confirmed_count = registrations
            .iter()
            .filter(|r| r.status == RegistrationStatus::Confirmed)
            .count();
        let rounds_completed = rounds
            .iter()
            .filter(|r| r.status == RoundStatus::Completed)
            .count() as u32;

        Ok(EventInfo {
            status,
            registered_count,
            confirmed_count,
            rounds_created: rounds.len() as u32,
            rounds_completed,
            event,
        })
    }

    /// Check that storage answers
    pub async fn health_check(&self) -> TournamentResult<()> {
        self.ctx.store.health_check().await
    }

    pub fn registrations(&self) -> &RegistrationLedger {
        &self.registrations
    }

    pub fn rounds(&self) -> &RoundManager {
        &self.rounds
    }

    pub fn matches(&self) -> &MatchManager {
        &self.matches
    }

    pub fn standings(&self) -> &StandingsCalculator {
        &self.standings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }
}
