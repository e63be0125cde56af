//! Round lifecycle: `scheduled -> active -> completed`.

use std::sync::Arc;
use std::time::Instant;

use super::{
    context::EngineContext,
    errors::{TournamentError, TournamentResult},
    models::{EventId, MatchStatus, Round, RoundDetail, RoundId, RoundStatus},
    pairing::{Participant, pair},
    standings::StandingsCalculator,
};
use crate::db::RoundInsert;

/// Minimum number of confirmed participants for a round
pub const MIN_PARTICIPANTS: usize = 2;

/// Round manager
#[derive(Clone)]
pub struct RoundManager {
    ctx: Arc<EngineContext>,
    standings: StandingsCalculator,
}

impl RoundManager {
    pub(crate) fn new(ctx: Arc<EngineContext>, standings: StandingsCalculator) -> Self {
        Self { ctx, standings }
    }

    /// Pair and persist the next round of an event
    ///
    /// The round and its matches start `scheduled`; a bye is stored as an
    /// already completed match.
    pub async fn create_round(&self, event_id: EventId) -> TournamentResult<RoundDetail> {
        let lock = self.ctx.event_locks.get(event_id);
        let _guard = lock.lock().await;

        let event = self.ctx.load_event(event_id).await?;
        let rounds = self.ctx.store.rounds(event_id).await?;

        if let Some(open) = rounds.iter().find(|r| r.is_open()) {
            return Err(TournamentError::RoundInProgress {
                event_id,
                round_id: open.id,
            });
        }

        if let Some(max_rounds) = event.max_rounds {
            if rounds.len() as u32 >= max_rounds {
                return Err(TournamentError::EventFinished {
                    event_id,
                    max_rounds,
                });
            }
        }

        let confirmed = self.ctx.store.confirmed_participants(event_id).await?;
        if confirmed.len() < MIN_PARTICIPANTS {
            return Err(TournamentError::InsufficientParticipants {
                needed: MIN_PARTICIPANTS,
                current: confirmed.len(),
            });
        }

        let ratings = self.ctx.directory.ratings(&confirmed).await?;
        let participants: Vec<Participant> = confirmed
            .iter()
            .map(|&id| Participant::new(id, ratings.get(&id).copied().unwrap_or(0)))
            .collect();

        let standings = self.standings.snapshot(event_id).await?;
        let number = rounds.iter().map(|r| r.number).max().unwrap_or(0) + 1;

        let started = Instant::now();
        let pairings = pair(&participants, &standings, number, &self.ctx.config.pairing);
        let elapsed = started.elapsed();

        match self
            .ctx
            .store
            .insert_round(event_id, number, &pairings, self.ctx.now())
            .await?
        {
            RoundInsert::Created(detail) => {
                let byes = pairings.iter().filter(|p| p.is_bye()).count();
                log::info!(
                    "Created round {} (#{}) for event {}: {} match(es), {} bye(s), paired in {:?}",
                    detail.round.id,
                    number,
                    event_id,
                    pairings.len() - byes,
                    byes,
                    elapsed
                );
                Ok(detail)
            }
            RoundInsert::Conflict(Some(round_id)) => {
                Err(TournamentError::RoundInProgress { event_id, round_id })
            }
            RoundInsert::Conflict(None) => Err(TournamentError::invalid_state(
                "event",
                event_id,
                format!("round {number} exists"),
                format!("create round {number}"),
            )),
        }
    }

    /// `scheduled -> active`
    ///
    /// Matches stay `scheduled` until started individually.
    pub async fn start_round(&self, round_id: RoundId) -> TournamentResult<Round> {
        let round = self.ctx.load_round(round_id).await?;

        let lock = self.ctx.event_locks.get(round.event_id);
        let _guard = lock.lock().await;

        let started = self.ctx.store.start_round(round_id, self.ctx.now()).await?;
        let current = self.ctx.load_round(round_id).await?;

        if !started {
            return Err(TournamentError::invalid_state(
                "round",
                round_id,
                current.status,
                RoundStatus::Active,
            ));
        }

        log::info!(
            "Round {} (#{}) of event {} started",
            round_id,
            current.number,
            current.event_id
        );

        Ok(current)
    }

    /// `active -> completed`, then refresh the event's standings
    pub async fn complete_round(&self, round_id: RoundId) -> TournamentResult<Round> {
        let round = self.ctx.load_round(round_id).await?;
        let event_id = round.event_id;

        let event_lock = self.ctx.event_locks.get(event_id);
        let _event_guard = event_lock.lock().await;

        // Waits for in-flight result recording on this round
        let round_lock = self.ctx.round_locks.get(round_id);
        let _round_guard = round_lock.write().await;

        let round = self.ctx.load_round(round_id).await?;
        if round.status != RoundStatus::Active {
            return Err(TournamentError::invalid_state(
                "round",
                round_id,
                round.status,
                RoundStatus::Completed,
            ));
        }

        let open = self
            .ctx
            .store
            .round_matches(round_id)
            .await?
            .iter()
            .filter(|m| m.status != MatchStatus::Completed)
            .count();
        if open > 0 {
            return Err(TournamentError::IncompleteMatches { round_id, open });
        }

        if !self.ctx.store.complete_round(round_id, self.ctx.now()).await? {
            let current = self.ctx.load_round(round_id).await?;
            return Err(TournamentError::invalid_state(
                "round",
                round_id,
                current.status,
                RoundStatus::Completed,
            ));
        }

        log::info!(
            "Round {} (#{}) of event {} completed",
            round_id,
            round.number,
            event_id
        );

        // Stale standings must not outlive the transition, even if recompute fails
        self.standings.invalidate(event_id).await;
        self.standings.recompute(event_id).await?;

        self.ctx.load_round(round_id).await
    }

    /// Round with its matches
    pub async fn round(&self, round_id: RoundId) -> TournamentResult<RoundDetail> {
        let round = self.ctx.load_round(round_id).await?;
        let matches = self.ctx.store.round_matches(round_id).await?;
        Ok(RoundDetail { round, matches })
    }

    /// Rounds of an event by number
    pub async fn rounds(&self, event_id: EventId) -> TournamentResult<Vec<Round>> {
        self.ctx.load_event(event_id).await?;
        self.ctx.store.rounds(event_id).await
    }
}
