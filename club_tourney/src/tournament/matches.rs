//! Match lifecycle and per-player match listing.

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;

use super::{
    context::EngineContext,
    errors::{TournamentError, TournamentResult},
    models::{Match, MatchId, MatchStatus, ParticipantId, ResultSubmission, RoundStatus},
};
use crate::db::TournamentStore;

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    ctx: Arc<EngineContext>,
}

impl MatchManager {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// `scheduled -> in_progress`; the match's round must be active
    pub async fn start_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        let m = self.ctx.load_match(match_id).await?;

        let round_lock = self.ctx.round_locks.get(m.round_id);
        let _guard = round_lock.read().await;

        let round = self.ctx.load_round(m.round_id).await?;
        if round.status != RoundStatus::Active {
            return Err(TournamentError::invalid_state(
                "round",
                round.id,
                round.status,
                "match start",
            ));
        }

        let started = self.ctx.store.start_match(match_id, self.ctx.now()).await?;
        let current = self.ctx.load_match(match_id).await?;

        if !started {
            return Err(TournamentError::invalid_state(
                "match",
                match_id,
                current.status,
                MatchStatus::InProgress,
            ));
        }

        log::debug!("Match {} of round {} started", match_id, current.round_id);

        Ok(current)
    }

    /// `in_progress -> completed` with a validated result
    ///
    /// Standings are not touched here; they refresh when the round completes.
    pub async fn record_result(
        &self,
        match_id: MatchId,
        submission: ResultSubmission,
    ) -> TournamentResult<Match> {
        let m = self.ctx.load_match(match_id).await?;

        let round_lock = self.ctx.round_locks.get(m.round_id);
        let _guard = round_lock.read().await;

        let m = self.ctx.load_match(match_id).await?;
        if m.status != MatchStatus::InProgress {
            return Err(TournamentError::invalid_state(
                "match",
                match_id,
                m.status,
                MatchStatus::Completed,
            ));
        }

        submission.validate_for(&m)?;

        let recorded = self
            .ctx
            .store
            .complete_match(
                match_id,
                submission.outcome,
                submission.score,
                self.ctx.now(),
            )
            .await?;
        let current = self.ctx.load_match(match_id).await?;

        if !recorded {
            return Err(TournamentError::invalid_state(
                "match",
                match_id,
                current.status,
                MatchStatus::Completed,
            ));
        }

        log::info!(
            "Recorded {} for match {} (round {}, event {})",
            submission.outcome,
            match_id,
            current.round_id,
            current.event_id
        );

        Ok(current)
    }

    pub async fn match_record(&self, match_id: MatchId) -> TournamentResult<Match> {
        self.ctx.load_match(match_id).await
    }

    /// Lazy listing of a participant's matches across all events
    pub fn player_matches(&self, participant_id: ParticipantId) -> PlayerMatches {
        PlayerMatches {
            store: self.ctx.store.clone(),
            participant_id,
            page_size: self.ctx.config.player_matches_page_size.max(1),
        }
    }
}

/// Restartable, read-only sequence of one participant's matches
///
/// Ordered by round number, then event id, then match id. Nothing is read until
/// a stream is polled; every call to [`PlayerMatches::stream`] starts over.
#[derive(Clone)]
pub struct PlayerMatches {
    store: Arc<dyn TournamentStore>,
    participant_id: ParticipantId,
    page_size: usize,
}

impl PlayerMatches {
    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    /// Fresh stream from the first match, fetched page by page
    pub fn stream(&self) -> BoxStream<'static, TournamentResult<Match>> {
        let store = self.store.clone();
        let participant_id = self.participant_id;
        let page_size = self.page_size;

        stream::try_unfold(Some(0usize), move |offset| {
            let store = store.clone();
            async move {
                let Some(offset) = offset else {
                    return Ok::<_, TournamentError>(None);
                };

                let page = store
                    .player_matches(participant_id, offset, page_size)
                    .await?;
                if page.is_empty() {
                    return Ok(None);
                }

                let next = (page.len() == page_size).then_some(offset + page.len());
                let items = stream::iter(page.into_iter().map(Ok::<Match, TournamentError>));
                Ok(Some((items, next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    /// One page, for callers that paginate themselves
    pub async fn page(&self, offset: usize, limit: usize) -> TournamentResult<Vec<Match>> {
        self.store
            .player_matches(self.participant_id, offset, limit)
            .await
    }
}
