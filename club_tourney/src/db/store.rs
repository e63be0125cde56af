//! Storage trait for the tournament engine.
//!
//! Every state transition is a conditional write: the store only changes a row
//! when it is still in the expected source state and reports whether it did.
//! Managers turn a `false` into the matching state conflict after re-reading,
//! so a rejected mutation never leaves a partial write behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::tournament::{
    errors::TournamentResult,
    models::{
        Event, EventId, Match, MatchId, MatchOutcome, NewEvent, ParticipantId, Registration,
        RegistrationId, Round, RoundDetail, RoundId, ScoreDetail,
    },
    pairing::Pairing,
};

/// Outcome of a conditional registration insert
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationInsert {
    Created(Registration),
    /// A non-cancelled registration already exists
    Duplicate(RegistrationId),
    /// Active registrations already fill the event
    Full,
}

/// Outcome of a conditional round insert
#[derive(Debug, Clone)]
pub enum RoundInsert {
    Created(RoundDetail),
    /// Another round is still open, or the number is taken
    Conflict(Option<RoundId>),
}

/// Trait for tournament storage operations
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Check that the backing storage answers
    async fn health_check(&self) -> TournamentResult<()>;

    /// Persist a new event
    async fn insert_event(&self, event: &NewEvent, at: DateTime<Utc>) -> TournamentResult<Event>;

    async fn get_event(&self, event_id: EventId) -> TournamentResult<Option<Event>>;

    /// All events, newest first
    async fn list_events(&self) -> TournamentResult<Vec<Event>>;

    /// Insert a pending registration unless the participant already holds an
    /// active one or the event is at capacity
    async fn insert_registration(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
        capacity: u32,
        at: DateTime<Utc>,
    ) -> TournamentResult<RegistrationInsert>;

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> TournamentResult<Option<Registration>>;

    /// Registrations of an event in id order
    async fn registrations(&self, event_id: EventId) -> TournamentResult<Vec<Registration>>;

    /// `pending -> confirmed`, recording the payment reference
    async fn confirm_registration(
        &self,
        registration_id: RegistrationId,
        payment_reference: &str,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool>;

    /// `pending | confirmed -> cancelled`, only while no round of the event has started
    async fn cancel_registration(
        &self,
        registration_id: RegistrationId,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool>;

    /// Participant ids with a confirmed registration, ascending
    async fn confirmed_participants(
        &self,
        event_id: EventId,
    ) -> TournamentResult<Vec<ParticipantId>>;

    /// Insert round `number` with its matches unless an open round exists
    ///
    /// Matches are created `scheduled`, byes already `completed`.
    async fn insert_round(
        &self,
        event_id: EventId,
        number: u32,
        pairings: &[Pairing],
        at: DateTime<Utc>,
    ) -> TournamentResult<RoundInsert>;

    async fn get_round(&self, round_id: RoundId) -> TournamentResult<Option<Round>>;

    /// Rounds of an event by number
    async fn rounds(&self, event_id: EventId) -> TournamentResult<Vec<Round>>;

    /// `scheduled -> active`
    async fn start_round(&self, round_id: RoundId, at: DateTime<Utc>) -> TournamentResult<bool>;

    /// `active -> completed`, only when every match of the round is completed
    async fn complete_round(&self, round_id: RoundId, at: DateTime<Utc>)
    -> TournamentResult<bool>;

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<Match>>;

    /// Matches of a round by board
    async fn round_matches(&self, round_id: RoundId) -> TournamentResult<Vec<Match>>;

    /// Matches of an event by round and board
    async fn event_matches(&self, event_id: EventId) -> TournamentResult<Vec<Match>>;

    /// `scheduled -> in_progress`
    async fn start_match(&self, match_id: MatchId, at: DateTime<Utc>) -> TournamentResult<bool>;

    /// `in_progress -> completed` with the given result
    async fn complete_match(
        &self,
        match_id: MatchId,
        outcome: MatchOutcome,
        score: Option<ScoreDetail>,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool>;

    /// One page of a participant's matches across all events
    ///
    /// Ordered by round number, then event id, then match id.
    async fn player_matches(
        &self,
        participant_id: ParticipantId,
        offset: usize,
        limit: usize,
    ) -> TournamentResult<Vec<Match>>;
}
