//! Tournament data models: events, registrations, rounds and matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::{TournamentError, TournamentResult};

/// Event ID type
pub type EventId = i64;

/// Registration ID type
pub type RegistrationId = i64;

/// Round ID type
pub type RoundId = i64;

/// Match ID type
pub type MatchId = i64;

/// Participant ID type (a user in the club directory)
pub type ParticipantId = i64;

/// Kind of competitive event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Classical Swiss event
    Swiss,
    /// Rapid time control
    Rapid,
    /// Blitz time control
    Blitz,
    /// Unrated club night
    Casual,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Swiss => "swiss",
            EventType::Rapid => "rapid",
            EventType::Blitz => "blitz",
            EventType::Casual => "casual",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swiss" => Ok(EventType::Swiss),
            "rapid" => Ok(EventType::Rapid),
            "blitz" => Ok(EventType::Blitz),
            "casual" => Ok(EventType::Casual),
            other => Err(TournamentError::Storage(format!("unknown event type '{other}'"))),
        }
    }
}

/// Half-open registration window `[opens_at, closes_at)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl RegistrationWindow {
    pub fn new(opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> Self {
        Self {
            opens_at,
            closes_at,
        }
    }

    /// Whether registrations are accepted at `now`
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.opens_at <= now && now < self.closes_at
    }
}

/// Event creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// Event type
    pub event_type: EventType,
    /// Maximum number of non-cancelled registrations
    pub capacity: u32,
    /// Registration window
    pub registration_window: RegistrationWindow,
    /// Planned number of rounds (open-ended when `None`)
    pub max_rounds: Option<u32>,
}

impl NewEvent {
    /// Validate the request before anything is persisted
    pub fn validate(&self) -> TournamentResult<()> {
        if self.name.trim().is_empty() {
            return Err(TournamentError::InvalidInput {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }

        if self.capacity < 2 {
            return Err(TournamentError::InvalidInput {
                field: "capacity",
                reason: "must be at least 2".to_string(),
            });
        }

        if self.registration_window.opens_at >= self.registration_window.closes_at {
            return Err(TournamentError::InvalidInput {
                field: "registration_window",
                reason: "opens_at must be before closes_at".to_string(),
            });
        }

        if self.max_rounds == Some(0) {
            return Err(TournamentError::InvalidInput {
                field: "max_rounds",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Persisted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_type: EventType,
    pub capacity: u32,
    pub registration_window: RegistrationWindow,
    pub max_rounds: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Event status, derived from the registration window and the rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Registration window has not opened yet
    Upcoming,
    /// Accepting registrations
    Open,
    /// Registration window over, no round started
    Closed,
    /// At least one round has started
    InProgress,
    /// All planned rounds completed
    Completed,
}

impl EventStatus {
    /// Derive the status of `event` from its rounds at `now`
    pub fn derive(event: &Event, rounds: &[Round], now: DateTime<Utc>) -> Self {
        let completed = rounds
            .iter()
            .filter(|r| r.status == RoundStatus::Completed)
            .count() as u32;

        if let Some(max_rounds) = event.max_rounds {
            if completed >= max_rounds {
                return EventStatus::Completed;
            }
        }

        if rounds.iter().any(Round::has_started) {
            EventStatus::InProgress
        } else if now < event.registration_window.opens_at {
            EventStatus::Upcoming
        } else if event.registration_window.contains(now) {
            EventStatus::Open
        } else {
            EventStatus::Closed
        }
    }
}

/// Event summary returned by lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    pub event: Event,
    pub status: EventStatus,
    /// Pending plus confirmed registrations
    pub registered_count: usize,
    pub confirmed_count: usize,
    pub rounds_created: u32,
    pub rounds_completed: u32,
}

/// Registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Awaiting payment confirmation
    Pending,
    /// Payment verified; eligible for pairing
    Confirmed,
    /// Withdrawn before the event started
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed registrations count against capacity
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            other => Err(TournamentError::Storage(format!(
                "unknown registration status '{other}'"
            ))),
        }
    }
}

/// Registration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub participant_id: ParticipantId,
    pub status: RegistrationStatus,
    /// Set once payment has been verified
    pub payment_reference: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Round status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Scheduled,
    Active,
    Completed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Scheduled => "scheduled",
            RoundStatus::Active => "active",
            RoundStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(RoundStatus::Scheduled),
            "active" => Ok(RoundStatus::Active),
            "completed" => Ok(RoundStatus::Completed),
            other => Err(TournamentError::Storage(format!(
                "unknown round status '{other}'"
            ))),
        }
    }
}

/// Round of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub event_id: EventId,
    /// 1-based sequence number within the event
    pub number: u32,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Active or completed
    pub fn has_started(&self) -> bool {
        self.status != RoundStatus::Scheduled
    }

    /// Scheduled or active
    pub fn is_open(&self) -> bool {
        self.status != RoundStatus::Completed
    }
}

/// Round together with its matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundDetail {
    pub round: Round,
    pub matches: Vec<Match>,
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(TournamentError::Storage(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// Outcome of a completed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Player1Win,
    Player2Win,
    Draw,
    Bye,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Player1Win => "player1_win",
            MatchOutcome::Player2Win => "player2_win",
            MatchOutcome::Draw => "draw",
            MatchOutcome::Bye => "bye",
        }
    }
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchOutcome {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player1_win" => Ok(MatchOutcome::Player1Win),
            "player2_win" => Ok(MatchOutcome::Player2Win),
            "draw" => Ok(MatchOutcome::Draw),
            "bye" => Ok(MatchOutcome::Bye),
            other => Err(TournamentError::InvalidResult(format!(
                "'{other}' is not a match outcome (expected player1_win, player2_win, draw or bye)"
            ))),
        }
    }
}

/// Optional game score reported with a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub player1_score: u32,
    pub player2_score: u32,
}

/// Match between two participants, or a bye for one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round_id: RoundId,
    pub event_id: EventId,
    pub round_number: u32,
    /// 1-based board number within the round
    pub board: u32,
    pub player1: ParticipantId,
    /// `None` marks a bye
    pub player2: Option<ParticipantId>,
    pub status: MatchStatus,
    pub result: Option<MatchOutcome>,
    pub score: Option<ScoreDetail>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn involves(&self, participant_id: ParticipantId) -> bool {
        self.player1 == participant_id || self.player2 == Some(participant_id)
    }

    /// Opponent of `participant_id`, if any
    pub fn opponent_of(&self, participant_id: ParticipantId) -> Option<ParticipantId> {
        if self.player1 == participant_id {
            self.player2
        } else if self.player2 == Some(participant_id) {
            Some(self.player1)
        } else {
            None
        }
    }
}

/// Result reported for a match, validated against the match before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub outcome: MatchOutcome,
    /// Optional explicit winner, checked against the outcome
    pub winner: Option<ParticipantId>,
    pub score: Option<ScoreDetail>,
}

impl ResultSubmission {
    pub fn new(outcome: MatchOutcome) -> Self {
        Self {
            outcome,
            winner: None,
            score: None,
        }
    }

    /// Build a submission from a raw outcome string
    pub fn parse(
        outcome: &str,
        winner: Option<ParticipantId>,
        score: Option<ScoreDetail>,
    ) -> TournamentResult<Self> {
        Ok(Self {
            outcome: outcome.parse()?,
            winner,
            score,
        })
    }

    pub fn with_winner(mut self, winner: ParticipantId) -> Self {
        self.winner = Some(winner);
        self
    }

    pub fn with_score(mut self, player1_score: u32, player2_score: u32) -> Self {
        self.score = Some(ScoreDetail {
            player1_score,
            player2_score,
        });
        self
    }

    /// Check the submission against the match it is reported for
    pub fn validate_for(&self, m: &Match) -> TournamentResult<()> {
        let Some(player2) = m.player2 else {
            return Err(TournamentError::InvalidResult(format!(
                "match {} is a bye and takes no result",
                m.id
            )));
        };

        if self.outcome == MatchOutcome::Bye {
            return Err(TournamentError::InvalidResult(format!(
                "bye is not a valid outcome for match {} between two players",
                m.id
            )));
        }

        if let Some(winner) = self.winner {
            if winner != m.player1 && winner != player2 {
                return Err(TournamentError::InvalidResult(format!(
                    "participant {winner} is not party to match {}",
                    m.id
                )));
            }

            let expected = match self.outcome {
                MatchOutcome::Player1Win => Some(m.player1),
                MatchOutcome::Player2Win => Some(player2),
                _ => None,
            };
            if expected != Some(winner) {
                return Err(TournamentError::InvalidResult(format!(
                    "winner {winner} contradicts outcome {}",
                    self.outcome
                )));
            }
        }

        if let Some(score) = self.score {
            let consistent = match self.outcome {
                MatchOutcome::Player1Win => score.player1_score > score.player2_score,
                MatchOutcome::Player2Win => score.player2_score > score.player1_score,
                MatchOutcome::Draw => score.player1_score == score.player2_score,
                MatchOutcome::Bye => false,
            };
            if !consistent {
                return Err(TournamentError::InvalidResult(format!(
                    "score {}-{} contradicts outcome {}",
                    score.player1_score, score.player2_score, self.outcome
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_match(player2: Option<ParticipantId>) -> Match {
        Match {
            id: 7,
            round_id: 1,
            event_id: 1,
            round_number: 1,
            board: 1,
            player1: 10,
            player2,
            status: MatchStatus::InProgress,
            result: None,
            score: None,
            started_at: None,
            completed_at: None,
        }
    }

    fn sample_event(max_rounds: Option<u32>) -> Event {
        let now = Utc::now();
        Event {
            id: 1,
            name: "Autumn Swiss".to_string(),
            event_type: EventType::Swiss,
            capacity: 16,
            registration_window: RegistrationWindow::new(
                now - Duration::days(1),
                now + Duration::days(1),
            ),
            max_rounds,
            created_at: now,
        }
    }

    fn round(number: u32, status: RoundStatus) -> Round {
        Round {
            id: number as i64,
            event_id: 1,
            number,
            status,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_outcome_parse_rejects_unknown() {
        assert_eq!(
            "player2_win".parse::<MatchOutcome>().unwrap(),
            MatchOutcome::Player2Win
        );
        let err = "forfeit".parse::<MatchOutcome>().unwrap_err();
        assert!(matches!(err, TournamentError::InvalidResult(_)));
    }

    #[test]
    fn test_submission_rejects_foreign_winner() {
        let m = sample_match(Some(20));
        let submission = ResultSubmission::new(MatchOutcome::Player1Win).with_winner(99);
        assert!(matches!(
            submission.validate_for(&m),
            Err(TournamentError::InvalidResult(_))
        ));
    }

    #[test]
    fn test_submission_rejects_contradicting_winner() {
        let m = sample_match(Some(20));
        let submission = ResultSubmission::new(MatchOutcome::Player1Win).with_winner(20);
        assert!(submission.validate_for(&m).is_err());

        let submission = ResultSubmission::new(MatchOutcome::Player2Win).with_winner(20);
        assert!(submission.validate_for(&m).is_ok());
    }

    #[test]
    fn test_submission_rejects_bye_between_two_players() {
        let m = sample_match(Some(20));
        assert!(ResultSubmission::new(MatchOutcome::Bye).validate_for(&m).is_err());
    }

    #[test]
    fn test_submission_checks_score_detail() {
        let m = sample_match(Some(20));
        let ok = ResultSubmission::new(MatchOutcome::Draw).with_score(2, 2);
        assert!(ok.validate_for(&m).is_ok());

        let bad = ResultSubmission::new(MatchOutcome::Player1Win).with_score(1, 3);
        assert!(bad.validate_for(&m).is_err());
    }

    #[test]
    fn test_new_event_validation() {
        let now = Utc::now();
        let mut new_event = NewEvent {
            name: "Club Night".to_string(),
            event_type: EventType::Casual,
            capacity: 8,
            registration_window: RegistrationWindow::new(now, now + Duration::hours(2)),
            max_rounds: Some(3),
        };
        assert!(new_event.validate().is_ok());

        new_event.capacity = 1;
        assert!(new_event.validate().is_err());

        new_event.capacity = 8;
        new_event.registration_window = RegistrationWindow::new(now, now);
        assert!(new_event.validate().is_err());
    }

    #[test]
    fn test_event_status_derivation() {
        let event = sample_event(Some(2));
        let now = Utc::now();

        assert_eq!(EventStatus::derive(&event, &[], now), EventStatus::Open);
        assert_eq!(
            EventStatus::derive(&event, &[], now - Duration::days(2)),
            EventStatus::Upcoming
        );
        assert_eq!(
            EventStatus::derive(&event, &[], now + Duration::days(2)),
            EventStatus::Closed
        );
        assert_eq!(
            EventStatus::derive(&event, &[round(1, RoundStatus::Scheduled)], now),
            EventStatus::Open
        );
        assert_eq!(
            EventStatus::derive(&event, &[round(1, RoundStatus::Active)], now),
            EventStatus::InProgress
        );
        assert_eq!(
            EventStatus::derive(
                &event,
                &[
                    round(1, RoundStatus::Completed),
                    round(2, RoundStatus::Completed)
                ],
                now
            ),
            EventStatus::Completed
        );
    }
}
