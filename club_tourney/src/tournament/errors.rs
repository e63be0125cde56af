//! Tournament error types.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::models::{EventId, MatchId, ParticipantId, RegistrationId, RoundId};
use crate::collaborators::CollaboratorError;

/// Broad error category, used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; nothing was changed
    Validation,
    /// Requested transition is not allowed from the current state
    StateConflict,
    /// Referenced entity does not exist
    NotFound,
    /// An external collaborator failed, rejected or timed out
    ExternalFailure,
    /// Storage or serialization failure
    Internal,
}

/// Why payment verification failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentFailure {
    /// Verifier answered that the reference is not valid
    Rejected,
    /// Verifier did not answer within the timeout
    Timeout(Duration),
    /// Verifier could not be reached
    Unavailable(String),
}

impl std::fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentFailure::Rejected => write!(f, "reference rejected"),
            PaymentFailure::Timeout(after) => write!(f, "verifier timed out after {after:?}"),
            PaymentFailure::Unavailable(reason) => write!(f, "verifier unavailable: {reason}"),
        }
    }
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Event is full (capacity {capacity})")]
    CapacityExceeded { capacity: u32 },

    #[error("Participant {participant_id} is already registered for event {event_id}")]
    DuplicateRegistration {
        event_id: EventId,
        participant_id: ParticipantId,
    },

    #[error("Registration is closed for event {0}")]
    RegistrationClosed(EventId),

    #[error("Invalid state for {entity} {id}: is {current}, requested {requested}")]
    InvalidState {
        entity: &'static str,
        id: i64,
        current: String,
        requested: String,
    },

    #[error("Round {round_id} of event {event_id} is still open")]
    RoundInProgress { event_id: EventId, round_id: RoundId },

    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    #[error("Round {round_id} has {open} unfinished match(es)")]
    IncompleteMatches { round_id: RoundId, open: usize },

    #[error("Event {event_id} has already played all {max_rounds} round(s)")]
    EventFinished { event_id: EventId, max_rounds: u32 },

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(RegistrationId),

    #[error("Round not found: {0}")]
    RoundNotFound(RoundId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Payment verification failed for {reference}: {reason}")]
    PaymentVerificationFailed {
        reference: String,
        reason: PaymentFailure,
    },

    #[error("Participant directory error: {0}")]
    Directory(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TournamentError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;

        match self {
            InvalidResult(_) | InvalidInput { .. } => ErrorKind::Validation,
            CapacityExceeded { .. }
            | DuplicateRegistration { .. }
            | RegistrationClosed(_)
            | InvalidState { .. }
            | RoundInProgress { .. }
            | InsufficientParticipants { .. }
            | IncompleteMatches { .. }
            | EventFinished { .. } => ErrorKind::StateConflict,
            EventNotFound(_)
            | RegistrationNotFound(_)
            | RoundNotFound(_)
            | MatchNotFound(_)
            | ParticipantNotFound(_) => ErrorKind::NotFound,
            PaymentVerificationFailed { .. } | Directory(_) => ErrorKind::ExternalFailure,
            Database(_) | Storage(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are replaced with a generic message so SQL details never
    /// reach the caller.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub(crate) fn invalid_state(
        entity: &'static str,
        id: i64,
        current: impl ToString,
        requested: impl ToString,
    ) -> Self {
        TournamentError::InvalidState {
            entity,
            id,
            current: current.to_string(),
            requested: requested.to_string(),
        }
    }
}

impl From<CollaboratorError> for TournamentError {
    fn from(err: CollaboratorError) -> Self {
        TournamentError::Directory(err.to_string())
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// Mask a payment reference for logs and error messages, keeping the last four characters
pub fn mask_reference(reference: &str) -> String {
    let chars: Vec<char> = reference.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TournamentError::InvalidResult("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            TournamentError::RoundInProgress {
                event_id: 1,
                round_id: 2
            }
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(TournamentError::MatchNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            TournamentError::PaymentVerificationFailed {
                reference: "****".into(),
                reason: PaymentFailure::Rejected,
            }
            .kind(),
            ErrorKind::ExternalFailure
        );
        assert_eq!(
            TournamentError::Storage("bad row".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_invalid_state_reports_both_states() {
        let err = TournamentError::invalid_state("round", 4, "scheduled", "completed");
        let msg = err.to_string();
        assert!(msg.contains("round 4"));
        assert!(msg.contains("scheduled"));
        assert!(msg.contains("completed"));
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err = TournamentError::Storage("relation tournament_rounds missing".into());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_mask_reference() {
        assert_eq!(mask_reference("PAY-2024-0042"), "****0042");
        assert_eq!(mask_reference("abc"), "****");
    }
}
