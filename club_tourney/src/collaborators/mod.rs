//! External collaborators consumed by the engine.
//!
//! The engine only sees these traits. Payment verification and participant
//! lookup live in other systems; in-memory implementations back tests and the
//! development server, PostgreSQL implementations read the shared database.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::tournament::models::ParticipantId;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryParticipantDirectory, MemoryPaymentVerifier};
pub use postgres::{PgParticipantDirectory, PgPaymentVerifier};

/// Collaborator errors
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Answer of a payment verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentVerdict {
    Valid,
    Invalid,
}

/// Verifies payment references before a registration is confirmed
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Check a payment reference
    ///
    /// An `Err` means the verifier could not answer, not that the payment is bad.
    async fn verify(&self, reference: &str) -> CollaboratorResult<PaymentVerdict>;
}

/// Source of participant identity and ratings
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Whether the participant exists and may register
    async fn exists(&self, participant_id: ParticipantId) -> CollaboratorResult<bool>;

    /// Ratings for the given participants
    ///
    /// Participants without a rating are omitted; callers treat them as 0.
    async fn ratings(
        &self,
        participant_ids: &[ParticipantId],
    ) -> CollaboratorResult<HashMap<ParticipantId, i32>>;
}
