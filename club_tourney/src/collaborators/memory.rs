//! In-memory collaborators for tests and the development server.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{
    CollaboratorError, CollaboratorResult, ParticipantDirectory, PaymentVerdict, PaymentVerifier,
};
use crate::tournament::models::ParticipantId;

/// Payment verifier backed by a set of known-good references
#[derive(Clone, Default)]
pub struct MemoryPaymentVerifier {
    valid: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
    unavailable: bool,
}

impl MemoryPaymentVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier that accepts the given references
    pub fn with_valid<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let verifier = Self::new();
        for reference in references {
            verifier.add_valid(reference);
        }
        verifier
    }

    pub fn add_valid(&self, reference: impl Into<String>) {
        self.valid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.into());
    }

    /// Sleep before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every verification as if the provider were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PaymentVerifier for MemoryPaymentVerifier {
    async fn verify(&self, reference: &str) -> CollaboratorResult<PaymentVerdict> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable {
            return Err(CollaboratorError::Unavailable(
                "payment provider unreachable".to_string(),
            ));
        }

        let valid = self
            .valid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(reference);

        Ok(if valid {
            PaymentVerdict::Valid
        } else {
            PaymentVerdict::Invalid
        })
    }
}

/// Participant directory backed by a map of id to rating
#[derive(Clone, Default)]
pub struct MemoryParticipantDirectory {
    ratings: Arc<Mutex<HashMap<ParticipantId, i32>>>,
    permissive: bool,
}

impl MemoryParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory in which every participant exists, rated 0 unless added
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    pub fn add(&self, participant_id: ParticipantId, rating: i32) {
        self.ratings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant_id, rating);
    }

    pub fn with_participants<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = (ParticipantId, i32)>,
    {
        let directory = Self::new();
        for (id, rating) in participants {
            directory.add(id, rating);
        }
        directory
    }
}

#[async_trait]
impl ParticipantDirectory for MemoryParticipantDirectory {
    async fn exists(&self, participant_id: ParticipantId) -> CollaboratorResult<bool> {
        Ok(self.permissive
            || self
                .ratings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&participant_id))
    }

    async fn ratings(
        &self,
        participant_ids: &[ParticipantId],
    ) -> CollaboratorResult<HashMap<ParticipantId, i32>> {
        let ratings = self.ratings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(participant_ids
            .iter()
            .filter_map(|id| ratings.get(id).map(|r| (*id, *r)))
            .collect())
    }
}
