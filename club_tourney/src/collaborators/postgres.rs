//! PostgreSQL-backed collaborators reading the club database.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

use super::{CollaboratorResult, ParticipantDirectory, PaymentVerdict, PaymentVerifier};
use crate::tournament::models::ParticipantId;

/// Verifies references against the `payments` table
///
/// A reference is valid once its payment reached the `completed` status.
#[derive(Clone)]
pub struct PgPaymentVerifier {
    pool: PgPool,
}

impl PgPaymentVerifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentVerifier for PgPaymentVerifier {
    async fn verify(&self, reference: &str) -> CollaboratorResult<PaymentVerdict> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE reference = $1 AND status = 'completed') AS paid",
        )
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

        let paid: bool = row.get("paid");
        Ok(if paid {
            PaymentVerdict::Valid
        } else {
            PaymentVerdict::Invalid
        })
    }
}

/// Looks participants up in the `users` table
#[derive(Clone)]
pub struct PgParticipantDirectory {
    pool: PgPool,
}

impl PgParticipantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantDirectory for PgParticipantDirectory {
    async fn exists(&self, participant_id: ParticipantId) -> CollaboratorResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND is_active = TRUE) AS found",
        )
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("found"))
    }

    async fn ratings(
        &self,
        participant_ids: &[ParticipantId],
    ) -> CollaboratorResult<HashMap<ParticipantId, i32>> {
        let rows = sqlx::query(
            "SELECT id, rating FROM users WHERE id = ANY($1) AND rating IS NOT NULL",
        )
        .bind(participant_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<i64, _>("id"), r.get::<i32, _>("rating")))
            .collect())
    }
}
