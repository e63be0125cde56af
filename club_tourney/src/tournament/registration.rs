//! Registration ledger: pending, confirmed and cancelled entries per event.

use std::sync::Arc;
use std::time::Duration;

use super::{
    context::EngineContext,
    errors::{PaymentFailure, TournamentError, TournamentResult, mask_reference},
    models::{EventId, ParticipantId, Registration, RegistrationId, RegistrationStatus},
};
use crate::collaborators::PaymentVerdict;
use crate::db::RegistrationInsert;

/// Registration ledger
#[derive(Clone)]
pub struct RegistrationLedger {
    ctx: Arc<EngineContext>,
}

impl RegistrationLedger {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Register a participant for an event
    ///
    /// # Arguments
    ///
    /// * `event_id` - Event to register for
    /// * `participant_id` - Participant known to the directory
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Registration>` - The new `pending` registration
    pub async fn register(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> TournamentResult<Registration> {
        let event = self.ctx.load_event(event_id).await?;
        let now = self.ctx.now();

        if !event.registration_window.contains(now) || self.ctx.event_started(event_id).await? {
            return Err(TournamentError::RegistrationClosed(event_id));
        }

        if !self.ctx.directory.exists(participant_id).await? {
            return Err(TournamentError::ParticipantNotFound(participant_id));
        }

        let lock = self.ctx.event_locks.get(event_id);
        let _guard = lock.lock().await;

        // A round may have started while the directory answered
        if self.ctx.event_started(event_id).await? {
            return Err(TournamentError::RegistrationClosed(event_id));
        }

        match self
            .ctx
            .store
            .insert_registration(event_id, participant_id, event.capacity, now)
            .await?
        {
            RegistrationInsert::Created(registration) => {
                log::info!(
                    "Participant {} registered for event {} (registration {})",
                    participant_id,
                    event_id,
                    registration.id
                );
                Ok(registration)
            }
            RegistrationInsert::Duplicate(_) => Err(TournamentError::DuplicateRegistration {
                event_id,
                participant_id,
            }),
            RegistrationInsert::Full => Err(TournamentError::CapacityExceeded {
                capacity: event.capacity,
            }),
        }
    }

    /// Confirm a pending registration once its payment verifies
    ///
    /// Verification is bounded by the configured payment timeout.
    pub async fn confirm_payment(
        &self,
        registration_id: RegistrationId,
        payment_reference: &str,
    ) -> TournamentResult<Registration> {
        self.confirm_payment_within(
            registration_id,
            payment_reference,
            self.ctx.config.payment_timeout,
        )
        .await
    }

    /// Confirm a pending registration, waiting at most `timeout` for the verifier
    ///
    /// A rejected, unreachable or slow verifier leaves the registration
    /// `pending` and is reported as `PaymentVerificationFailed`.
    pub async fn confirm_payment_within(
        &self,
        registration_id: RegistrationId,
        payment_reference: &str,
        timeout: Duration,
    ) -> TournamentResult<Registration> {
        let reference = payment_reference.trim();
        if reference.is_empty() {
            return Err(TournamentError::InvalidInput {
                field: "payment_reference",
                reason: "must not be empty".to_string(),
            });
        }

        let registration = self.ctx.load_registration(registration_id).await?;
        if registration.status != RegistrationStatus::Pending {
            return Err(TournamentError::invalid_state(
                "registration",
                registration_id,
                registration.status,
                RegistrationStatus::Confirmed,
            ));
        }

        let masked = mask_reference(reference);
        let verdict = tokio::time::timeout(timeout, self.ctx.payments.verify(reference)).await;

        let failure = match verdict {
            Ok(Ok(PaymentVerdict::Valid)) => None,
            Ok(Ok(PaymentVerdict::Invalid)) => Some(PaymentFailure::Rejected),
            Ok(Err(err)) => Some(PaymentFailure::Unavailable(err.to_string())),
            Err(_) => Some(PaymentFailure::Timeout(timeout)),
        };

        if let Some(reason) = failure {
            log::warn!(
                "Payment verification failed for registration {} ({}): {}",
                registration_id,
                masked,
                reason
            );
            return Err(TournamentError::PaymentVerificationFailed {
                reference: masked,
                reason,
            });
        }

        let confirmed = self
            .ctx
            .store
            .confirm_registration(registration_id, reference, self.ctx.now())
            .await?;

        let current = self.ctx.load_registration(registration_id).await?;
        if !confirmed {
            return Err(TournamentError::invalid_state(
                "registration",
                registration_id,
                current.status,
                RegistrationStatus::Confirmed,
            ));
        }

        log::info!(
            "Registration {} confirmed with payment {}",
            registration_id,
            masked
        );

        Ok(current)
    }

    /// Cancel a registration while the event has not started
    pub async fn cancel(&self, registration_id: RegistrationId) -> TournamentResult<Registration> {
        let registration = self.ctx.load_registration(registration_id).await?;
        if !registration.status.is_active() {
            return Err(TournamentError::invalid_state(
                "registration",
                registration_id,
                registration.status,
                RegistrationStatus::Cancelled,
            ));
        }

        let event_id = registration.event_id;
        let lock = self.ctx.event_locks.get(event_id);
        let _guard = lock.lock().await;

        if self.ctx.event_started(event_id).await? {
            return Err(TournamentError::invalid_state(
                "event",
                event_id,
                "in_progress",
                "registration cancellation",
            ));
        }

        let cancelled = self
            .ctx
            .store
            .cancel_registration(registration_id, self.ctx.now())
            .await?;

        let current = self.ctx.load_registration(registration_id).await?;
        if !cancelled {
            return Err(TournamentError::invalid_state(
                "registration",
                registration_id,
                current.status,
                RegistrationStatus::Cancelled,
            ));
        }

        log::info!(
            "Registration {} for event {} cancelled",
            registration_id,
            event_id
        );

        Ok(current)
    }

    /// Participant ids with a confirmed registration, ascending
    ///
    /// This is the only participant source used for pairing.
    pub async fn confirmed_participants(
        &self,
        event_id: EventId,
    ) -> TournamentResult<Vec<ParticipantId>> {
        self.ctx.load_event(event_id).await?;
        self.ctx.store.confirmed_participants(event_id).await
    }

    pub async fn registration(
        &self,
        registration_id: RegistrationId,
    ) -> TournamentResult<Registration> {
        self.ctx.load_registration(registration_id).await
    }

    /// All registrations of an event, cancelled ones included
    pub async fn registrations(&self, event_id: EventId) -> TournamentResult<Vec<Registration>> {
        self.ctx.load_event(event_id).await?;
        self.ctx.store.registrations(event_id).await
    }
}
