//! In-process tournament store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::store::{RegistrationInsert, RoundInsert, TournamentStore};
use crate::tournament::{
    errors::TournamentResult,
    models::{
        Event, EventId, Match, MatchId, MatchOutcome, MatchStatus, NewEvent, ParticipantId,
        Registration, RegistrationId, RegistrationStatus, Round, RoundDetail, RoundId,
        RoundStatus, ScoreDetail,
    },
    pairing::Pairing,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    events: BTreeMap<EventId, Event>,
    registrations: BTreeMap<RegistrationId, Registration>,
    rounds: BTreeMap<RoundId, Round>,
    matches: BTreeMap<MatchId, Match>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn event_has_started(&self, event_id: EventId) -> bool {
        self.rounds
            .values()
            .any(|r| r.event_id == event_id && r.has_started())
    }
}

/// Tournament store kept in memory behind a single lock
///
/// Every method holds the lock for its whole read-check-write, which makes each
/// conditional write atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn health_check(&self) -> TournamentResult<()> {
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent, at: DateTime<Utc>) -> TournamentResult<Event> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let event = Event {
            id,
            name: event.name.clone(),
            event_type: event.event_type,
            capacity: event.capacity,
            registration_window: event.registration_window,
            max_rounds: event.max_rounds,
            created_at: at,
        };
        tables.events.insert(id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, event_id: EventId) -> TournamentResult<Option<Event>> {
        Ok(self.tables.read().await.events.get(&event_id).cloned())
    }

    async fn list_events(&self) -> TournamentResult<Vec<Event>> {
        Ok(self
            .tables
            .read()
            .await
            .events
            .values()
            .rev()
            .cloned()
            .collect())
    }

    async fn insert_registration(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
        capacity: u32,
        at: DateTime<Utc>,
    ) -> TournamentResult<RegistrationInsert> {
        let mut tables = self.tables.write().await;

        let active: Vec<&Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.status.is_active())
            .collect();

        if let Some(existing) = active.iter().find(|r| r.participant_id == participant_id) {
            return Ok(RegistrationInsert::Duplicate(existing.id));
        }
        if active.len() >= capacity as usize {
            return Ok(RegistrationInsert::Full);
        }

        let id = tables.allocate_id();
        let registration = Registration {
            id,
            event_id,
            participant_id,
            status: RegistrationStatus::Pending,
            payment_reference: None,
            registered_at: at,
            confirmed_at: None,
            cancelled_at: None,
        };
        tables.registrations.insert(id, registration.clone());
        Ok(RegistrationInsert::Created(registration))
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> TournamentResult<Option<Registration>> {
        Ok(self
            .tables
            .read()
            .await
            .registrations
            .get(&registration_id)
            .cloned())
    }

    async fn registrations(&self, event_id: EventId) -> TournamentResult<Vec<Registration>> {
        Ok(self
            .tables
            .read()
            .await
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn confirm_registration(
        &self,
        registration_id: RegistrationId,
        payment_reference: &str,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.registrations.get_mut(&registration_id) {
            Some(r) if r.status == RegistrationStatus::Pending => {
                r.status = RegistrationStatus::Confirmed;
                r.payment_reference = Some(payment_reference.to_string());
                r.confirmed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_registration(
        &self,
        registration_id: RegistrationId,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(event_id) = tables
            .registrations
            .get(&registration_id)
            .filter(|r| r.status.is_active())
            .map(|r| r.event_id)
        else {
            return Ok(false);
        };

        if tables.event_has_started(event_id) {
            return Ok(false);
        }

        if let Some(r) = tables.registrations.get_mut(&registration_id) {
            r.status = RegistrationStatus::Cancelled;
            r.cancelled_at = Some(at);
        }
        Ok(true)
    }

    async fn confirmed_participants(
        &self,
        event_id: EventId,
    ) -> TournamentResult<Vec<ParticipantId>> {
        let tables = self.tables.read().await;
        let mut ids: Vec<ParticipantId> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Confirmed)
            .map(|r| r.participant_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn insert_round(
        &self,
        event_id: EventId,
        number: u32,
        pairings: &[Pairing],
        at: DateTime<Utc>,
    ) -> TournamentResult<RoundInsert> {
        let mut tables = self.tables.write().await;

        let existing: Vec<&Round> = tables
            .rounds
            .values()
            .filter(|r| r.event_id == event_id)
            .collect();
        if let Some(open) = existing.iter().find(|r| r.is_open()) {
            return Ok(RoundInsert::Conflict(Some(open.id)));
        }
        if existing.iter().any(|r| r.number == number) {
            return Ok(RoundInsert::Conflict(None));
        }

        let round_id = tables.allocate_id();
        let round = Round {
            id: round_id,
            event_id,
            number,
            status: RoundStatus::Scheduled,
            created_at: at,
            started_at: None,
            completed_at: None,
        };
        tables.rounds.insert(round_id, round.clone());

        let mut matches = Vec::with_capacity(pairings.len());
        for (i, pairing) in pairings.iter().enumerate() {
            let id = tables.allocate_id();
            let (player1, player2) = match *pairing {
                Pairing::Match { player1, player2 } => (player1, Some(player2)),
                Pairing::Bye { player } => (player, None),
            };
            let bye = player2.is_none();
            let m = Match {
                id,
                round_id,
                event_id,
                round_number: number,
                board: i as u32 + 1,
                player1,
                player2,
                status: if bye {
                    MatchStatus::Completed
                } else {
                    MatchStatus::Scheduled
                },
                result: bye.then_some(MatchOutcome::Bye),
                score: None,
                started_at: None,
                completed_at: bye.then_some(at),
            };
            tables.matches.insert(id, m.clone());
            matches.push(m);
        }

        Ok(RoundInsert::Created(RoundDetail { round, matches }))
    }

    async fn get_round(&self, round_id: RoundId) -> TournamentResult<Option<Round>> {
        Ok(self.tables.read().await.rounds.get(&round_id).cloned())
    }

    async fn rounds(&self, event_id: EventId) -> TournamentResult<Vec<Round>> {
        let tables = self.tables.read().await;
        let mut rounds: Vec<Round> = tables
            .rounds
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| r.number);
        Ok(rounds)
    }

    async fn start_round(&self, round_id: RoundId, at: DateTime<Utc>) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.rounds.get_mut(&round_id) {
            Some(r) if r.status == RoundStatus::Scheduled => {
                r.status = RoundStatus::Active;
                r.started_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_round(
        &self,
        round_id: RoundId,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        let all_done = tables
            .matches
            .values()
            .filter(|m| m.round_id == round_id)
            .all(|m| m.status == MatchStatus::Completed);

        match tables.rounds.get_mut(&round_id) {
            Some(r) if r.status == RoundStatus::Active && all_done => {
                r.status = RoundStatus::Completed;
                r.completed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<Match>> {
        Ok(self.tables.read().await.matches.get(&match_id).cloned())
    }

    async fn round_matches(&self, round_id: RoundId) -> TournamentResult<Vec<Match>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<Match> = tables
            .matches
            .values()
            .filter(|m| m.round_id == round_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.board);
        Ok(matches)
    }

    async fn event_matches(&self, event_id: EventId) -> TournamentResult<Vec<Match>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<Match> = tables
            .matches
            .values()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round_number, m.board));
        Ok(matches)
    }

    async fn start_match(&self, match_id: MatchId, at: DateTime<Utc>) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.matches.get_mut(&match_id) {
            Some(m) if m.status == MatchStatus::Scheduled => {
                m.status = MatchStatus::InProgress;
                m.started_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_match(
        &self,
        match_id: MatchId,
        outcome: MatchOutcome,
        score: Option<ScoreDetail>,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.matches.get_mut(&match_id) {
            Some(m) if m.status == MatchStatus::InProgress => {
                m.status = MatchStatus::Completed;
                m.result = Some(outcome);
                m.score = score;
                m.completed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn player_matches(
        &self,
        participant_id: ParticipantId,
        offset: usize,
        limit: usize,
    ) -> TournamentResult<Vec<Match>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<&Match> = tables
            .matches
            .values()
            .filter(|m| m.involves(participant_id))
            .collect();
        matches.sort_by_key(|m| (m.round_number, m.event_id, m.id));
        Ok(matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{EventType, RegistrationWindow};
    use chrono::Duration;

    fn new_event(capacity: u32) -> NewEvent {
        let now = Utc::now();
        NewEvent {
            name: "Club Swiss".to_string(),
            event_type: EventType::Swiss,
            capacity,
            registration_window: RegistrationWindow::new(
                now - Duration::hours(1),
                now + Duration::hours(1),
            ),
            max_rounds: None,
        }
    }

    #[tokio::test]
    async fn test_registration_insert_rules() {
        let store = MemoryStore::new();
        let event = store.insert_event(&new_event(2), Utc::now()).await.unwrap();

        let first = store
            .insert_registration(event.id, 10, event.capacity, Utc::now())
            .await
            .unwrap();
        let RegistrationInsert::Created(first) = first else {
            panic!("expected created registration");
        };

        assert_eq!(
            store
                .insert_registration(event.id, 10, event.capacity, Utc::now())
                .await
                .unwrap(),
            RegistrationInsert::Duplicate(first.id)
        );

        store
            .insert_registration(event.id, 11, event.capacity, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            store
                .insert_registration(event.id, 12, event.capacity, Utc::now())
                .await
                .unwrap(),
            RegistrationInsert::Full
        );

        // Cancelling frees both the seat and the participant slot
        assert!(store.cancel_registration(first.id, Utc::now()).await.unwrap());
        assert!(matches!(
            store
                .insert_registration(event.id, 10, event.capacity, Utc::now())
                .await
                .unwrap(),
            RegistrationInsert::Created(_)
        ));
    }

    #[tokio::test]
    async fn test_round_insert_rejects_open_round() {
        let store = MemoryStore::new();
        let event = store.insert_event(&new_event(8), Utc::now()).await.unwrap();
        let pairings = [
            Pairing::Match {
                player1: 1,
                player2: 2,
            },
            Pairing::Bye { player: 3 },
        ];

        let RoundInsert::Created(detail) = store
            .insert_round(event.id, 1, &pairings, Utc::now())
            .await
            .unwrap()
        else {
            panic!("expected created round");
        };
        assert_eq!(detail.matches.len(), 2);
        assert_eq!(detail.matches[1].status, MatchStatus::Completed);
        assert_eq!(detail.matches[1].result, Some(MatchOutcome::Bye));

        assert!(matches!(
            store
                .insert_round(event.id, 2, &pairings, Utc::now())
                .await
                .unwrap(),
            RoundInsert::Conflict(Some(id)) if id == detail.round.id
        ));
    }

    #[tokio::test]
    async fn test_complete_round_requires_finished_matches() {
        let store = MemoryStore::new();
        let event = store.insert_event(&new_event(8), Utc::now()).await.unwrap();
        let RoundInsert::Created(detail) = store
            .insert_round(
                event.id,
                1,
                &[Pairing::Match {
                    player1: 1,
                    player2: 2,
                }],
                Utc::now(),
            )
            .await
            .unwrap()
        else {
            panic!("expected created round");
        };
        let round_id = detail.round.id;
        let match_id = detail.matches[0].id;

        assert!(!store.complete_round(round_id, Utc::now()).await.unwrap());
        assert!(store.start_round(round_id, Utc::now()).await.unwrap());
        assert!(!store.start_round(round_id, Utc::now()).await.unwrap());
        assert!(!store.complete_round(round_id, Utc::now()).await.unwrap());

        assert!(store.start_match(match_id, Utc::now()).await.unwrap());
        assert!(
            store
                .complete_match(match_id, MatchOutcome::Draw, None, Utc::now())
                .await
                .unwrap()
        );
        assert!(
            !store
                .complete_match(match_id, MatchOutcome::Draw, None, Utc::now())
                .await
                .unwrap()
        );
        assert!(store.complete_round(round_id, Utc::now()).await.unwrap());
    }
}
