//! PostgreSQL tournament store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::store::{RegistrationInsert, RoundInsert, TournamentStore};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{
        Event, EventId, Match, MatchId, MatchOutcome, MatchStatus, NewEvent, ParticipantId,
        Registration, RegistrationId, RegistrationWindow, Round, RoundDetail, RoundId,
        ScoreDetail,
    },
    pairing::Pairing,
};

const EVENT_COLUMNS: &str = "id, name, event_type, capacity, registration_opens_at, \
     registration_closes_at, max_rounds, created_at";

const REGISTRATION_COLUMNS: &str = "id, event_id, participant_id, status, payment_reference, \
     registered_at, confirmed_at, cancelled_at";

const ROUND_COLUMNS: &str = "id, event_id, number, status, created_at, started_at, completed_at";

const MATCH_COLUMNS: &str = "id, round_id, event_id, round_number, board, player1_id, player2_id, \
     status, result, player1_score, player2_score, started_at, completed_at";

/// Tournament store backed by PostgreSQL
#[derive(Clone)]
pub struct PgTournamentStore {
    pool: PgPool,
}

impl PgTournamentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn non_negative(value: i32, column: &str) -> TournamentResult<u32> {
    u32::try_from(value)
        .map_err(|_| TournamentError::Storage(format!("negative value {value} in {column}")))
}

fn event_from_row(row: &PgRow) -> TournamentResult<Event> {
    let event_type: String = row.try_get("event_type")?;
    let max_rounds: Option<i32> = row.try_get("max_rounds")?;

    Ok(Event {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        event_type: event_type.parse()?,
        capacity: non_negative(row.try_get("capacity")?, "capacity")?,
        registration_window: RegistrationWindow::new(
            row.try_get("registration_opens_at")?,
            row.try_get("registration_closes_at")?,
        ),
        max_rounds: max_rounds
            .map(|m| non_negative(m, "max_rounds"))
            .transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

fn registration_from_row(row: &PgRow) -> TournamentResult<Registration> {
    let status: String = row.try_get("status")?;

    Ok(Registration {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        participant_id: row.try_get("participant_id")?,
        status: status.parse()?,
        payment_reference: row.try_get("payment_reference")?,
        registered_at: row.try_get("registered_at")?,
        confirmed_at: row.try_get("confirmed_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
    })
}

fn round_from_row(row: &PgRow) -> TournamentResult<Round> {
    let status: String = row.try_get("status")?;

    Ok(Round {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        number: non_negative(row.try_get("number")?, "number")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    let status: String = row.try_get("status")?;
    let result: Option<String> = row.try_get("result")?;
    let player1_score: Option<i32> = row.try_get("player1_score")?;
    let player2_score: Option<i32> = row.try_get("player2_score")?;

    let result = result
        .map(|r| {
            r.parse::<MatchOutcome>()
                .map_err(|_| TournamentError::Storage(format!("unknown match result '{r}'")))
        })
        .transpose()?;

    let score = match (player1_score, player2_score) {
        (Some(p1), Some(p2)) => Some(ScoreDetail {
            player1_score: non_negative(p1, "player1_score")?,
            player2_score: non_negative(p2, "player2_score")?,
        }),
        _ => None,
    };

    Ok(Match {
        id: row.try_get("id")?,
        round_id: row.try_get("round_id")?,
        event_id: row.try_get("event_id")?,
        round_number: non_negative(row.try_get("round_number")?, "round_number")?,
        board: non_negative(row.try_get("board")?, "board")?,
        player1: row.try_get("player1_id")?,
        player2: row.try_get("player2_id")?,
        status: status.parse()?,
        result,
        score,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn health_check(&self) -> TournamentResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent, at: DateTime<Utc>) -> TournamentResult<Event> {
        let row = sqlx::query(&format!(
            "INSERT INTO tournament_events (name, event_type, capacity, registration_opens_at,
                 registration_closes_at, max_rounds, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&event.name)
        .bind(event.event_type.as_str())
        .bind(event.capacity as i32)
        .bind(event.registration_window.opens_at)
        .bind(event.registration_window.closes_at)
        .bind(event.max_rounds.map(|m| m as i32))
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        event_from_row(&row)
    }

    async fn get_event(&self, event_id: EventId) -> TournamentResult<Option<Event>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM tournament_events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_events(&self) -> TournamentResult<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM tournament_events ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }

    async fn insert_registration(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
        capacity: u32,
        at: DateTime<Utc>,
    ) -> TournamentResult<RegistrationInsert> {
        let mut tx = self.pool.begin().await?;

        // Serializes registrations of one event so the capacity check holds
        sqlx::query("SELECT id FROM tournament_events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;

        let existing = sqlx::query(
            "SELECT id FROM tournament_registrations
             WHERE event_id = $1 AND participant_id = $2 AND status <> 'cancelled'",
        )
        .bind(event_id)
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            return Ok(RegistrationInsert::Duplicate(row.try_get("id")?));
        }

        let active: i64 = sqlx::query(
            "SELECT COUNT(*) AS active FROM tournament_registrations
             WHERE event_id = $1 AND status <> 'cancelled'",
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("active")?;

        if active >= i64::from(capacity) {
            return Ok(RegistrationInsert::Full);
        }

        let row = sqlx::query(&format!(
            "INSERT INTO tournament_registrations (event_id, participant_id, status, registered_at)
             VALUES ($1, $2, 'pending', $3)
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(event_id)
        .bind(participant_id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        let registration = registration_from_row(&row)?;
        tx.commit().await?;

        Ok(RegistrationInsert::Created(registration))
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> TournamentResult<Option<Registration>> {
        let row = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM tournament_registrations WHERE id = $1"
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(registration_from_row).transpose()
    }

    async fn registrations(&self, event_id: EventId) -> TournamentResult<Vec<Registration>> {
        let rows = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM tournament_registrations
             WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(registration_from_row).collect()
    }

    async fn confirm_registration(
        &self,
        registration_id: RegistrationId,
        payment_reference: &str,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_registrations
             SET status = 'confirmed', payment_reference = $2, confirmed_at = $3
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(registration_id)
        .bind(payment_reference)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel_registration(
        &self,
        registration_id: RegistrationId,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_registrations r
             SET status = 'cancelled', cancelled_at = $2
             WHERE r.id = $1
               AND r.status IN ('pending', 'confirmed')
               AND NOT EXISTS (
                   SELECT 1 FROM tournament_rounds
                   WHERE event_id = r.event_id AND status <> 'scheduled'
               )",
        )
        .bind(registration_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn confirmed_participants(
        &self,
        event_id: EventId,
    ) -> TournamentResult<Vec<ParticipantId>> {
        let rows = sqlx::query(
            "SELECT participant_id FROM tournament_registrations
             WHERE event_id = $1 AND status = 'confirmed'
             ORDER BY participant_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get("participant_id").map_err(TournamentError::from))
            .collect()
    }

    async fn insert_round(
        &self,
        event_id: EventId,
        number: u32,
        pairings: &[Pairing],
        at: DateTime<Utc>,
    ) -> TournamentResult<RoundInsert> {
        let mut tx = self.pool.begin().await?;

        // Serializes round creation across processes
        sqlx::query("SELECT id FROM tournament_events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;

        let open = sqlx::query(
            "SELECT id FROM tournament_rounds WHERE event_id = $1 AND status <> 'completed'",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = open {
            return Ok(RoundInsert::Conflict(Some(row.try_get("id")?)));
        }

        let taken = sqlx::query("SELECT 1 FROM tournament_rounds WHERE event_id = $1 AND number = $2")
            .bind(event_id)
            .bind(number as i32)
            .fetch_optional(&mut *tx)
            .await?;

        if taken.is_some() {
            return Ok(RoundInsert::Conflict(None));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO tournament_rounds (event_id, number, status, created_at)
             VALUES ($1, $2, 'scheduled', $3)
             RETURNING {ROUND_COLUMNS}"
        ))
        .bind(event_id)
        .bind(number as i32)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;
        let round = round_from_row(&row)?;

        let mut matches = Vec::with_capacity(pairings.len());
        for (i, pairing) in pairings.iter().enumerate() {
            let (player1, player2) = match *pairing {
                Pairing::Match { player1, player2 } => (player1, Some(player2)),
                Pairing::Bye { player } => (player, None),
            };
            let bye = player2.is_none();

            let row = sqlx::query(&format!(
                "INSERT INTO tournament_matches (round_id, event_id, round_number, board,
                     player1_id, player2_id, status, result, completed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING {MATCH_COLUMNS}"
            ))
            .bind(round.id)
            .bind(event_id)
            .bind(number as i32)
            .bind(i as i32 + 1)
            .bind(player1)
            .bind(player2)
            .bind(if bye {
                MatchStatus::Completed.as_str()
            } else {
                MatchStatus::Scheduled.as_str()
            })
            .bind(bye.then_some(MatchOutcome::Bye.as_str()))
            .bind(bye.then_some(at))
            .fetch_one(&mut *tx)
            .await?;

            matches.push(match_from_row(&row)?);
        }

        tx.commit().await?;

        Ok(RoundInsert::Created(RoundDetail { round, matches }))
    }

    async fn get_round(&self, round_id: RoundId) -> TournamentResult<Option<Round>> {
        let row = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM tournament_rounds WHERE id = $1"
        ))
        .bind(round_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(round_from_row).transpose()
    }

    async fn rounds(&self, event_id: EventId) -> TournamentResult<Vec<Round>> {
        let rows = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM tournament_rounds WHERE event_id = $1 ORDER BY number"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(round_from_row).collect()
    }

    async fn start_round(&self, round_id: RoundId, at: DateTime<Utc>) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_rounds SET status = 'active', started_at = $2
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(round_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_round(
        &self,
        round_id: RoundId,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_rounds SET status = 'completed', completed_at = $2
             WHERE id = $1
               AND status = 'active'
               AND NOT EXISTS (
                   SELECT 1 FROM tournament_matches
                   WHERE round_id = $1 AND status <> 'completed'
               )",
        )
        .bind(round_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<Match>> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches WHERE id = $1"
        ))
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn round_matches(&self, round_id: RoundId) -> TournamentResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches WHERE round_id = $1 ORDER BY board"
        ))
        .bind(round_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn event_matches(&self, event_id: EventId) -> TournamentResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE event_id = $1 ORDER BY round_number, board"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn start_match(&self, match_id: MatchId, at: DateTime<Utc>) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_matches SET status = 'in_progress', started_at = $2
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(match_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_match(
        &self,
        match_id: MatchId,
        outcome: MatchOutcome,
        score: Option<ScoreDetail>,
        at: DateTime<Utc>,
    ) -> TournamentResult<bool> {
        let result = sqlx::query(
            "UPDATE tournament_matches
             SET status = 'completed', result = $2, player1_score = $3, player2_score = $4,
                 completed_at = $5
             WHERE id = $1 AND status = 'in_progress'",
        )
        .bind(match_id)
        .bind(outcome.as_str())
        .bind(score.map(|s| s.player1_score as i32))
        .bind(score.map(|s| s.player2_score as i32))
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn player_matches(
        &self,
        participant_id: ParticipantId,
        offset: usize,
        limit: usize,
    ) -> TournamentResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE player1_id = $1 OR player2_id = $1
             ORDER BY round_number, event_id, id
             OFFSET $2 LIMIT $3"
        ))
        .bind(participant_id)
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }
}
