//! Integration tests for the tournament lifecycle.
//!
//! Drives registration, rounds, matches and standings through
//! `TournamentManager` on the in-memory store, including concurrent callers.

use chrono::{Duration as ChronoDuration, Utc};
use club_tourney::collaborators::{MemoryParticipantDirectory, MemoryPaymentVerifier};
use club_tourney::db::MemoryStore;
use club_tourney::tournament::{
    EngineConfig, ErrorKind, Event, EventStatus, EventType, Match, MatchOutcome, MatchStatus,
    NewEvent, PaymentFailure, RegistrationStatus, RegistrationWindow, ResultSubmission,
    RoundDetail, RoundStatus, TournamentError, TournamentManager,
};
use futures_util::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    manager: TournamentManager,
    payments: MemoryPaymentVerifier,
    directory: MemoryParticipantDirectory,
}

fn harness_with(config: EngineConfig, payments: MemoryPaymentVerifier) -> Harness {
    let directory = MemoryParticipantDirectory::new();
    let manager = TournamentManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(payments.clone()),
        Arc::new(directory.clone()),
        config,
    );
    Harness {
        manager,
        payments,
        directory,
    }
}

fn harness() -> Harness {
    harness_with(EngineConfig::default(), MemoryPaymentVerifier::new())
}

fn open_window() -> RegistrationWindow {
    let now = Utc::now();
    RegistrationWindow::new(now - ChronoDuration::hours(1), now + ChronoDuration::hours(1))
}

async fn create_event(h: &Harness, capacity: u32, max_rounds: Option<u32>) -> Event {
    h.manager
        .create_event(NewEvent {
            name: "Thursday Swiss".to_string(),
            event_type: EventType::Swiss,
            capacity,
            registration_window: open_window(),
            max_rounds,
        })
        .await
        .expect("Failed to create event")
}

/// Register and confirm a participant with the given rating
async fn enroll(h: &Harness, event_id: i64, participant_id: i64, rating: i32) -> i64 {
    h.directory.add(participant_id, rating);
    let registration = h
        .manager
        .registrations()
        .register(event_id, participant_id)
        .await
        .expect("Failed to register");

    let reference = format!("PAY-{participant_id:04}");
    h.payments.add_valid(reference.clone());
    h.manager
        .registrations()
        .confirm_payment(registration.id, &reference)
        .await
        .expect("Failed to confirm payment");

    registration.id
}

/// Start the round and every real match, then record `decide(match)` for each
async fn play_round<F>(h: &Harness, detail: &RoundDetail, decide: F)
where
    F: Fn(&Match) -> MatchOutcome,
{
    h.manager
        .rounds()
        .start_round(detail.round.id)
        .await
        .expect("Failed to start round");

    for m in detail.matches.iter().filter(|m| !m.is_bye()) {
        h.manager.matches().start_match(m.id).await.unwrap();
        h.manager
            .matches()
            .record_result(m.id, ResultSubmission::new(decide(m)))
            .await
            .unwrap();
    }
}

fn real_pairs(detail: &RoundDetail) -> Vec<(i64, i64)> {
    detail
        .matches
        .iter()
        .filter_map(|m| m.player2.map(|p2| (m.player1, p2)))
        .collect()
}

fn bye_receiver(detail: &RoundDetail) -> Option<i64> {
    detail.matches.iter().find(|m| m.is_bye()).map(|m| m.player1)
}

#[tokio::test]
async fn test_five_player_swiss_two_rounds() {
    let h = harness();
    let event = create_event(&h, 16, None).await;
    for (id, rating) in [(1, 1800), (2, 1700), (3, 1600), (4, 1500), (5, 1400)] {
        enroll(&h, event.id, id, rating).await;
    }

    let round1 = h.manager.rounds().create_round(event.id).await.unwrap();
    assert_eq!(round1.round.number, 1);
    assert_eq!(round1.round.status, RoundStatus::Scheduled);
    assert_eq!(real_pairs(&round1), vec![(1, 2), (3, 4)]);
    assert_eq!(bye_receiver(&round1), Some(5));

    let bye = round1.matches.iter().find(|m| m.is_bye()).unwrap();
    assert_eq!(bye.status, MatchStatus::Completed);
    assert_eq!(bye.result, Some(MatchOutcome::Bye));
    assert!(round1
        .matches
        .iter()
        .filter(|m| !m.is_bye())
        .all(|m| m.status == MatchStatus::Scheduled));

    play_round(&h, &round1, |_| MatchOutcome::Player1Win).await;
    h.manager
        .rounds()
        .complete_round(round1.round.id)
        .await
        .unwrap();

    let standings = h.manager.standings().standings(event.id).await.unwrap();
    assert_eq!(standings.score(1), 1.0);
    assert_eq!(standings.score(3), 1.0);
    assert_eq!(standings.score(5), 1.0);
    assert_eq!(standings.score(2), 0.0);
    assert_eq!(standings.byes(5), 1);

    let round2 = h.manager.rounds().create_round(event.id).await.unwrap();
    assert_eq!(round2.round.number, 2);

    for (a, b) in real_pairs(&round2) {
        assert!(
            !standings.have_played(a, b),
            "round 2 rematched {a} and {b}"
        );
    }
    let bye2 = bye_receiver(&round2).unwrap();
    assert_ne!(bye2, 5, "prior bye receiver got a second bye");
    assert_eq!(bye2, 4);
    assert!(round2.matches.iter().any(|m| !m.is_bye() && m.involves(5)));
}

#[tokio::test]
async fn test_concurrent_create_round_single_winner() {
    let h = harness();
    let event = create_event(&h, 16, None).await;
    for id in 1..=4 {
        enroll(&h, event.id, id, 1500).await;
    }

    let event_id = event.id;
    let a = h.manager.clone();
    let b = h.manager.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.rounds().create_round(event_id).await }),
        tokio::spawn(async move { b.rounds().create_round(event_id).await }),
    );
    let results = [first.unwrap(), second.unwrap()];

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);

    let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(err, TournamentError::RoundInProgress { .. }));
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    assert_eq!(h.manager.rounds().rounds(event.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_payment_then_valid_retry() {
    let h = harness();
    let event = create_event(&h, 8, None).await;
    h.directory.add(42, 1500);

    let registration = h.manager.registrations().register(event.id, 42).await.unwrap();
    assert_eq!(registration.status, RegistrationStatus::Pending);

    let err = h
        .manager
        .registrations()
        .confirm_payment(registration.id, "BOGUS-REFERENCE-0001")
        .await
        .unwrap_err();
    match &err {
        TournamentError::PaymentVerificationFailed { reference, reason } => {
            assert_eq!(reference, "****0001");
            assert_eq!(*reason, PaymentFailure::Rejected);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::ExternalFailure);

    let still = h
        .manager
        .registrations()
        .registration(registration.id)
        .await
        .unwrap();
    assert_eq!(still.status, RegistrationStatus::Pending);
    assert!(still.payment_reference.is_none());

    h.payments.add_valid("PAY-0042");
    let confirmed = h
        .manager
        .registrations()
        .confirm_payment(registration.id, "PAY-0042")
        .await
        .unwrap();
    assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
    assert_eq!(confirmed.payment_reference.as_deref(), Some("PAY-0042"));

    // Confirming twice is a state conflict
    let again = h
        .manager
        .registrations()
        .confirm_payment(registration.id, "PAY-0042")
        .await
        .unwrap_err();
    assert!(matches!(again, TournamentError::InvalidState { .. }));

    assert_eq!(
        h.manager
            .registrations()
            .confirmed_participants(event.id)
            .await
            .unwrap(),
        vec![42]
    );
}

#[tokio::test]
async fn test_payment_timeout_leaves_registration_pending() {
    let slow = MemoryPaymentVerifier::with_valid(["PAY-0007"]).with_delay(Duration::from_millis(500));
    let h = harness_with(EngineConfig::default(), slow);
    let event = create_event(&h, 8, None).await;
    h.directory.add(7, 1500);

    let registration = h.manager.registrations().register(event.id, 7).await.unwrap();
    let err = h
        .manager
        .registrations()
        .confirm_payment_within(registration.id, "PAY-0007", Duration::from_millis(20))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TournamentError::PaymentVerificationFailed {
            reason: PaymentFailure::Timeout(_),
            ..
        }
    ));
    let current = h
        .manager
        .registrations()
        .registration(registration.id)
        .await
        .unwrap();
    assert_eq!(current.status, RegistrationStatus::Pending);
}

#[tokio::test]
async fn test_unavailable_verifier_is_external_failure() {
    let h = harness_with(EngineConfig::default(), MemoryPaymentVerifier::unavailable());
    let event = create_event(&h, 8, None).await;
    h.directory.add(9, 1500);

    let registration = h.manager.registrations().register(event.id, 9).await.unwrap();
    let err = h
        .manager
        .registrations()
        .confirm_payment(registration.id, "PAY-0009")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TournamentError::PaymentVerificationFailed {
            reason: PaymentFailure::Unavailable(_),
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::ExternalFailure);
}

#[tokio::test]
async fn test_registration_rules() {
    let h = harness();
    let event = create_event(&h, 2, None).await;
    h.directory.add(1, 1500);
    h.directory.add(2, 1500);
    h.directory.add(3, 1500);

    let first = h.manager.registrations().register(event.id, 1).await.unwrap();

    let duplicate = h.manager.registrations().register(event.id, 1).await.unwrap_err();
    assert!(matches!(duplicate, TournamentError::DuplicateRegistration { .. }));

    h.manager.registrations().register(event.id, 2).await.unwrap();
    let full = h.manager.registrations().register(event.id, 3).await.unwrap_err();
    assert!(matches!(full, TournamentError::CapacityExceeded { capacity: 2 }));

    let unknown = h.manager.registrations().register(event.id, 99).await.unwrap_err();
    assert!(matches!(unknown, TournamentError::ParticipantNotFound(99)));
    assert_eq!(unknown.kind(), ErrorKind::NotFound);

    // Cancelling frees a seat and allows the participant to come back later
    let cancelled = h.manager.registrations().cancel(first.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    h.manager.registrations().register(event.id, 3).await.unwrap();

    let twice = h.manager.registrations().cancel(first.id).await.unwrap_err();
    assert!(matches!(twice, TournamentError::InvalidState { .. }));

    let missing = h.manager.registrations().register(12345, 1).await.unwrap_err();
    assert!(matches!(missing, TournamentError::EventNotFound(12345)));
}

#[tokio::test]
async fn test_registration_closed_outside_window() {
    let h = harness();
    h.directory.add(1, 1500);
    let now = Utc::now();
    let event = h
        .manager
        .create_event(NewEvent {
            name: "Last Month".to_string(),
            event_type: EventType::Rapid,
            capacity: 8,
            registration_window: RegistrationWindow::new(
                now - ChronoDuration::days(30),
                now - ChronoDuration::days(29),
            ),
            max_rounds: None,
        })
        .await
        .unwrap();

    let err = h.manager.registrations().register(event.id, 1).await.unwrap_err();
    assert!(matches!(err, TournamentError::RegistrationClosed(id) if id == event.id));
    assert_eq!(
        h.manager.event(event.id).await.unwrap().status,
        EventStatus::Closed
    );
}

#[tokio::test]
async fn test_cancel_rejected_after_first_round_starts() {
    let h = harness();
    let event = create_event(&h, 16, None).await;
    let mut registrations = Vec::new();
    for id in 1..=4 {
        registrations.push(enroll(&h, event.id, id, 1500).await);
    }

    let round = h.manager.rounds().create_round(event.id).await.unwrap();

    // Scheduled round: not started yet, cancellation still allowed
    h.manager.registrations().cancel(registrations[3]).await.unwrap();

    h.manager.rounds().start_round(round.round.id).await.unwrap();
    let err = h
        .manager
        .registrations()
        .cancel(registrations[0])
        .await
        .unwrap_err();
    match err {
        TournamentError::InvalidState {
            entity, current, ..
        } => {
            assert_eq!(entity, "event");
            assert_eq!(current, "in_progress");
        }
        other => panic!("unexpected error: {other}"),
    }

    let late = h.manager.registrations().register(event.id, 50).await.unwrap_err();
    assert!(matches!(late, TournamentError::RegistrationClosed(_)));
    assert_eq!(
        h.manager.event(event.id).await.unwrap().status,
        EventStatus::InProgress
    );
}

#[tokio::test]
async fn test_round_state_machine() {
    let h = harness();
    let event = create_event(&h, 16, None).await;

    let err = h.manager.rounds().create_round(event.id).await.unwrap_err();
    assert!(matches!(
        err,
        TournamentError::InsufficientParticipants {
            needed: 2,
            current: 0
        }
    ));

    for id in 1..=4 {
        enroll(&h, event.id, id, 1500).await;
    }
    let detail = h.manager.rounds().create_round(event.id).await.unwrap();
    let round_id = detail.round.id;

    // Completing a scheduled round skips a state
    let skipped = h.manager.rounds().complete_round(round_id).await.unwrap_err();
    assert!(matches!(skipped, TournamentError::InvalidState { .. }));

    // Matches cannot start before the round
    let early = h
        .manager
        .matches()
        .start_match(detail.matches[0].id)
        .await
        .unwrap_err();
    assert!(matches!(early, TournamentError::InvalidState { entity: "round", .. }));

    h.manager.rounds().start_round(round_id).await.unwrap();
    let restart = h.manager.rounds().start_round(round_id).await.unwrap_err();
    assert!(matches!(restart, TournamentError::InvalidState { .. }));

    // Next round is blocked while this one is open
    let blocked = h.manager.rounds().create_round(event.id).await.unwrap_err();
    assert!(matches!(blocked, TournamentError::RoundInProgress { round_id: id, .. } if id == round_id));

    let first = &detail.matches[0];
    h.manager.matches().start_match(first.id).await.unwrap();
    h.manager
        .matches()
        .record_result(first.id, ResultSubmission::new(MatchOutcome::Draw))
        .await
        .unwrap();

    let incomplete = h.manager.rounds().complete_round(round_id).await.unwrap_err();
    assert!(matches!(
        incomplete,
        TournamentError::IncompleteMatches { open: 1, .. }
    ));
    assert_eq!(
        h.manager.rounds().round(round_id).await.unwrap().round.status,
        RoundStatus::Active
    );

    let second = &detail.matches[1];
    h.manager.matches().start_match(second.id).await.unwrap();
    h.manager
        .matches()
        .record_result(second.id, ResultSubmission::new(MatchOutcome::Player2Win))
        .await
        .unwrap();

    let completed = h.manager.rounds().complete_round(round_id).await.unwrap();
    assert_eq!(completed.status, RoundStatus::Completed);
    assert!(completed.completed_at.is_some());

    let again = h.manager.rounds().complete_round(round_id).await.unwrap_err();
    assert!(matches!(again, TournamentError::InvalidState { .. }));
}

#[tokio::test]
async fn test_record_result_validation() {
    let h = harness();
    let event = create_event(&h, 16, None).await;
    for id in 1..=3 {
        enroll(&h, event.id, id, 1500).await;
    }
    let detail = h.manager.rounds().create_round(event.id).await.unwrap();
    h.manager.rounds().start_round(detail.round.id).await.unwrap();

    let game = detail.matches.iter().find(|m| !m.is_bye()).unwrap();
    let bye = detail.matches.iter().find(|m| m.is_bye()).unwrap();

    let not_started = h
        .manager
        .matches()
        .record_result(game.id, ResultSubmission::new(MatchOutcome::Draw))
        .await
        .unwrap_err();
    assert!(matches!(not_started, TournamentError::InvalidState { .. }));

    let bye_start = h.manager.matches().start_match(bye.id).await.unwrap_err();
    assert!(matches!(bye_start, TournamentError::InvalidState { entity: "match", .. }));

    h.manager.matches().start_match(game.id).await.unwrap();

    let stranger = h
        .manager
        .matches()
        .record_result(
            game.id,
            ResultSubmission::new(MatchOutcome::Player1Win).with_winner(bye.player1),
        )
        .await
        .unwrap_err();
    assert!(matches!(stranger, TournamentError::InvalidResult(_)));
    assert_eq!(stranger.kind(), ErrorKind::Validation);

    let contradicting = h
        .manager
        .matches()
        .record_result(
            game.id,
            ResultSubmission::new(MatchOutcome::Player1Win).with_score(0, 2),
        )
        .await
        .unwrap_err();
    assert!(matches!(contradicting, TournamentError::InvalidResult(_)));

    let bye_outcome = h
        .manager
        .matches()
        .record_result(game.id, ResultSubmission::new(MatchOutcome::Bye))
        .await
        .unwrap_err();
    assert!(matches!(bye_outcome, TournamentError::InvalidResult(_)));

    // Rejected submissions left the match untouched
    let unchanged = h.manager.matches().match_record(game.id).await.unwrap();
    assert_eq!(unchanged.status, MatchStatus::InProgress);
    assert!(unchanged.result.is_none());

    let recorded = h
        .manager
        .matches()
        .record_result(
            game.id,
            ResultSubmission::new(MatchOutcome::Player2Win)
                .with_winner(game.player2.unwrap())
                .with_score(1, 3),
        )
        .await
        .unwrap();
    assert_eq!(recorded.status, MatchStatus::Completed);
    assert_eq!(recorded.result, Some(MatchOutcome::Player2Win));
    assert_eq!(recorded.score.map(|s| s.player2_score), Some(3));

    let twice = h
        .manager
        .matches()
        .record_result(game.id, ResultSubmission::new(MatchOutcome::Draw))
        .await
        .unwrap_err();
    assert!(matches!(twice, TournamentError::InvalidState { .. }));
}

#[tokio::test]
async fn test_concurrent_results_then_complete() {
    let h = harness();
    let event = create_event(&h, 32, None).await;
    for id in 1..=16 {
        enroll(&h, event.id, id, 1000 + id as i32 * 10).await;
    }
    let detail = h.manager.rounds().create_round(event.id).await.unwrap();
    h.manager.rounds().start_round(detail.round.id).await.unwrap();

    let mut handles = Vec::new();
    for m in detail.matches.clone() {
        let manager = h.manager.clone();
        handles.push(tokio::spawn(async move {
            manager.matches().start_match(m.id).await?;
            manager
                .matches()
                .record_result(m.id, ResultSubmission::new(MatchOutcome::Player1Win))
                .await
        }));
    }

    // Completion races the results; it either sees open matches or all of them done
    let early = h.manager.rounds().complete_round(detail.round.id).await;
    if let Err(err) = &early {
        assert!(matches!(err, TournamentError::IncompleteMatches { .. }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    if early.is_err() {
        h.manager
            .rounds()
            .complete_round(detail.round.id)
            .await
            .unwrap();
    }

    let standings = h.manager.standings().standings(event.id).await.unwrap();
    assert_eq!(standings.entries.len(), 16);
    let total: f64 = standings.entries.iter().map(|e| e.score).sum();
    assert_eq!(total, 8.0);
}

#[tokio::test]
async fn test_at_most_one_active_round_under_contention() {
    let h = harness();
    let event = create_event(&h, 16, None).await;
    for id in 1..=6 {
        enroll(&h, event.id, id, 1500).await;
    }

    let event_id = event.id;
    for _ in 0..3 {
        let mut handles = Vec::new();
        for _ in 0..4 {
            let manager = h.manager.clone();
            handles.push(tokio::spawn(async move {
                manager.rounds().create_round(event_id).await
            }));
        }
        let mut created = Vec::new();
        for handle in handles {
            if let Ok(detail) = handle.await.unwrap() {
                created.push(detail);
            }
        }
        assert_eq!(created.len(), 1);

        let detail = created.remove(0);
        play_round(&h, &detail, |_| MatchOutcome::Draw).await;

        let rounds = h.manager.rounds().rounds(event.id).await.unwrap();
        let active = rounds
            .iter()
            .filter(|r| r.status == RoundStatus::Active)
            .count();
        assert!(active <= 1);

        h.manager
            .rounds()
            .complete_round(detail.round.id)
            .await
            .unwrap();
    }

    let numbers: Vec<u32> = h
        .manager
        .rounds()
        .rounds(event.id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_event_finishes_after_max_rounds() {
    let h = harness();
    let event = create_event(&h, 8, Some(1)).await;
    for id in 1..=2 {
        enroll(&h, event.id, id, 1500).await;
    }

    let detail = h.manager.rounds().create_round(event.id).await.unwrap();
    play_round(&h, &detail, |_| MatchOutcome::Player1Win).await;
    h.manager
        .rounds()
        .complete_round(detail.round.id)
        .await
        .unwrap();

    let err = h.manager.rounds().create_round(event.id).await.unwrap_err();
    assert!(matches!(err, TournamentError::EventFinished { max_rounds: 1, .. }));

    let info = h.manager.event(event.id).await.unwrap();
    assert_eq!(info.status, EventStatus::Completed);
    assert_eq!(info.rounds_created, 1);
    assert_eq!(info.rounds_completed, 1);
    assert_eq!(info.confirmed_count, 2);
}

#[tokio::test]
async fn test_standings_independent_of_result_order() {
    async fn run(reverse: bool) -> Vec<(i64, f64, f64)> {
        let h = harness();
        let event = create_event(&h, 16, None).await;
        for id in 1..=8 {
            enroll(&h, event.id, id, 2000 - id as i32 * 10).await;
        }

        for _ in 0..2 {
            let detail = h.manager.rounds().create_round(event.id).await.unwrap();
            h.manager.rounds().start_round(detail.round.id).await.unwrap();

            let mut matches = detail.matches.clone();
            if reverse {
                matches.reverse();
            }
            for m in &matches {
                h.manager.matches().start_match(m.id).await.unwrap();
            }
            for m in &matches {
                let outcome = if m.board % 2 == 0 {
                    MatchOutcome::Draw
                } else {
                    MatchOutcome::Player2Win
                };
                h.manager
                    .matches()
                    .record_result(m.id, ResultSubmission::new(outcome))
                    .await
                    .unwrap();
            }
            h.manager
                .rounds()
                .complete_round(detail.round.id)
                .await
                .unwrap();
        }

        h.manager
            .standings()
            .standings(event.id)
            .await
            .unwrap()
            .entries
            .iter()
            .map(|e| (e.participant_id, e.score, e.buchholz))
            .collect()
    }

    assert_eq!(run(false).await, run(true).await);
}

#[tokio::test]
async fn test_player_matches_stream_is_restartable() {
    let config = EngineConfig {
        player_matches_page_size: 1,
        ..EngineConfig::default()
    };
    let h = harness_with(config, MemoryPaymentVerifier::new());

    let first_event = create_event(&h, 8, None).await;
    let second_event = create_event(&h, 8, None).await;
    for event in [&first_event, &second_event] {
        for id in 1..=3 {
            enroll(&h, event.id, id, 1500 + id as i32).await;
        }
    }

    for event in [&first_event, &second_event] {
        for _ in 0..2 {
            let detail = h.manager.rounds().create_round(event.id).await.unwrap();
            play_round(&h, &detail, |_| MatchOutcome::Player1Win).await;
            h.manager
                .rounds()
                .complete_round(detail.round.id)
                .await
                .unwrap();
        }
    }

    let listing = h.manager.matches().player_matches(1);
    let first: Vec<Match> = listing.stream().try_collect().await.unwrap();
    let second: Vec<Match> = listing.stream().try_collect().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(first.iter().all(|m| m.involves(1)));

    let keys: Vec<(u32, i64, i64)> = first
        .iter()
        .map(|m| (m.round_number, m.event_id, m.id))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let page = listing.page(1, 2).await.unwrap();
    assert_eq!(page, first[1..3].to_vec());
    assert!(listing.page(10, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_standings_ignore_unfinished_round() {
    let h = harness();
    let event = create_event(&h, 8, None).await;
    for (id, rating) in [(1, 1600), (2, 1500), (3, 1400)] {
        enroll(&h, event.id, id, rating).await;
    }

    let detail = h.manager.rounds().create_round(event.id).await.unwrap();
    h.manager.rounds().start_round(detail.round.id).await.unwrap();

    // The bye is already completed, but its round is not
    let early = h.manager.standings().standings(event.id).await.unwrap();
    assert!(early.entries.is_empty());
    assert_eq!(early.through_round, 0);

    let m = detail.matches.iter().find(|m| !m.is_bye()).unwrap();
    h.manager.matches().start_match(m.id).await.unwrap();
    h.manager
        .matches()
        .record_result(m.id, ResultSubmission::new(MatchOutcome::Draw))
        .await
        .unwrap();
    h.manager
        .rounds()
        .complete_round(detail.round.id)
        .await
        .unwrap();

    let after = h.manager.standings().standings(event.id).await.unwrap();
    assert_eq!(after.through_round, 1);
    assert_eq!(after.score(3), 1.0);
    assert_eq!(after.score(1), 0.5);
    assert_eq!(after.score(2), 0.5);
}
