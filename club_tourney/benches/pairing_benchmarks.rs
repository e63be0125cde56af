use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use club_tourney::tournament::{
    Match, MatchOutcome, MatchStatus, Pairing, PairingPolicy, Participant, ScoringConfig,
    Standings, Tiebreak, compute_standings, matching::perfect_matching_exists, pair,
};
use std::hint::black_box;

const EVENT_ID: i64 = 1;

fn field(n_players: usize) -> Vec<Participant> {
    (1..=n_players as i64)
        .map(|id| Participant::new(id, 2400 - (id as i32 * 7) % 900))
        .collect()
}

/// Play `rounds` rounds where the lower id always wins, returning every stored match
fn history(participants: &[Participant], rounds: u32, policy: &PairingPolicy) -> Vec<Match> {
    let scoring = ScoringConfig::default();
    let mut matches: Vec<Match> = Vec::new();

    for number in 1..=rounds {
        let standings = compute_standings(EVENT_ID, &matches, &scoring);
        let pairings = pair(participants, &standings, number, policy);

        for (board, pairing) in pairings.into_iter().enumerate() {
            let id = matches.len() as i64 + 1;
            let (player1, player2, result) = match pairing {
                Pairing::Match { player1, player2 } => {
                    let outcome = if player1 < player2 {
                        MatchOutcome::Player1Win
                    } else {
                        MatchOutcome::Player2Win
                    };
                    (player1, Some(player2), outcome)
                }
                Pairing::Bye { player } => (player, None, MatchOutcome::Bye),
            };

            matches.push(Match {
                id,
                round_id: number as i64,
                event_id: EVENT_ID,
                round_number: number,
                board: board as u32 + 1,
                player1,
                player2,
                status: MatchStatus::Completed,
                result: Some(result),
                score: None,
                started_at: None,
                completed_at: None,
            });
        }
    }

    matches
}

fn setup(n_players: usize, rounds: u32, policy: &PairingPolicy) -> (Vec<Participant>, Standings) {
    let participants = field(n_players);
    let matches = history(&participants, rounds, policy);
    let standings = compute_standings(EVENT_ID, &matches, &ScoringConfig::default());
    (participants, standings)
}

/// Benchmark the first round, which is pure rating order
fn bench_first_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_first_round");
    let policy = PairingPolicy::default();

    for n_players in [8, 64, 256] {
        let participants = field(n_players);
        let standings = Standings::empty(EVENT_ID);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            &participants,
            |b, participants| {
                b.iter(|| pair(black_box(participants), &standings, 1, &policy));
            },
        );
    }

    group.finish();
}

/// Benchmark a late round where rematch avoidance has to work for its pairings
fn bench_late_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_late_round");
    let policy = PairingPolicy {
        tiebreaks: vec![Tiebreak::Buchholz, Tiebreak::Rating],
    };

    for (n_players, played) in [(9, 6), (33, 5), (129, 7)] {
        let (participants, standings) = setup(n_players, played, &policy);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players_round_{}", n_players, played + 1)),
            &participants,
            |b, participants| {
                b.iter(|| pair(black_box(participants), &standings, played + 1, &policy));
            },
        );
    }

    group.finish();
}

/// Benchmark standings recomputation from stored matches
fn bench_compute_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_standings");
    let policy = PairingPolicy::default();
    let scoring = ScoringConfig::default();

    for (n_players, rounds) in [(16, 4), (128, 7)] {
        let participants = field(n_players);
        let matches = history(&participants, rounds, &policy);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_matches", matches.len())),
            &matches,
            |b, matches| {
                b.iter(|| compute_standings(EVENT_ID, black_box(matches), &scoring));
            },
        );
    }

    group.finish();
}

/// Benchmark the feasibility oracle on a dense graph with a few edges removed
fn bench_matching_oracle(c: &mut Criterion) {
    let n = 64;
    let mut allowed = vec![vec![true; n]; n];
    for (i, row) in allowed.iter_mut().enumerate() {
        row[i] = false;
        row[(i + 1) % n] = false;
        row[(i + n - 1) % n] = false;
    }
    let vertices: Vec<usize> = (0..n).collect();

    c.bench_function("perfect_matching_64", |b| {
        b.iter(|| perfect_matching_exists(black_box(&allowed), black_box(&vertices)));
    });
}

criterion_group!(pairing, bench_first_round, bench_late_round);

criterion_group!(standings, bench_compute_standings, bench_matching_oracle);

criterion_main!(pairing, standings);
