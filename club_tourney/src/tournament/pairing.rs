//! Swiss pairing engine.
//!
//! [`pair`] is a pure function of the participant pool, the standings to date
//! and the round number. It never consults a clock or a random source, so the
//! same inputs always produce the same pairings.
//!
//! ## Algorithm
//!
//! 1. Rank by score descending, then by the configured tiebreaks, then by id.
//! 2. With an odd pool, the lowest ranked participant without a prior bye sits
//!    out, provided the rest can still be paired without a rematch.
//! 3. Walk the ranking top-down. Each unpaired participant takes the nearest
//!    unpaired participant by rank whom they have not met, as long as the rest
//!    can still be paired rematch-free.
//! 4. When no rematch-free pairing of the whole pool exists, fall back to a
//!    relaxed greedy pass that allows rematches instead of dropping anyone.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{
    config::{PairingPolicy, Tiebreak},
    matching::perfect_matching_exists,
    models::ParticipantId,
    standings::Standings,
};

/// Pairing input: a confirmed participant and their directory rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub rating: i32,
}

impl Participant {
    pub fn new(id: ParticipantId, rating: i32) -> Self {
        Self { id, rating }
    }
}

/// One line of a round's pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pairing {
    Match {
        player1: ParticipantId,
        player2: ParticipantId,
    },
    Bye {
        player: ParticipantId,
    },
}

impl Pairing {
    pub fn involves(&self, participant_id: ParticipantId) -> bool {
        match *self {
            Pairing::Match { player1, player2 } => {
                player1 == participant_id || player2 == participant_id
            }
            Pairing::Bye { player } => player == participant_id,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Pairing::Bye { .. })
    }
}

/// Pair `participants` for round `round_number`
///
/// # Arguments
///
/// * `participants` - Confirmed participants; duplicates are ignored
/// * `standings` - Standings from every completed match so far
/// * `round_number` - 1-based number of the round being paired
/// * `policy` - Tiebreak order applied after score
///
/// # Returns
///
/// Matches in board order followed by the bye, if any. Every participant
/// appears exactly once. The higher ranked player of a match is `player1` on
/// odd rounds and `player2` on even rounds.
pub fn pair(
    participants: &[Participant],
    standings: &Standings,
    round_number: u32,
    policy: &PairingPolicy,
) -> Vec<Pairing> {
    let ranked = rank(participants, standings, policy);
    let n = ranked.len();
    if n == 0 {
        return Vec::new();
    }

    let allowed: Vec<Vec<bool>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| i != j && !standings.have_played(ranked[i].id, ranked[j].id))
                .collect()
        })
        .collect();

    let bye = (n % 2 == 1).then(|| select_bye(&ranked, standings, &allowed));
    let pool: Vec<usize> = (0..n).filter(|&i| Some(i) != bye).collect();

    let pairs = if perfect_matching_exists(&allowed, &pool) {
        pair_strict(&allowed, &pool)
    } else {
        log::debug!(
            "No rematch-free pairing for {} participant(s) in round {}, allowing rematches",
            pool.len(),
            round_number
        );
        pair_relaxed(&allowed, &pool)
    };

    let higher_is_white = round_number % 2 == 1;
    let mut pairings: Vec<Pairing> = pairs
        .into_iter()
        .map(|(high, low)| {
            let (player1, player2) = if higher_is_white {
                (ranked[high].id, ranked[low].id)
            } else {
                (ranked[low].id, ranked[high].id)
            };
            Pairing::Match { player1, player2 }
        })
        .collect();

    if let Some(bye) = bye {
        pairings.push(Pairing::Bye {
            player: ranked[bye].id,
        });
    }

    pairings
}

/// Deduplicate and order participants for pairing, best first
fn rank(
    participants: &[Participant],
    standings: &Standings,
    policy: &PairingPolicy,
) -> Vec<Participant> {
    let mut pool = participants.to_vec();
    pool.sort_by_key(|p| p.id);
    pool.dedup_by_key(|p| p.id);

    pool.sort_by(|a, b| {
        standings
            .score(b.id)
            .total_cmp(&standings.score(a.id))
            .then_with(|| {
                policy
                    .tiebreaks
                    .iter()
                    .map(|tiebreak| compare_tiebreak(*tiebreak, a, b, standings))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });

    pool
}

fn compare_tiebreak(
    tiebreak: Tiebreak,
    a: &Participant,
    b: &Participant,
    standings: &Standings,
) -> Ordering {
    match tiebreak {
        Tiebreak::Rating => b.rating.cmp(&a.rating),
        Tiebreak::Buchholz => standings.buchholz(b.id).total_cmp(&standings.buchholz(a.id)),
        Tiebreak::Wins => standings.wins(b.id).cmp(&standings.wins(a.id)),
    }
}

/// Rank index of the participant who sits out this round
///
/// Only participants without a prior bye are eligible while any remain. Among
/// them the lowest ranked whose bye leaves a rematch-free pairing is chosen,
/// otherwise the lowest ranked of them, and the rematch fallback takes over.
/// Once everyone has had a bye, the lowest ranked sits out again.
fn select_bye(ranked: &[Participant], standings: &Standings, allowed: &[Vec<bool>]) -> usize {
    let n = ranked.len();
    let feasible = |candidate: usize| {
        let rest: Vec<usize> = (0..n).filter(|&i| i != candidate).collect();
        perfect_matching_exists(allowed, &rest)
    };

    let fresh: Vec<usize> = (0..n)
        .rev()
        .filter(|&i| standings.byes(ranked[i].id) == 0)
        .collect();

    fresh
        .iter()
        .copied()
        .find(|&i| feasible(i))
        .or_else(|| fresh.first().copied())
        .unwrap_or(n - 1)
}

/// Greedy by rank distance, keeping the remainder rematch-free matchable
///
/// `pool` must admit a rematch-free perfect matching.
fn pair_strict(allowed: &[Vec<bool>], pool: &[usize]) -> Vec<(usize, usize)> {
    let mut remaining = pool.to_vec();
    let mut pairs = Vec::with_capacity(pool.len() / 2);

    while remaining.len() >= 2 {
        let top = remaining[0];
        let partner = (1..remaining.len())
            .filter(|&k| allowed[top][remaining[k]])
            .find(|&k| {
                let rest: Vec<usize> = remaining
                    .iter()
                    .enumerate()
                    .filter(|&(idx, _)| idx != 0 && idx != k)
                    .map(|(_, &v)| v)
                    .collect();
                perfect_matching_exists(allowed, &rest)
            });

        // Feasibility is maintained, so a partner always exists; stay total regardless
        let k = partner.unwrap_or(1);
        pairs.push((top, remaining[k]));
        remaining.remove(k);
        remaining.remove(0);
    }

    pairs
}

/// Greedy by rank distance, preferring a new opponent but accepting a rematch
fn pair_relaxed(allowed: &[Vec<bool>], pool: &[usize]) -> Vec<(usize, usize)> {
    let mut remaining = pool.to_vec();
    let mut pairs = Vec::with_capacity(pool.len() / 2);

    while remaining.len() >= 2 {
        let top = remaining[0];
        let k = (1..remaining.len())
            .find(|&k| allowed[top][remaining[k]])
            .unwrap_or(1);
        pairs.push((top, remaining[k]));
        remaining.remove(k);
        remaining.remove(0);
    }

    pairs
}
