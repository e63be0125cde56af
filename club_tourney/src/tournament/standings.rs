//! Standings calculator.
//!
//! Standings are never stored as a source of truth. [`compute_standings`] is a
//! pure function over completed matches; [`StandingsCalculator`] wraps it with a
//! per-event cache that is refreshed when a round completes.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    config::ScoringConfig,
    context::EngineContext,
    errors::TournamentResult,
    models::{EventId, Match, MatchOutcome, MatchStatus, ParticipantId, RoundId, RoundStatus},
};

/// Per-participant standings line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsEntry {
    pub participant_id: ParticipantId,
    /// 1-based position
    pub rank: u32,
    pub score: f64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub byes: u32,
    /// Games against an opponent (byes excluded)
    pub games_played: u32,
    /// Sum of the scores of every opponent faced
    pub buchholz: f64,
    pub opponents_faced: BTreeSet<ParticipantId>,
}

/// Standings of one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standings {
    pub event_id: EventId,
    /// Highest round number with a counted result
    pub through_round: u32,
    pub entries: Vec<StandingsEntry>,
    #[serde(skip)]
    index: HashMap<ParticipantId, usize>,
}

impl Standings {
    /// Standings before any result exists
    pub fn empty(event_id: EventId) -> Self {
        Self {
            event_id,
            through_round: 0,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn entry(&self, participant_id: ParticipantId) -> Option<&StandingsEntry> {
        self.index.get(&participant_id).map(|&i| &self.entries[i])
    }

    /// Current score, zero for participants without results
    pub fn score(&self, participant_id: ParticipantId) -> f64 {
        self.entry(participant_id).map_or(0.0, |e| e.score)
    }

    pub fn byes(&self, participant_id: ParticipantId) -> u32 {
        self.entry(participant_id).map_or(0, |e| e.byes)
    }

    pub fn buchholz(&self, participant_id: ParticipantId) -> f64 {
        self.entry(participant_id).map_or(0.0, |e| e.buchholz)
    }

    pub fn wins(&self, participant_id: ParticipantId) -> u32 {
        self.entry(participant_id).map_or(0, |e| e.wins)
    }

    /// Whether the two participants already met in this event
    pub fn have_played(&self, a: ParticipantId, b: ParticipantId) -> bool {
        self.entry(a)
            .is_some_and(|e| e.opponents_faced.contains(&b))
    }
}

#[derive(Default)]
struct Tally {
    score: f64,
    wins: u32,
    draws: u32,
    losses: u32,
    byes: u32,
    /// One entry per game, so repeat opponents count twice in Buchholz
    opponents: Vec<ParticipantId>,
}

/// Compute standings from the matches of an event
///
/// Only completed matches with a result are counted. Matches are folded in
/// `(round, board, id)` order so the result does not depend on the order in
/// which results were recorded.
pub fn compute_standings(
    event_id: EventId,
    matches: &[Match],
    scoring: &ScoringConfig,
) -> Standings {
    let mut counted: Vec<&Match> = matches
        .iter()
        .filter(|m| m.event_id == event_id && m.status == MatchStatus::Completed)
        .filter(|m| m.result.is_some())
        .collect();
    counted.sort_by_key(|m| (m.round_number, m.board, m.id));

    let mut tallies: BTreeMap<ParticipantId, Tally> = BTreeMap::new();
    let mut through_round = 0;

    for m in counted {
        let Some(outcome) = m.result else { continue };
        through_round = through_round.max(m.round_number);

        match (m.player2, outcome) {
            (None, _) | (_, MatchOutcome::Bye) => {
                let tally = tallies.entry(m.player1).or_default();
                tally.score += scoring.bye;
                tally.byes += 1;
            }
            (Some(player2), outcome) => {
                let (p1_points, p2_points) = match outcome {
                    MatchOutcome::Player1Win => (scoring.win, scoring.loss),
                    MatchOutcome::Player2Win => (scoring.loss, scoring.win),
                    _ => (scoring.draw, scoring.draw),
                };

                let p1 = tallies.entry(m.player1).or_default();
                p1.score += p1_points;
                p1.opponents.push(player2);
                match outcome {
                    MatchOutcome::Player1Win => p1.wins += 1,
                    MatchOutcome::Player2Win => p1.losses += 1,
                    _ => p1.draws += 1,
                }

                let p2 = tallies.entry(player2).or_default();
                p2.score += p2_points;
                p2.opponents.push(m.player1);
                match outcome {
                    MatchOutcome::Player2Win => p2.wins += 1,
                    MatchOutcome::Player1Win => p2.losses += 1,
                    _ => p2.draws += 1,
                }
            }
        }
    }

    let scores: HashMap<ParticipantId, f64> =
        tallies.iter().map(|(&id, t)| (id, t.score)).collect();

    let mut entries: Vec<StandingsEntry> = tallies
        .into_iter()
        .map(|(participant_id, tally)| {
            let buchholz = tally
                .opponents
                .iter()
                .map(|o| scores.get(o).copied().unwrap_or(0.0))
                .sum();
            StandingsEntry {
                participant_id,
                rank: 0,
                score: tally.score,
                wins: tally.wins,
                draws: tally.draws,
                losses: tally.losses,
                byes: tally.byes,
                games_played: tally.opponents.len() as u32,
                buchholz,
                opponents_faced: tally.opponents.into_iter().collect(),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.buchholz.total_cmp(&a.buchholz))
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i as u32 + 1;
    }

    let index = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.participant_id, i))
        .collect();

    Standings {
        event_id,
        through_round,
        entries,
        index,
    }
}

/// Last computed standings per event
#[derive(Default)]
pub struct StandingsCache {
    entries: RwLock<HashMap<EventId, Arc<Standings>>>,
}

impl StandingsCache {
    pub async fn get(&self, event_id: EventId) -> Option<Arc<Standings>> {
        self.entries.read().await.get(&event_id).cloned()
    }

    /// Store `standings` unless the cache already holds a later round
    ///
    /// Returns whichever standings the cache holds afterwards.
    pub async fn put(&self, standings: Arc<Standings>) -> Arc<Standings> {
        let mut entries = self.entries.write().await;
        match entries.get(&standings.event_id) {
            Some(current) if current.through_round > standings.through_round => current.clone(),
            _ => {
                entries.insert(standings.event_id, standings.clone());
                standings
            }
        }
    }

    pub async fn invalidate(&self, event_id: EventId) {
        self.entries.write().await.remove(&event_id);
    }
}

/// Read-only standings surface
#[derive(Clone)]
pub struct StandingsCalculator {
    ctx: Arc<EngineContext>,
}

impl StandingsCalculator {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Recompute standings for an event from its stored matches and refresh the cache
    ///
    /// Idempotent: the same set of completed matches always yields the same standings.
    pub async fn recompute(&self, event_id: EventId) -> TournamentResult<Arc<Standings>> {
        let computed = Arc::new(self.snapshot(event_id).await?);
        let standings = self.ctx.standings.put(computed).await;

        log::debug!(
            "Recomputed standings for event {} through round {} ({} entries)",
            event_id,
            standings.through_round,
            standings.entries.len()
        );

        Ok(standings)
    }

    /// Drop the cached standings of an event so the next read recomputes them
    pub(crate) async fn invalidate(&self, event_id: EventId) {
        self.ctx.standings.invalidate(event_id).await;
    }

    /// Cached standings, computed on first read
    pub async fn standings(&self, event_id: EventId) -> TournamentResult<Arc<Standings>> {
        if let Some(cached) = self.ctx.standings.get(event_id).await {
            return Ok(cached);
        }
        self.recompute(event_id).await
    }

    /// Uncached computation over completed rounds, used as pairing input
    pub(crate) async fn snapshot(&self, event_id: EventId) -> TournamentResult<Standings> {
        self.ctx.load_event(event_id).await?;

        let completed: HashSet<RoundId> = self
            .ctx
            .store
            .rounds(event_id)
            .await?
            .into_iter()
            .filter(|r| r.status == RoundStatus::Completed)
            .map(|r| r.id)
            .collect();

        let mut matches = self.ctx.store.event_matches(event_id).await?;
        matches.retain(|m| completed.contains(&m.round_id));

        Ok(compute_standings(
            event_id,
            &matches,
            &self.ctx.config.scoring,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(
        id: i64,
        round_number: u32,
        player1: ParticipantId,
        player2: Option<ParticipantId>,
        outcome: MatchOutcome,
    ) -> Match {
        Match {
            id,
            round_id: round_number as i64,
            event_id: 1,
            round_number,
            board: id as u32,
            player1,
            player2,
            status: MatchStatus::Completed,
            result: Some(outcome),
            score: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_scores_and_byes() {
        let matches = vec![
            completed(1, 1, 1, Some(2), MatchOutcome::Player1Win),
            completed(2, 1, 3, Some(4), MatchOutcome::Draw),
            completed(3, 1, 5, None, MatchOutcome::Bye),
        ];
        let standings = compute_standings(1, &matches, &ScoringConfig::default());

        assert_eq!(standings.score(1), 1.0);
        assert_eq!(standings.score(2), 0.0);
        assert_eq!(standings.score(3), 0.5);
        assert_eq!(standings.score(5), 1.0);
        assert_eq!(standings.byes(5), 1);
        assert_eq!(standings.entry(5).unwrap().games_played, 0);
        assert!(standings.have_played(1, 2));
        assert!(standings.have_played(2, 1));
        assert!(!standings.have_played(1, 3));
        assert_eq!(standings.through_round, 1);
    }

    #[test]
    fn test_ignores_unfinished_matches() {
        let mut open = completed(1, 1, 1, Some(2), MatchOutcome::Player1Win);
        open.status = MatchStatus::InProgress;
        open.result = None;

        let standings = compute_standings(1, &[open], &ScoringConfig::default());
        assert!(standings.entries.is_empty());
        assert_eq!(standings.through_round, 0);
    }

    #[test]
    fn test_buchholz_and_ranking() {
        // 1 beats 2, 3 beats 4, then 1 beats 3 and 2 beats 4
        let matches = vec![
            completed(1, 1, 1, Some(2), MatchOutcome::Player1Win),
            completed(2, 1, 3, Some(4), MatchOutcome::Player1Win),
            completed(3, 2, 1, Some(3), MatchOutcome::Player1Win),
            completed(4, 2, 2, Some(4), MatchOutcome::Player1Win),
        ];
        let standings = compute_standings(1, &matches, &ScoringConfig::default());

        let order: Vec<_> = standings.entries.iter().map(|e| e.participant_id).collect();
        // 2 and 3 both have 1 point; 3 faced 4 (0) and 1 (2) => 2, 2 faced 1 (2) and 4 (0) => 2
        // equal Buchholz and wins, so id breaks the tie
        assert_eq!(order, vec![1, 2, 3, 4]);
        assert_eq!(standings.buchholz(1), 2.0);
        assert_eq!(standings.entry(4).unwrap().losses, 2);
        assert_eq!(standings.entry(1).unwrap().rank, 1);
    }

    #[test]
    fn test_custom_scoring() {
        let scoring = ScoringConfig {
            win: 3.0,
            draw: 1.0,
            loss: 0.0,
            bye: 2.0,
        };
        let matches = vec![
            completed(1, 1, 1, Some(2), MatchOutcome::Player2Win),
            completed(2, 1, 3, None, MatchOutcome::Bye),
        ];
        let standings = compute_standings(1, &matches, &scoring);
        assert_eq!(standings.score(2), 3.0);
        assert_eq!(standings.score(3), 2.0);
        assert_eq!(standings.score(1), 0.0);
    }

    #[test]
    fn test_recompute_is_order_independent() {
        let matches = vec![
            completed(1, 1, 1, Some(2), MatchOutcome::Player1Win),
            completed(2, 1, 3, Some(4), MatchOutcome::Draw),
            completed(3, 2, 1, Some(3), MatchOutcome::Player2Win),
            completed(4, 2, 2, Some(4), MatchOutcome::Draw),
        ];
        let mut reversed = matches.clone();
        reversed.reverse();

        let scoring = ScoringConfig::default();
        assert_eq!(
            compute_standings(1, &matches, &scoring),
            compute_standings(1, &reversed, &scoring)
        );
    }

    #[tokio::test]
    async fn test_cache_keeps_later_round() {
        let scoring = ScoringConfig::default();
        let round_one = vec![completed(1, 1, 1, Some(2), MatchOutcome::Player1Win)];
        let mut round_two = round_one.clone();
        round_two.push(completed(2, 2, 1, Some(2), MatchOutcome::Draw));

        let cache = StandingsCache::default();
        let newer = Arc::new(compute_standings(1, &round_two, &scoring));
        let older = Arc::new(compute_standings(1, &round_one, &scoring));

        cache.put(newer.clone()).await;
        // A read that started before round 2 completed finishes late
        let kept = cache.put(older).await;

        assert_eq!(kept.through_round, 2);
        assert_eq!(cache.get(1).await.unwrap().through_round, 2);
        assert_eq!(cache.get(1).await.unwrap().score(1), 1.5);

        cache.invalidate(1).await;
        assert!(cache.get(1).await.is_none());
    }
}
