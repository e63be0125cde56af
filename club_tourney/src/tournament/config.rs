//! Engine configuration: scoring convention, pairing policy and timeouts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Points awarded per outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    /// A bye scores as a win by convention
    pub bye: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            win: 1.0,
            draw: 0.5,
            loss: 0.0,
            bye: 1.0,
        }
    }
}

/// Secondary ordering applied after score when ranking participants for pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tiebreak {
    /// Directory rating, higher first
    Rating,
    /// Sum of opponents' scores, higher first
    Buchholz,
    /// Number of wins, higher first
    Wins,
}

impl FromStr for Tiebreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rating" => Ok(Tiebreak::Rating),
            "buchholz" => Ok(Tiebreak::Buchholz),
            "wins" => Ok(Tiebreak::Wins),
            other => Err(format!("unknown tiebreak '{other}'")),
        }
    }
}

/// Swiss pairing policy
///
/// Participant id is always the final tiebreak so ranking stays total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingPolicy {
    pub tiebreaks: Vec<Tiebreak>,
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self {
            tiebreaks: vec![Tiebreak::Rating],
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub pairing: PairingPolicy,
    /// Bound on payment verification when the caller supplies none
    pub payment_timeout: Duration,
    /// Page size used when streaming a player's matches
    pub player_matches_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            pairing: PairingPolicy::default(),
            payment_timeout: Duration::from_secs(5),
            player_matches_page_size: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_convention() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.win, 1.0);
        assert_eq!(scoring.draw, 0.5);
        assert_eq!(scoring.loss, 0.0);
        assert_eq!(scoring.bye, scoring.win);
    }

    #[test]
    fn test_tiebreak_parse() {
        assert_eq!("Rating".parse::<Tiebreak>(), Ok(Tiebreak::Rating));
        assert_eq!(" buchholz ".parse::<Tiebreak>(), Ok(Tiebreak::Buchholz));
        assert!("coin_flip".parse::<Tiebreak>().is_err());
    }
}
