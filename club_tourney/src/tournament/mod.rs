//! Tournament lifecycle engine.
//!
//! This module provides the registration, round, match and standings pipeline
//! for competitive events:
//! - Registration with payment-gated confirmation
//! - Round creation with Swiss pairing
//! - Match start and result recording
//! - Standings with tiebreak metrics, recomputed from stored results
//!
//! ## Example
//!
//! ```no_run
//! use club_tourney::collaborators::{MemoryParticipantDirectory, MemoryPaymentVerifier};
//! use club_tourney::db::MemoryStore;
//! use club_tourney::tournament::{EngineConfig, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(MemoryPaymentVerifier::with_valid(["PAY-0001"])),
//!         Arc::new(MemoryParticipantDirectory::permissive()),
//!         EngineConfig::default(),
//!     );
//!
//!     let standings = manager.standings().standings(1).await?;
//!     println!("{} participants ranked", standings.entries.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub(crate) mod context;
pub mod errors;
pub(crate) mod locks;
pub mod manager;
pub mod matches;
pub mod matching;
pub mod models;
pub mod pairing;
pub mod registration;
pub mod rounds;
pub mod standings;

pub use config::{EngineConfig, PairingPolicy, ScoringConfig, Tiebreak};
pub use errors::{ErrorKind, PaymentFailure, TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use matches::{MatchManager, PlayerMatches};
pub use models::{
    Event, EventId, EventInfo, EventStatus, EventType, Match, MatchId, MatchOutcome, MatchStatus,
    NewEvent, ParticipantId, Registration, RegistrationId, RegistrationStatus,
    RegistrationWindow, ResultSubmission, Round, RoundDetail, RoundId, RoundStatus, ScoreDetail,
};
pub use pairing::{Pairing, Participant, pair};
pub use registration::RegistrationLedger;
pub use rounds::RoundManager;
pub use standings::{Standings, StandingsCalculator, StandingsEntry, compute_standings};
