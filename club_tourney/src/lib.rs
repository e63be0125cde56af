//! # Club Tourney
//!
//! Tournament lifecycle engine for club events: registration with
//! payment-gated confirmation, Swiss-paired rounds, match results and
//! standings.
//!
//! ## Architecture
//!
//! An event moves through a fixed pipeline:
//!
//! - **Registration Ledger**: pending, confirmed and cancelled registrations
//! - **Round Manager**: `scheduled -> active -> completed` rounds, one open round per event
//! - **Pairing Engine**: deterministic Swiss pairing with rematch avoidance and byes
//! - **Match Manager**: match start and result recording
//! - **Standings Calculator**: scores and tiebreaks recomputed from completed matches
//!
//! ## Core Modules
//!
//! - [`tournament`]: Engine components, models and errors
//! - [`db`]: Storage trait with in-memory and PostgreSQL implementations
//! - [`collaborators`]: Payment verifier and participant directory seams
//!
//! ## Example
//!
//! ```
//! use club_tourney::tournament::{PairingPolicy, Participant, Standings, pair};
//!
//! let players = [Participant::new(1, 1500), Participant::new(2, 1400), Participant::new(3, 1300)];
//! let pairings = pair(&players, &Standings::empty(1), 1, &PairingPolicy::default());
//! assert_eq!(pairings.len(), 2);
//! ```

/// External collaborators: payment verification and participant directory.
pub mod collaborators;

/// Database connection pooling and tournament storage.
pub mod db;

/// Tournament engine.
pub mod tournament;

pub use tournament::{
    EngineConfig, ErrorKind, TournamentError, TournamentManager, TournamentResult,
};
