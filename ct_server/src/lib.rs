//! HTTP server for the club tournament engine.
//!
//! Wires [`club_tourney`] to an axum router with bearer authentication,
//! request correlation, structured logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
