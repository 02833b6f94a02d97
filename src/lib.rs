//! BoniBuddy - matchmaking service for people who want to share a meal
//!
//! This library provides the in-memory matchmaking engine: a waiting registry
//! that pairs time/location requests, a confirmation protocol that turns a
//! tentative pair into a mutually agreed introduction, and a thin HTTP adapter
//! for chat front-ends.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Coordinator, ExpiryPolicy, MatchResult, PairingError, PairingStats, SessionStore, WaitingRegistry};
pub use models::{ContactRef, Notice, Notification, PairId, PendingPair, Request, VoteOutcome};
