//! Timed word-formation game engine.
//!
//! A round hands the player a pool of letters and a countdown. Each
//! submitted word is checked against the pool's letter multiset and the
//! dictionary, then scored by length. `services::game::Game` ties the
//! pieces together; `handlers` exposes it over HTTP.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use config::GameConfig;
pub use services::game::{Game, GameError, RoundEvent, RoundSnapshot, RoundSummary};
pub use services::round::{Rejection, Submission};
