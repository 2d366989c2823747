//! Meepo is You: a rule-rewriting block puzzle.
//!
//! `domain` holds the pure rule and movement logic, `sim` owns the game
//! state value and the tick pipeline, `config` reads `config.toml`.
//! The terminal front-end lives in the binary.

pub mod config;
pub mod domain;
pub mod sim;
