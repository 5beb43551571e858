//! Simulation engine for the Tinfoil incremental game.
//!
//! This crate owns the deterministic economic model (resource flow,
//! generator cost curves, multiplier composition), click and combo
//! resolution, the quest state machine, the two-tier prestige ladder and
//! the achievement and daily challenge loops, plus the session runner
//! that drives them on a fixed tick.
//!
//! # Modules
//!
//! - [`catalog`] -- Load-once content tables keyed by id.
//! - [`config`] -- Configuration loading from `tinfoil-config.yaml` into
//!   strongly-typed structs, including the prestige reset table.
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`multiplier`] -- Folds every active effect into composite stats.
//! - [`market`] -- Generator prices, bulk purchase math, production.
//! - [`click`] -- Click power, criticals, the combo meter.
//! - [`quest`] -- Timed quests with risk-dependent failure policies.
//! - [`shop`] -- Upgrades, conspiracies, skills and prestige upgrades.
//! - [`achievement`] -- Threshold unlocks over monotonic counters.
//! - [`prestige`] -- Illuminati Ascension and Matrix Break.
//! - [`daily`] -- Date-seeded daily challenges.
//! - [`events`] -- Random events, buffs, the Golden Eye, flavor text.
//! - [`offline`] -- Catch-up for time spent with the game closed.
//! - [`persistence`] -- Save slots behind the [`SaveStore`] trait.
//! - [`engine`] -- [`GameEngine`], the intent API and the tick.
//! - [`runner`] -- The async session loop.
//! - [`numbers`] -- Number formatting and float helpers.
//! - [`rejection`] -- Why an intent was refused.
//!
//! [`Clock`]: clock::Clock
//! [`SaveStore`]: persistence::SaveStore
//! [`GameEngine`]: engine::GameEngine

pub mod achievement;
pub mod catalog;
pub mod click;
pub mod clock;
pub mod config;
pub mod daily;
pub mod engine;
pub mod events;
pub mod market;
pub mod multiplier;
pub mod numbers;
pub mod offline;
pub mod persistence;
pub mod prestige;
pub mod quest;
pub mod rejection;
pub mod runner;
pub mod shop;

pub use catalog::ContentCatalog;
pub use config::EngineConfig;
pub use engine::GameEngine;
