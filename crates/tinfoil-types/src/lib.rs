//! Shared type definitions for the Tinfoil incremental game engine.
//!
//! This crate is the single source of truth for all types used across the
//! Tinfoil workspace. Types that cross into the presentation layer flow
//! downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe catalog keys and quest run ids
//! - [`enums`] -- Plain enumerations (resources, risk, tiers, reset fields)
//! - [`effects`] -- Tagged [`Effect`] and [`Requirement`] variants
//! - [`content`] -- Static content definitions loaded by the catalog
//! - [`state`] -- The mutable [`GameState`] aggregate
//! - [`notifications`] -- Engine notifications and save slot metadata

pub mod content;
pub mod effects;
pub mod enums;
pub mod ids;
pub mod notifications;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use content::{
    AchievementDef, AchievementKind, ConspiracyDef, DailyChallengeTemplate, GeneratorDef,
    MatrixUpgradeDef, PrestigeUpgradeDef, QuestDef, RandomEventDef, RandomEventKind, SkillDef,
    UpgradeDef,
};
pub use effects::{Effect, Requirement};
pub use enums::{
    ChallengeType, ModifierSource, PrestigeTier, QuestRisk, ResetAction, ResetField, Resource,
    UpgradeCurrency,
};
pub use ids::{
    AchievementId, ChallengeId, ConspiracyId, EventId, GeneratorId, MatrixUpgradeId,
    PrestigeUpgradeId, QuestId, QuestRunId, SkillId, UpgradeId,
};
pub use notifications::{Notification, SlotInfo};
pub use state::{ActiveBuff, ActiveQuest, Balances, GameState, StoredChallenge};
