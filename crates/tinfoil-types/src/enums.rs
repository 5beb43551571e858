//! Enumeration types for the Tinfoil engine.
//!
//! Plain (data-less) enumerations: resources, quest risk, achievement and
//! challenge categories, prestige tiers, and the field keys of the
//! retained/reset table applied on prestige.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A balance tracked by the resource ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Primary resource, produced by clicks and generators.
    Evidence,
    /// Secondary currency from quests, achievements and events.
    Tinfoil,
    /// Population recruited by generators and risked on quests.
    Believers,
    /// First-tier prestige currency.
    IlluminatiTokens,
    /// Second-tier prestige currency.
    GlitchTokens,
}

/// The currency an [`UpgradeDef`](crate::UpgradeDef) is priced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum UpgradeCurrency {
    /// Bought with evidence; stored in `purchased_upgrades`.
    #[default]
    Evidence,
    /// Bought in the tinfoil shop; stored in `purchased_tinfoil_upgrades`.
    Tinfoil,
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// Failure policy of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum QuestRisk {
    /// Failure pays a partial reward; believers always come back.
    Low,
    /// Failure pays nothing; believers always come back.
    Medium,
    /// Failure pays nothing and the sent believers are lost unless a
    /// protective upgrade is active.
    High,
}

// ---------------------------------------------------------------------------
// Daily challenges
// ---------------------------------------------------------------------------

/// The gameplay event a daily challenge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ChallengeType {
    /// Manual clicks.
    Clicks,
    /// Critical clicks.
    CriticalClicks,
    /// Evidence earned from any source.
    EarnEvidence,
    /// Generators bought.
    PurchaseGenerators,
    /// Upgrades bought (either shop).
    PurchaseUpgrades,
    /// Quests that resolved successfully.
    CompleteQuests,
    /// Combo meter bursts.
    ComboBursts,
}

// ---------------------------------------------------------------------------
// Prestige
// ---------------------------------------------------------------------------

/// The two prestige tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PrestigeTier {
    /// Illuminati Ascension.
    Ascension,
    /// Matrix Break.
    MatrixBreak,
}

/// A group of [`GameState`](crate::GameState) fields that the prestige
/// reset table decides to keep or clear.
///
/// Achievements, matrix upgrades, lifetime counters and the glitch token
/// balance are not listed: they are never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResetField {
    /// Current evidence balance and per-run evidence earned.
    Evidence,
    /// Generator counts.
    Generators,
    /// Evidence-priced upgrades.
    Upgrades,
    /// Tinfoil shop upgrades.
    TinfoilUpgrades,
    /// Tinfoil balance.
    Tinfoil,
    /// Believers (total and available).
    Believers,
    /// Running quests (reserved believers are dropped with them).
    ActiveQuests,
    /// Proven conspiracies.
    Conspiracies,
    /// Unlocked skills.
    Skills,
    /// Combo meter and combo clicks.
    Combo,
    /// Golden Eye and temporary buffs.
    Buffs,
    /// Illuminati upgrades.
    IlluminatiUpgrades,
    /// Illuminati token balance.
    IlluminatiTokens,
}

/// What a prestige tier does to one [`ResetField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResetAction {
    /// Clear the field back to its new-game value.
    Reset,
    /// Carry the field over unchanged.
    Retain,
}

// ---------------------------------------------------------------------------
// Modifier sources
// ---------------------------------------------------------------------------

/// Where an active modifier comes from, in pipeline fold order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ModifierSource {
    /// Evidence-priced upgrade.
    Upgrade,
    /// Tinfoil shop upgrade.
    TinfoilUpgrade,
    /// Proven conspiracy.
    Conspiracy,
    /// Skill-tree node.
    Skill,
    /// Achievement reward.
    Achievement,
    /// Illuminati upgrade.
    IlluminatiUpgrade,
    /// Matrix upgrade.
    MatrixUpgrade,
    /// Temporary buff from a random event.
    Buff,
}
