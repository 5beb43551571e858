//! Static content definitions.
//!
//! These structs mirror one entry of the content catalog document. They
//! are loaded once at startup and never mutated; all mutable progress
//! lives in [`GameState`](crate::GameState).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::effects::{Effect, Requirement};
use crate::enums::{ChallengeType, QuestRisk, UpgradeCurrency};
use crate::ids::{
    AchievementId, ChallengeId, ConspiracyId, EventId, GeneratorId, MatrixUpgradeId,
    PrestigeUpgradeId, QuestId, SkillId, UpgradeId,
};

/// A production unit with exponential cost and linear output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDef {
    /// Catalog key.
    pub id: GeneratorId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Price of the first unit.
    pub base_cost: f64,
    /// Price growth per owned unit.
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: f64,
    /// Evidence per second per unit before multipliers.
    pub base_production: f64,
    /// Believers recruited per second per unit before multipliers.
    #[serde(default)]
    pub believers_per_second: f64,
    /// Preconditions before the generator can be bought.
    #[serde(default)]
    pub requires: Vec<Requirement>,
}

/// A one-time upgrade from the evidence or tinfoil shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// Catalog key.
    pub id: UpgradeId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Which shop sells it.
    #[serde(default)]
    pub currency: UpgradeCurrency,
    /// Price in `currency`. Tinfoil prices are whole units.
    pub cost: f64,
    /// Preconditions before it can be bought.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// What it does once bought.
    pub effect: Effect,
}

/// A conspiracy the player can prove by spending evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConspiracyDef {
    /// Catalog key.
    pub id: ConspiracyId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Evidence spent to prove it.
    pub evidence_cost: f64,
    /// Available believers needed (not consumed).
    #[serde(default)]
    pub believers_required: f64,
    /// Tinfoil granted on proof.
    #[serde(default)]
    pub tinfoil_reward: u64,
    /// Preconditions before it can be proven.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Permanent (per run) effect once proven.
    pub effect: Effect,
}

/// A node in the skill tree, bought with tinfoil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    /// Catalog key.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Tinfoil price.
    pub tinfoil_cost: u64,
    /// Preconditions (typically parent skills).
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// What the skill does.
    pub effect: Effect,
}

/// A timed expedition that risks believers for rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    /// Catalog key.
    pub id: QuestId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Base duration before the duration multiplier.
    pub duration_seconds: f64,
    /// Believers reserved while the quest runs.
    pub believers_required: f64,
    /// Base success probability in `[0, 1]`.
    pub success_chance: f64,
    /// Failure policy.
    pub risk: QuestRisk,
    /// Evidence reward in seconds of EPS at resolution time.
    pub evidence_multiplier: f64,
    /// Flat tinfoil reward on success.
    #[serde(default)]
    pub tinfoil_reward: u64,
    /// Fraction of the intended evidence paid on a low-risk failure.
    #[serde(default = "default_fail_evidence_multiplier")]
    pub fail_evidence_multiplier: f64,
    /// Preconditions before the quest can be started.
    #[serde(default)]
    pub requires: Vec<Requirement>,
}

/// The counter an achievement watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AchievementKind {
    /// Lifetime evidence earned.
    TotalEvidence,
    /// Lifetime manual clicks.
    TotalClicks,
    /// Units of one generator currently owned.
    GeneratorOwned(GeneratorId),
    /// Conspiracies proven this run.
    ConspiraciesProven,
    /// Total play time in seconds.
    PlayTime,
    /// Illuminati Ascensions performed.
    TimesAscended,
    /// Matrix Breaks performed.
    TimesMatrixBroken,
    /// Quests resolved successfully.
    QuestsCompleted,
    /// Lifetime critical clicks.
    CriticalClicks,
}

/// A one-time unlock fired when a counter reaches a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Catalog key.
    pub id: AchievementId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Counter to watch.
    pub kind: AchievementKind,
    /// Unlock when the counter is at least this value.
    pub threshold: f64,
    /// Tinfoil granted on unlock.
    #[serde(default)]
    pub tinfoil_reward: u64,
    /// Optional permanent modifier granted on unlock.
    #[serde(default)]
    pub reward: Option<Effect>,
}

/// An Illuminati-tier upgrade bought with Illuminati tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeUpgradeDef {
    /// Catalog key.
    pub id: PrestigeUpgradeId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Token price.
    pub token_cost: u64,
    /// Another Illuminati upgrade that must be owned first.
    #[serde(default)]
    pub prerequisite: Option<PrestigeUpgradeId>,
    /// What it does.
    pub effect: Effect,
}

/// A Matrix-tier upgrade bought with glitch tokens. Never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixUpgradeDef {
    /// Catalog key.
    pub id: MatrixUpgradeId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Glitch token price.
    pub glitch_cost: u64,
    /// Another matrix upgrade that must be owned first.
    #[serde(default)]
    pub prerequisite: Option<MatrixUpgradeId>,
    /// What it does.
    pub effect: Effect,
}

/// A template from which daily challenges are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallengeTemplate {
    /// Catalog key.
    pub id: ChallengeId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Gameplay event counted.
    pub challenge_type: ChallengeType,
    /// Progress needed to complete.
    pub target: f64,
    /// Tinfoil granted when claimed.
    pub tinfoil_reward: u64,
}

/// What a random event does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RandomEventKind {
    /// Start (or extend) the Golden Eye click frenzy.
    GoldenEye,
    /// Instant evidence worth this many seconds of EPS.
    Windfall {
        /// Seconds of current EPS granted.
        eps_seconds: f64,
    },
    /// Instant tinfoil.
    TinfoilCache {
        /// Tinfoil granted.
        amount: u64,
    },
    /// A temporary modifier.
    Buff {
        /// The modifier applied while the buff lasts.
        effect: Effect,
        /// Buff duration.
        seconds: f64,
    },
}

/// A weighted random event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEventDef {
    /// Catalog key.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Relative selection weight.
    #[serde(default = "default_event_weight")]
    pub weight: u32,
    /// Flavor message emitted when the event fires.
    #[serde(default)]
    pub message: String,
    /// What happens.
    pub kind: RandomEventKind,
}

const fn default_cost_multiplier() -> f64 {
    1.15
}

const fn default_fail_evidence_multiplier() -> f64 {
    0.25
}

const fn default_event_weight() -> u32 {
    1
}
