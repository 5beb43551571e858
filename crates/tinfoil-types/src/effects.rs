//! Tagged effect and requirement variants.
//!
//! Every upgrade-like definition carries one [`Effect`]; the multiplier
//! pipeline matches on it exhaustively, so a new effect kind cannot be
//! added without deciding how it folds. [`Requirement`] gates when a
//! definition becomes purchasable.
//!
//! Both use adjacent tagging so content files read naturally:
//!
//! ```yaml
//! effect: { kind: click_multiplier, value: 2.0 }
//! effect: { kind: generator_multiplier, value: { generator: red_string, factor: 2.0 } }
//! effect: { kind: guaranteed_quest_success }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ResetField;
use crate::ids::{ConspiracyId, GeneratorId, SkillId, UpgradeId};

/// A typed modifier contributed by a purchase, achievement or buff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Effect {
    /// Flat bonus added to base click power.
    ClickPower(f64),
    /// Factor applied to click power.
    ClickMultiplier(f64),
    /// Fraction of EPS added to each click (flat, added to the base fraction).
    EpsPerClick(f64),
    /// Factor applied to one generator's production only.
    GeneratorMultiplier {
        /// The generator whose output is boosted.
        generator: GeneratorId,
        /// Production factor.
        factor: f64,
    },
    /// Additive fraction on global production (0.1 = +10%).
    ProductionBonus(f64),
    /// Factor applied to global production.
    ProductionMultiplier(f64),
    /// Factor applied to believer recruitment.
    BelieverMultiplier(f64),
    /// Additive bonus to quest success chance (still capped).
    QuestSuccessBonus(f64),
    /// Factor applied to quest durations (0.8 = 20% shorter).
    QuestDurationMultiplier(f64),
    /// Additive critical-hit chance.
    CritChance(f64),
    /// Factor applied to the critical damage multiplier.
    CritDamageMultiplier(f64),
    /// Factor applied to the per-click combo increment.
    ComboRateMultiplier(f64),
    /// Factor applied to the Golden Eye click factor.
    GoldenEyeMultiplier(f64),
    /// Additive fraction on offline production efficiency.
    OfflineEfficiency(f64),
    /// Factor applied to Illuminati token yield.
    TokenMultiplier(f64),
    /// Evidence credited at the start of every new run.
    StartingEvidence(f64),
    /// Believers sent on a failed high-risk quest come back.
    ProtectHighRiskBelievers,
    /// Quests always succeed, bypassing the success cap.
    GuaranteedQuestSuccess,
    /// Keep a field across Illuminati Ascension.
    RetainOnAscension(ResetField),
}

/// A precondition for buying or starting a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Requirement {
    /// Lifetime evidence earned is at least this much.
    TotalEvidence(f64),
    /// At least `count` of a generator are owned.
    GeneratorOwned {
        /// The generator to count.
        generator: GeneratorId,
        /// Minimum owned.
        count: u32,
    },
    /// An evidence or tinfoil upgrade has been purchased.
    Upgrade(UpgradeId),
    /// A conspiracy has been proven.
    Conspiracy(ConspiracyId),
    /// A skill has been unlocked.
    Skill(SkillId),
    /// The player has ascended at least this many times.
    TimesAscended(u32),
}
