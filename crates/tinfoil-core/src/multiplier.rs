//! The multiplier pipeline.
//!
//! Every purchase, achievement reward and active buff contributes one
//! [`Effect`]. [`Multipliers::compute`] folds all of them into a set of
//! stats, each evaluated as `(base + sum of flat bonuses) * product of
//! factors`. The fold is a pure function of `(GameState, ContentCatalog,
//! EngineConfig, now)`: it never mutates and visits sources in a fixed
//! order, so identical inputs give bit-identical results.
//!
//! # Fold order
//!
//! Upgrades, tinfoil upgrades, conspiracies, skills, achievements,
//! Illuminati upgrades, matrix upgrades, active buffs. Within a source,
//! ids are visited in sorted order; buffs in the order they were granted.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tinfoil_types::{Effect, GameState, GeneratorId, ModifierSource, ResetField};

use crate::catalog::ContentCatalog;
use crate::config::EngineConfig;

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// One composable stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stat {
    /// Value before any modifier.
    pub base: f64,
    /// Sum of flat bonuses.
    pub flat: f64,
    /// Product of multiplicative factors.
    pub factor: f64,
}

impl Stat {
    const fn new(base: f64) -> Self {
        Self {
            base,
            flat: 0.0,
            factor: 1.0,
        }
    }

    fn add(&mut self, amount: f64) {
        self.flat += amount;
    }

    fn scale(&mut self, factor: f64) {
        self.factor *= factor;
    }

    /// `(base + flat) * factor`.
    pub fn value(&self) -> f64 {
        (self.base + self.flat) * self.factor
    }
}

/// Which stat an effect feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Evidence per click before EPS and Golden Eye.
    ClickPower,
    /// Fraction of EPS added to each click.
    EpsPerClick,
    /// Output of a single generator.
    GeneratorProduction,
    /// Global production.
    Production,
    /// Believer recruitment.
    BelieverGain,
    /// Additive quest success bonus.
    QuestSuccess,
    /// Quest duration.
    QuestDuration,
    /// Critical-hit chance.
    CritChance,
    /// Critical damage multiplier.
    CritDamage,
    /// Combo meter charge per click.
    ComboRate,
    /// Golden Eye click factor.
    GoldenEye,
    /// Offline production efficiency.
    OfflineEfficiency,
    /// Illuminati token yield.
    TokenYield,
    /// Evidence granted at the start of a run.
    StartingEvidence,
    /// A boolean flag rather than a number.
    Flag,
}

/// The stat an effect feeds.
pub const fn stat_kind(effect: &Effect) -> StatKind {
    match effect {
        Effect::ClickPower(_) | Effect::ClickMultiplier(_) => StatKind::ClickPower,
        Effect::EpsPerClick(_) => StatKind::EpsPerClick,
        Effect::GeneratorMultiplier { .. } => StatKind::GeneratorProduction,
        Effect::ProductionBonus(_) | Effect::ProductionMultiplier(_) => StatKind::Production,
        Effect::BelieverMultiplier(_) => StatKind::BelieverGain,
        Effect::QuestSuccessBonus(_) => StatKind::QuestSuccess,
        Effect::QuestDurationMultiplier(_) => StatKind::QuestDuration,
        Effect::CritChance(_) => StatKind::CritChance,
        Effect::CritDamageMultiplier(_) => StatKind::CritDamage,
        Effect::ComboRateMultiplier(_) => StatKind::ComboRate,
        Effect::GoldenEyeMultiplier(_) => StatKind::GoldenEye,
        Effect::OfflineEfficiency(_) => StatKind::OfflineEfficiency,
        Effect::TokenMultiplier(_) => StatKind::TokenYield,
        Effect::StartingEvidence(_) => StatKind::StartingEvidence,
        Effect::ProtectHighRiskBelievers
        | Effect::GuaranteedQuestSuccess
        | Effect::RetainOnAscension(_) => StatKind::Flag,
    }
}

/// One active modifier, for breakdown displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    /// Where it comes from.
    pub source: ModifierSource,
    /// The granting definition's id.
    pub id: String,
    /// The stat it feeds.
    pub stat: StatKind,
    /// The effect itself.
    pub effect: Effect,
}

// ---------------------------------------------------------------------------
// Multipliers
// ---------------------------------------------------------------------------

/// Every composite stat derived from the active modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipliers {
    /// Click power: base from config, `ClickPower` flat, `ClickMultiplier`
    /// factors.
    pub click_power: Stat,
    /// EPS fraction per click.
    pub eps_per_click: Stat,
    /// Global production. Base 1; `ProductionBonus` adds percent.
    pub production: Stat,
    /// Per-generator production factors.
    pub generator_factors: BTreeMap<GeneratorId, f64>,
    /// Believer gain.
    pub believer_gain: Stat,
    /// Additive quest success bonus.
    pub quest_success: Stat,
    /// Quest duration factor.
    pub quest_duration: Stat,
    /// Critical-hit chance.
    pub crit_chance: Stat,
    /// Critical damage multiplier.
    pub crit_damage: Stat,
    /// Combo charge factor.
    pub combo_rate: Stat,
    /// Golden Eye click factor.
    pub golden_eye: Stat,
    /// Offline efficiency.
    pub offline_efficiency: Stat,
    /// Illuminati token yield factor.
    pub token_yield: Stat,
    /// Evidence credited at the start of a run.
    pub starting_evidence: Stat,
    /// Failed high-risk quests return their believers.
    pub protect_high_risk: bool,
    /// Quests always succeed, bypassing the success cap.
    pub guaranteed_success: bool,
    /// Fields kept across Illuminati Ascension regardless of the table.
    pub retained_on_ascension: BTreeSet<ResetField>,
}

impl Multipliers {
    /// Stats with no modifiers applied.
    pub fn baseline(config: &EngineConfig) -> Self {
        Self {
            click_power: Stat::new(config.economy.base_click_power),
            eps_per_click: Stat::new(config.economy.eps_fraction_per_click),
            production: Stat::new(1.0),
            generator_factors: BTreeMap::new(),
            believer_gain: Stat::new(1.0),
            quest_success: Stat::new(0.0),
            quest_duration: Stat::new(1.0),
            crit_chance: Stat::new(config.economy.base_crit_chance),
            crit_damage: Stat::new(config.economy.base_crit_multiplier),
            combo_rate: Stat::new(1.0),
            golden_eye: Stat::new(config.golden_eye.click_factor),
            offline_efficiency: Stat::new(config.offline.efficiency),
            token_yield: Stat::new(1.0),
            starting_evidence: Stat::new(0.0),
            protect_high_risk: false,
            guaranteed_success: false,
            retained_on_ascension: BTreeSet::new(),
        }
    }

    /// Fold every active modifier.
    pub fn compute(
        state: &GameState,
        catalog: &ContentCatalog,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut multipliers = Self::baseline(config);
        for_each_active(state, catalog, now, |_, _, effect| multipliers.apply(effect));
        multipliers
    }

    /// Every active modifier, in fold order.
    pub fn breakdown(
        state: &GameState,
        catalog: &ContentCatalog,
        now: DateTime<Utc>,
    ) -> Vec<Contribution> {
        let mut contributions = Vec::new();
        for_each_active(state, catalog, now, |source, id, effect| {
            contributions.push(Contribution {
                source,
                id: id.to_owned(),
                stat: stat_kind(effect),
                effect: effect.clone(),
            });
        });
        contributions
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::ClickPower(amount) => self.click_power.add(*amount),
            Effect::ClickMultiplier(factor) => self.click_power.scale(*factor),
            Effect::EpsPerClick(amount) => self.eps_per_click.add(*amount),
            Effect::GeneratorMultiplier { generator, factor } => {
                *self
                    .generator_factors
                    .entry(generator.clone())
                    .or_insert(1.0) *= *factor;
            }
            Effect::ProductionBonus(amount) => self.production.add(*amount),
            Effect::ProductionMultiplier(factor) => self.production.scale(*factor),
            Effect::BelieverMultiplier(factor) => self.believer_gain.scale(*factor),
            Effect::QuestSuccessBonus(amount) => self.quest_success.add(*amount),
            Effect::QuestDurationMultiplier(factor) => self.quest_duration.scale(*factor),
            Effect::CritChance(amount) => self.crit_chance.add(*amount),
            Effect::CritDamageMultiplier(factor) => self.crit_damage.scale(*factor),
            Effect::ComboRateMultiplier(factor) => self.combo_rate.scale(*factor),
            Effect::GoldenEyeMultiplier(factor) => self.golden_eye.scale(*factor),
            Effect::OfflineEfficiency(amount) => self.offline_efficiency.add(*amount),
            Effect::TokenMultiplier(factor) => self.token_yield.scale(*factor),
            Effect::StartingEvidence(amount) => self.starting_evidence.add(*amount),
            Effect::ProtectHighRiskBelievers => self.protect_high_risk = true,
            Effect::GuaranteedQuestSuccess => self.guaranteed_success = true,
            Effect::RetainOnAscension(field) => {
                self.retained_on_ascension.insert(*field);
            }
        }
    }

    // -----------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------

    /// Production factor for one generator (1 when unboosted).
    pub fn generator_factor(&self, generator: &GeneratorId) -> f64 {
        self.generator_factors.get(generator).copied().unwrap_or(1.0)
    }

    /// Critical-hit chance clamped to `[0, 1]`.
    pub fn crit_chance(&self) -> f64 {
        clamp_unit(self.crit_chance.value())
    }

    /// Duration factor, never negative.
    pub fn quest_duration(&self) -> f64 {
        self.quest_duration.value().max(0.0)
    }

    /// Offline efficiency, never negative.
    pub fn offline_efficiency(&self) -> f64 {
        self.offline_efficiency.value().max(0.0)
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Visit every active effect in fold order.
fn for_each_active<F>(state: &GameState, catalog: &ContentCatalog, now: DateTime<Utc>, mut visit: F)
where
    F: FnMut(ModifierSource, &str, &Effect),
{
    for id in &state.purchased_upgrades {
        if let Some(def) = catalog.upgrades().get(id) {
            visit(ModifierSource::Upgrade, id.as_str(), &def.effect);
        }
    }
    for id in &state.purchased_tinfoil_upgrades {
        if let Some(def) = catalog.upgrades().get(id) {
            visit(ModifierSource::TinfoilUpgrade, id.as_str(), &def.effect);
        }
    }
    for id in &state.proven_conspiracies {
        if let Some(def) = catalog.conspiracies().get(id) {
            visit(ModifierSource::Conspiracy, id.as_str(), &def.effect);
        }
    }
    for id in &state.unlocked_skills {
        if let Some(def) = catalog.skills().get(id) {
            visit(ModifierSource::Skill, id.as_str(), &def.effect);
        }
    }
    for id in &state.unlocked_achievements {
        if let Some(effect) = catalog
            .achievements()
            .get(id)
            .and_then(|def| def.reward.as_ref())
        {
            visit(ModifierSource::Achievement, id.as_str(), effect);
        }
    }
    for id in &state.purchased_illuminati_upgrades {
        if let Some(def) = catalog.prestige_upgrades().get(id) {
            visit(ModifierSource::IlluminatiUpgrade, id.as_str(), &def.effect);
        }
    }
    for id in &state.purchased_matrix_upgrades {
        if let Some(def) = catalog.matrix_upgrades().get(id) {
            visit(ModifierSource::MatrixUpgrade, id.as_str(), &def.effect);
        }
    }
    for buff in state.active_buffs.iter().filter(|buff| now < buff.expires_at) {
        visit(ModifierSource::Buff, buff.event_id.as_str(), &buff.effect);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use tinfoil_types::{ActiveBuff, EventId, UpgradeId};

    use super::*;

    fn catalog() -> ContentCatalog {
        let yaml = r"
generators:
  - { id: red_string, name: Red String, base_cost: 15, base_production: 0.1 }
upgrades:
  - { id: sharp_pencil, name: Sharp Pencil, cost: 100, effect: { kind: click_power, value: 1 } }
  - { id: magnifier, name: Magnifier, cost: 500, effect: { kind: click_multiplier, value: 2 } }
  - { id: bulletin, name: Bulletin, cost: 1000, effect: { kind: production_bonus, value: 0.5 } }
  - id: more_string
    name: More String
    cost: 200
    effect: { kind: generator_multiplier, value: { generator: red_string, factor: 3 } }
  - id: foil_hat
    name: Foil Hat
    currency: tinfoil
    cost: 5
    effect: { kind: guaranteed_quest_success }
";
        ContentCatalog::parse(yaml).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn baseline_matches_config() {
        let config = EngineConfig::default();
        let state = GameState::new(now());
        let m = Multipliers::compute(&state, &catalog(), &config, now());
        assert_eq!(m.click_power.value(), 1.0);
        assert_eq!(m.eps_per_click.value(), 0.01);
        assert_eq!(m.production.value(), 1.0);
        assert_eq!(m.crit_chance(), 0.0);
        assert_eq!(m.crit_damage.value(), 2.0);
        assert!(!m.guaranteed_success);
    }

    #[test]
    fn flat_bonuses_apply_before_factors() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.purchased_upgrades.insert(UpgradeId::new("sharp_pencil"));
        state.purchased_upgrades.insert(UpgradeId::new("magnifier"));
        let m = Multipliers::compute(&state, &catalog(), &config, now());
        // (1 + 1) * 2
        assert_eq!(m.click_power.value(), 4.0);
    }

    #[test]
    fn production_bonus_is_additive_percent() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.purchased_upgrades.insert(UpgradeId::new("bulletin"));
        let m = Multipliers::compute(&state, &catalog(), &config, now());
        assert_eq!(m.production.value(), 1.5);
    }

    #[test]
    fn generator_boost_targets_one_generator() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.purchased_upgrades.insert(UpgradeId::new("more_string"));
        let m = Multipliers::compute(&state, &catalog(), &config, now());
        assert_eq!(m.generator_factor(&GeneratorId::new("red_string")), 3.0);
        assert_eq!(m.generator_factor(&GeneratorId::new("other")), 1.0);
        assert_eq!(m.production.value(), 1.0);
    }

    #[test]
    fn tinfoil_upgrades_set_flags() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.purchased_tinfoil_upgrades.insert(UpgradeId::new("foil_hat"));
        let m = Multipliers::compute(&state, &catalog(), &config, now());
        assert!(m.guaranteed_success);
    }

    #[test]
    fn expired_buffs_do_not_count() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.active_buffs.push(ActiveBuff {
            event_id: EventId::new("media_leak"),
            effect: Effect::ProductionMultiplier(2.0),
            expires_at: now() + TimeDelta::seconds(30),
        });
        let live = Multipliers::compute(&state, &catalog(), &config, now());
        assert_eq!(live.production.value(), 2.0);
        let later = now() + TimeDelta::seconds(31);
        let expired = Multipliers::compute(&state, &catalog(), &config, later);
        assert_eq!(expired.production.value(), 1.0);
    }

    #[test]
    fn compute_is_pure_and_repeatable() {
        let config = EngineConfig::default();
        let mut state = GameState::new(now());
        state.purchased_upgrades.insert(UpgradeId::new("sharp_pencil"));
        state.purchased_upgrades.insert(UpgradeId::new("bulletin"));
        let before = state.clone();
        let a = Multipliers::compute(&state, &catalog(), &config, now());
        let b = Multipliers::compute(&state, &catalog(), &config, now());
        assert_eq!(a, b);
        assert_eq!(a.click_power.value().to_bits(), b.click_power.value().to_bits());
        assert_eq!(state, before);
    }

    #[test]
    fn breakdown_lists_sources_in_fold_order() {
        let mut state = GameState::new(now());
        state.purchased_tinfoil_upgrades.insert(UpgradeId::new("foil_hat"));
        state.purchased_upgrades.insert(UpgradeId::new("sharp_pencil"));
        let breakdown = Multipliers::breakdown(&state, &catalog(), now());
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].source, ModifierSource::Upgrade);
        assert_eq!(breakdown[0].stat, StatKind::ClickPower);
        assert_eq!(breakdown[1].source, ModifierSource::TinfoilUpgrade);
        assert_eq!(breakdown[1].stat, StatKind::Flag);
    }

    #[test]
    fn crit_chance_is_clamped() {
        let config = EngineConfig::default();
        let mut m = Multipliers::baseline(&config);
        m.apply(&Effect::CritChance(1.7));
        assert_eq!(m.crit_chance(), 1.0);
    }
}
