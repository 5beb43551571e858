//! The prestige ladder: Illuminati Ascension and Matrix Break.
//!
//! Ascension converts lifetime evidence into Illuminati tokens. The yield
//! curve is `floor((total / scaling)^power * token multiplier)` and is
//! paid differentially: only the part of the curve not already granted by
//! earlier ascensions. Matrix Break converts the whole Illuminati balance
//! into glitch tokens once the player has ascended enough.
//!
//! Both tiers then apply the configured reset table. Lifetime evidence,
//! achievements, matrix upgrades and glitch tokens are never touched.

use tinfoil_ledger::Ledger;
use tinfoil_types::{GameState, PrestigeTier, ResetAction, ResetField};
use tracing::info;

use crate::config::{ALL_RESET_FIELDS, EngineConfig};
use crate::multiplier::Multipliers;
use crate::numbers::floor_to_u64;
use crate::rejection::Rejection;

/// The token curve at a lifetime evidence total, before subtracting
/// tokens already granted.
pub fn token_yield(total_evidence: f64, config: &EngineConfig, multipliers: &Multipliers) -> u64 {
    let prestige = &config.prestige;
    if !(total_evidence > 0.0) {
        return 0;
    }
    let curve = (total_evidence / prestige.token_scaling).powf(prestige.token_power);
    floor_to_u64(curve * multipliers.token_yield.value().max(0.0))
}

/// Tokens an ascension right now would grant.
pub fn pending_tokens(state: &GameState, config: &EngineConfig, multipliers: &Multipliers) -> u64 {
    token_yield(state.balances.total_evidence_earned, config, multipliers)
        .saturating_sub(state.balances.total_illuminati_tokens_earned)
}

/// Whether Illuminati Ascension is available.
pub fn can_ascend(state: &GameState, config: &EngineConfig, multipliers: &Multipliers) -> bool {
    state.balances.total_evidence_earned >= config.prestige.threshold
        && pending_tokens(state, config, multipliers) >= 1
}

/// Whether a Matrix Break is available.
pub fn can_break_matrix(state: &GameState, config: &EngineConfig) -> bool {
    let prestige = &config.prestige;
    state.times_ascended >= prestige.matrix_min_ascensions
        && state.balances.total_illuminati_tokens_earned >= prestige.matrix_min_tokens_earned
        && pending_glitch_tokens(state, config) >= 1
}

/// Glitch tokens a Matrix Break right now would grant.
pub fn pending_glitch_tokens(state: &GameState, config: &EngineConfig) -> u64 {
    state
        .balances
        .illuminati_tokens
        .checked_div(config.prestige.glitch_conversion_rate)
        .unwrap_or(0)
}

/// Perform Illuminati Ascension.
///
/// Returns the tokens granted.
pub fn ascend(
    state: &mut GameState,
    config: &EngineConfig,
    multipliers: &Multipliers,
) -> Result<u64, Rejection> {
    if !can_ascend(state, config, multipliers) {
        return Err(Rejection::NotEligible);
    }
    let tokens = pending_tokens(state, config, multipliers);
    Ledger::new(&mut state.balances).grant_illuminati_tokens(tokens);

    apply_resets(state, config, PrestigeTier::Ascension, multipliers);
    state.times_ascended = state.times_ascended.saturating_add(1);
    state.prestige_notified = false;

    let starting = multipliers.starting_evidence.value();
    if starting > 0.0 {
        Ledger::new(&mut state.balances).earn_evidence(starting).ok();
    }

    info!(
        tokens,
        times_ascended = state.times_ascended,
        lifetime_tokens = state.balances.total_illuminati_tokens_earned,
        "illuminati ascension"
    );
    Ok(tokens)
}

/// Perform a Matrix Break.
///
/// Returns the glitch tokens granted.
pub fn break_matrix(
    state: &mut GameState,
    config: &EngineConfig,
    multipliers: &Multipliers,
) -> Result<u64, Rejection> {
    if !can_break_matrix(state, config) {
        return Err(Rejection::NotEligible);
    }
    let glitch = Ledger::new(&mut state.balances)
        .convert_illuminati_to_glitch(config.prestige.glitch_conversion_rate)?;

    apply_resets(state, config, PrestigeTier::MatrixBreak, multipliers);
    state.times_matrix_broken = state.times_matrix_broken.saturating_add(1);
    state.prestige_notified = false;

    info!(
        glitch,
        times_matrix_broken = state.times_matrix_broken,
        "matrix break"
    );
    Ok(glitch)
}

/// The effective action for a field, honouring `RetainOnAscension`.
fn effective_action(
    config: &EngineConfig,
    field: ResetField,
    tier: PrestigeTier,
    multipliers: &Multipliers,
) -> ResetAction {
    if tier == PrestigeTier::Ascension && multipliers.retained_on_ascension.contains(&field) {
        return ResetAction::Retain;
    }
    config.resets.action(field, tier)
}

/// Clear every field the table resets for this tier.
fn apply_resets(
    state: &mut GameState,
    config: &EngineConfig,
    tier: PrestigeTier,
    multipliers: &Multipliers,
) {
    let resets: Vec<ResetField> = ALL_RESET_FIELDS
        .iter()
        .copied()
        .filter(|&field| effective_action(config, field, tier, multipliers) == ResetAction::Reset)
        .collect();

    // Running quests go first so their believers are back before the
    // believer row is considered.
    if resets.contains(&ResetField::ActiveQuests) {
        let committed: f64 = state.active_quests.iter().map(|q| q.believers_sent).sum();
        state.active_quests.clear();
        Ledger::new(&mut state.balances)
            .release_believers(committed)
            .ok();
    }

    for field in &resets {
        reset_field(state, *field);
    }
    info!(tier = ?tier, fields = ?resets, "prestige reset applied");
}

fn reset_field(state: &mut GameState, field: ResetField) {
    match field {
        ResetField::Evidence => {
            Ledger::new(&mut state.balances).clear_evidence();
        }
        ResetField::Generators => state.generator_counts.clear(),
        ResetField::Upgrades => state.purchased_upgrades.clear(),
        ResetField::TinfoilUpgrades => state.purchased_tinfoil_upgrades.clear(),
        ResetField::Tinfoil => Ledger::new(&mut state.balances).clear_tinfoil(),
        ResetField::Believers => {
            // Believers away on retained quests stay committed.
            let committed: f64 = state.active_quests.iter().map(|q| q.believers_sent).sum();
            let mut ledger = Ledger::new(&mut state.balances);
            ledger.clear_believers();
            if committed > 0.0 {
                ledger.recruit_believers(committed).ok();
                ledger.reserve_believers(committed).ok();
            }
        }
        ResetField::ActiveQuests => {}
        ResetField::Conspiracies => state.proven_conspiracies.clear(),
        ResetField::Skills => state.unlocked_skills.clear(),
        ResetField::Combo => {
            state.combo_meter = 0.0;
            state.combo_clicks = 0;
        }
        ResetField::Buffs => {
            state.active_buffs.clear();
            state.golden_eye_active = false;
            state.golden_eye_end_time = None;
        }
        ResetField::IlluminatiUpgrades => state.purchased_illuminati_upgrades.clear(),
        ResetField::IlluminatiTokens => {
            Ledger::new(&mut state.balances).clear_illuminati_tokens();
        }
    }
}
