//! Manual click resolution.
//!
//! A click is worth `(click power + EPS * eps fraction) * external factor`,
//! boosted by the Golden Eye frenzy while it runs, and multiplied by the
//! critical damage multiplier on a critical roll. Each click also charges
//! the combo meter; a full meter pays out a burst proportional to EPS and
//! empties.
//!
//! The critical roll is passed in, so resolution is deterministic for a
//! given roll.

use tinfoil_ledger::Ledger;
use tinfoil_types::GameState;
use tracing::trace;

use crate::config::EngineConfig;
use crate::multiplier::Multipliers;
use crate::numbers::finite_or_clamped;

/// What one click produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOutcome {
    /// Evidence granted by the click itself.
    pub power: f64,
    /// Whether the critical roll hit.
    pub is_critical: bool,
    /// Evidence granted by a combo burst, if the meter filled.
    pub burst: Option<f64>,
}

/// Resolve one click against the state.
///
/// `roll` is a uniform draw from `[0, 1)`; the click is critical when
/// `roll < crit chance`.
pub fn resolve(
    state: &mut GameState,
    config: &EngineConfig,
    multipliers: &Multipliers,
    eps: f64,
    external_multiplier: f64,
    roll: f64,
) -> ClickOutcome {
    let base_power = multipliers.click_power.value();
    let eps_bonus = eps * multipliers.eps_per_click.value();
    let frenzy = if state.golden_eye_active {
        multipliers.golden_eye.value()
    } else {
        1.0
    };
    let raw_power = (base_power + eps_bonus) * external_multiplier * frenzy;

    let is_critical = roll < multipliers.crit_chance();
    let power = finite_or_clamped(if is_critical {
        raw_power * multipliers.crit_damage.value()
    } else {
        raw_power
    })
    .max(0.0);

    let burst = charge_combo(state, config, multipliers, eps, base_power);

    let mut ledger = Ledger::new(&mut state.balances);
    ledger.earn_evidence(power).ok();
    if let Some(amount) = burst {
        ledger.earn_evidence(amount).ok();
    }

    state.total_clicks = state.total_clicks.saturating_add(1);
    if is_critical {
        state.critical_clicks = state.critical_clicks.saturating_add(1);
    }

    trace!(power, is_critical, burst = ?burst, "click resolved");
    ClickOutcome {
        power,
        is_critical,
        burst,
    }
}

/// Add one click's charge; on a full meter, empty it and return the
/// burst amount.
fn charge_combo(
    state: &mut GameState,
    config: &EngineConfig,
    multipliers: &Multipliers,
    eps: f64,
    base_power: f64,
) -> Option<f64> {
    let step = config.combo.increment_per_click * multipliers.combo_rate.value().max(0.0);
    state.combo_meter = (state.combo_meter + step).clamp(0.0, 1.0);
    state.combo_clicks = state.combo_clicks.saturating_add(1);

    if state.combo_meter < 1.0 {
        return None;
    }

    state.combo_meter = 0.0;
    state.combo_clicks = 0;
    state.combo_bursts = state.combo_bursts.saturating_add(1);
    let amount = (eps * config.combo.burst_eps_seconds)
        .max(base_power * config.combo.burst_min_clicks_value);
    Some(finite_or_clamped(amount).max(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn setup() -> (GameState, EngineConfig, Multipliers) {
        let config = EngineConfig::default();
        let multipliers = Multipliers::baseline(&config);
        (GameState::new(Utc::now()), config, multipliers)
    }

    #[test]
    fn first_click_is_worth_exactly_one() {
        let (mut state, config, m) = setup();
        let outcome = resolve(&mut state, &config, &m, 0.0, 1.0, 0.5);
        assert_eq!(outcome.power, 1.0);
        assert!(!outcome.is_critical);
        assert!(outcome.burst.is_none());
        assert_eq!(state.balances.evidence, 1.0);
        assert_eq!(state.balances.total_evidence_earned, 1.0);
        assert_eq!(state.total_clicks, 1);
    }

    #[test]
    fn eps_adds_a_fraction_per_click() {
        let (mut state, config, m) = setup();
        let outcome = resolve(&mut state, &config, &m, 100.0, 1.0, 0.5);
        assert_eq!(outcome.power, 2.0);
    }

    #[test]
    fn external_multiplier_scales_click() {
        let (mut state, config, m) = setup();
        let outcome = resolve(&mut state, &config, &m, 0.0, 3.0, 0.5);
        assert_eq!(outcome.power, 3.0);
    }

    #[test]
    fn golden_eye_multiplies_click() {
        let (mut state, config, m) = setup();
        state.golden_eye_active = true;
        let outcome = resolve(&mut state, &config, &m, 0.0, 1.0, 0.5);
        assert_eq!(outcome.power, 7.0);
    }

    #[test]
    fn critical_roll_applies_damage_multiplier() {
        let (mut state, config, mut m) = setup();
        m.crit_chance.flat = 0.25;
        let crit = resolve(&mut state, &config, &m, 0.0, 1.0, 0.1);
        assert!(crit.is_critical);
        assert_eq!(crit.power, 2.0);
        let miss = resolve(&mut state, &config, &m, 0.0, 1.0, 0.25);
        assert!(!miss.is_critical);
        assert_eq!(state.critical_clicks, 1);
    }

    #[test]
    fn zero_crit_chance_never_crits() {
        let (mut state, config, m) = setup();
        let outcome = resolve(&mut state, &config, &m, 0.0, 1.0, 0.0);
        assert!(!outcome.is_critical);
    }

    #[test]
    fn full_meter_bursts_and_resets() {
        let (mut state, config, m) = setup();
        state.combo_meter = 0.99;
        state.combo_clicks = 49;
        let outcome = resolve(&mut state, &config, &m, 50.0, 1.0, 0.5);
        // max(50 * 10, 1 * 10)
        assert_eq!(outcome.burst, Some(500.0));
        assert_eq!(state.combo_meter, 0.0);
        assert_eq!(state.combo_clicks, 0);
        assert_eq!(state.combo_bursts, 1);
    }

    #[test]
    fn burst_never_worth_less_than_ten_clicks() {
        let (mut state, config, m) = setup();
        state.combo_meter = 0.99;
        let outcome = resolve(&mut state, &config, &m, 0.0, 1.0, 0.5);
        assert_eq!(outcome.burst, Some(10.0));
        assert_eq!(state.balances.evidence, 11.0);
    }

    #[test]
    fn combo_rate_scales_charge() {
        let (mut state, config, mut m) = setup();
        m.combo_rate.factor = 2.0;
        resolve(&mut state, &config, &m, 0.0, 1.0, 0.5);
        assert!((state.combo_meter - 0.04).abs() < 1e-12);
    }

    #[test]
    fn meter_fills_after_about_fifty_clicks() {
        let (mut state, config, m) = setup();
        for _ in 0..49 {
            assert!(resolve(&mut state, &config, &m, 0.0, 1.0, 0.5).burst.is_none());
        }
        let bursts = (0..2)
            .filter_map(|_| resolve(&mut state, &config, &m, 0.0, 1.0, 0.5).burst)
            .count();
        assert_eq!(bursts, 1);
        assert_eq!(state.total_clicks, 51);
    }
}
