//! Generator cost curves, bulk purchase math, and production.
//!
//! Generator prices grow geometrically: the unit after `owned` costs
//! `base_cost * cost_multiplier^owned`. Buying `n` at once is priced with
//! the closed-form geometric sum, and [`buy_max`] inverts that sum with a
//! logarithm, then corrects the estimate against the same closed form so
//! the returned count is always affordable and one more never is.

use tinfoil_ledger::Ledger;
use tinfoil_types::{GameState, GeneratorDef};
use tracing::debug;

use crate::catalog::ContentCatalog;
use crate::multiplier::Multipliers;
use crate::numbers::{finite_or_clamped, floor_to_u32};
use crate::rejection::{Rejection, check_requirements};

/// Price of the next unit when `owned` are already owned.
pub fn cost(def: &GeneratorDef, owned: u32) -> f64 {
    def.base_cost * def.cost_multiplier.powf(f64::from(owned))
}

/// Price of buying `n` more units when `owned` are already owned.
///
/// Closed-form geometric series:
/// `base * r^owned * (r^n - 1) / (r - 1)`.
pub fn bulk_cost(def: &GeneratorDef, owned: u32, n: u32) -> f64 {
    match n {
        0 => 0.0,
        1 => cost(def, owned),
        _ => {
            let ratio = def.cost_multiplier;
            if (ratio - 1.0).abs() < f64::EPSILON {
                return def.base_cost * f64::from(n);
            }
            cost(def, owned) * (ratio.powf(f64::from(n)) - 1.0) / (ratio - 1.0)
        }
    }
}

/// Price of buying `n` units one at a time, re-summing each unit's price.
pub fn naive_bulk_cost(def: &GeneratorDef, owned: u32, n: u32) -> f64 {
    (0..n).map(|i| cost(def, owned.saturating_add(i))).sum()
}

/// The largest `n` whose [`bulk_cost`] fits in `available`.
pub fn buy_max(def: &GeneratorDef, owned: u32, available: f64) -> u32 {
    if !(available >= cost(def, owned)) {
        return 0;
    }

    let ratio = def.cost_multiplier;
    let first = cost(def, owned);
    let estimate = if (ratio - 1.0).abs() < f64::EPSILON {
        available / def.base_cost
    } else {
        (available * (ratio - 1.0) / first + 1.0).ln() / ratio.ln()
    };
    let mut n = floor_to_u32(estimate).max(1);

    // The log estimate can be off by one in either direction.
    while n > 0 && bulk_cost(def, owned, n) > available {
        n -= 1;
    }
    while n < u32::MAX && bulk_cost(def, owned, n + 1) <= available {
        n += 1;
    }
    n
}

/// Evidence per second from one generator, including its own boosts and
/// the global production stat.
pub fn production(def: &GeneratorDef, owned: u32, multipliers: &Multipliers) -> f64 {
    def.base_production
        * f64::from(owned)
        * multipliers.generator_factor(&def.id)
        * multipliers.production.value()
}

/// Total evidence per second across all owned generators.
///
/// Per-generator boosts apply to each generator's own output; the global
/// production stat applies once to the sum.
pub fn total_eps(state: &GameState, catalog: &ContentCatalog, multipliers: &Multipliers) -> f64 {
    let raw: f64 = catalog
        .generators()
        .all()
        .iter()
        .map(|def| {
            def.base_production
                * f64::from(state.owned(&def.id))
                * multipliers.generator_factor(&def.id)
        })
        .sum();
    finite_or_clamped(raw * multipliers.production.value()).max(0.0)
}

/// Believers recruited per second across all owned generators.
pub fn believers_per_second(
    state: &GameState,
    catalog: &ContentCatalog,
    multipliers: &Multipliers,
) -> f64 {
    let raw: f64 = catalog
        .generators()
        .all()
        .iter()
        .map(|def| def.believers_per_second * f64::from(state.owned(&def.id)))
        .sum();
    finite_or_clamped(raw * multipliers.believer_gain.value()).max(0.0)
}

/// Buy `n` units of a generator, all or nothing.
///
/// Returns the evidence spent.
pub fn purchase(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
    n: u32,
) -> Result<f64, Rejection> {
    if n == 0 {
        return Err(Rejection::InvalidArgument("count must be at least 1"));
    }
    let def = catalog
        .generators()
        .get(id)
        .ok_or_else(|| Rejection::UnknownId {
            kind: "generator",
            id: id.to_owned(),
        })?;
    check_requirements(&def.requires, state)?;

    let owned = state.owned(&def.id);
    let price = bulk_cost(def, owned, n);
    Ledger::new(&mut state.balances).spend_evidence(price)?;
    state
        .generator_counts
        .insert(def.id.clone(), owned.saturating_add(n));

    debug!(generator = %def.id, count = n, price, owned = owned.saturating_add(n), "generators purchased");
    Ok(price)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use tinfoil_types::GeneratorId;

    use super::*;
    use crate::config::EngineConfig;

    fn red_string() -> GeneratorDef {
        GeneratorDef {
            id: GeneratorId::new("red_string"),
            name: "Red String".to_owned(),
            description: String::new(),
            base_cost: 15.0,
            cost_multiplier: 1.15,
            base_production: 0.1,
            believers_per_second: 0.0,
            requires: Vec::new(),
        }
    }

    fn relative_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn first_unit_costs_base() {
        assert_eq!(cost(&red_string(), 0), 15.0);
    }

    #[test]
    fn cost_is_strictly_increasing() {
        let def = red_string();
        for owned in 0..500 {
            assert!(cost(&def, owned + 1) > cost(&def, owned));
            assert!(cost(&def, owned) > 0.0);
        }
    }

    #[test]
    fn bulk_cost_matches_closed_form_example() {
        let def = red_string();
        let expected = 15.0 * 1.15_f64.powf(10.0) * (1.15_f64.powf(5.0) - 1.0) / 0.15;
        assert!(relative_eq(bulk_cost(&def, 10, 5), expected));
    }

    #[test]
    fn bulk_cost_matches_re_summing() {
        let def = red_string();
        for owned in [0, 1, 10, 57] {
            for k in 0..=100 {
                let closed = bulk_cost(&def, owned, k);
                let naive = naive_bulk_cost(&def, owned, k);
                assert!(
                    relative_eq(closed, naive),
                    "owned {owned} k {k}: {closed} vs {naive}"
                );
            }
        }
    }

    #[test]
    fn buy_max_is_tight() {
        let def = red_string();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let owned = rng.random_range(0..200);
            let available = 10f64.powf(rng.random_range(0.0..30.0));
            let n = buy_max(&def, owned, available);
            assert!(bulk_cost(&def, owned, n) <= available);
            assert!(bulk_cost(&def, owned, n + 1) > available);
        }
    }

    #[test]
    fn buy_max_of_too_little_is_zero() {
        assert_eq!(buy_max(&red_string(), 0, 14.99), 0);
        assert_eq!(buy_max(&red_string(), 0, 15.0), 1);
        assert_eq!(buy_max(&red_string(), 0, f64::NAN), 0);
    }

    #[test]
    fn production_is_linear_in_owned() {
        let m = Multipliers::baseline(&EngineConfig::default());
        let def = red_string();
        assert_eq!(production(&def, 0, &m), 0.0);
        assert!(relative_eq(production(&def, 10, &m), 1.0));
        assert!(relative_eq(production(&def, 20, &m), 2.0));
    }

    #[test]
    fn purchase_is_all_or_nothing() {
        let yaml = r"
generators:
  - { id: red_string, name: Red String, base_cost: 15, base_production: 0.1 }
";
        let catalog = ContentCatalog::parse(yaml).unwrap();
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 30.0;

        let before = state.clone();
        assert!(purchase(&mut state, &catalog, "red_string", 3).is_err());
        assert_eq!(state, before);

        let spent = purchase(&mut state, &catalog, "red_string", 1).unwrap();
        assert_eq!(spent, 15.0);
        assert_eq!(state.owned(&GeneratorId::new("red_string")), 1);
        assert_eq!(state.balances.evidence, 15.0);
    }

    #[test]
    fn unknown_generator_is_rejected() {
        let catalog = ContentCatalog::parse("{}").unwrap();
        let mut state = GameState::new(Utc::now());
        assert!(matches!(
            purchase(&mut state, &catalog, "nope", 1),
            Err(Rejection::UnknownId { .. })
        ));
    }
}
