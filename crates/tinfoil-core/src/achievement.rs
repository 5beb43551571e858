//! The achievement tracker.
//!
//! Each achievement watches one monotonic counter in [`GameState`]. When
//! the counter reaches the threshold the achievement unlocks exactly once:
//! its id joins `unlocked_achievements`, its tinfoil reward is paid, and
//! any permanent reward effect starts flowing through the multiplier
//! pipeline. Re-evaluating is a no-op for unlocked ids.

use tinfoil_ledger::Ledger;
use tinfoil_types::{AchievementDef, AchievementKind, GameState};
use tracing::info;

use crate::catalog::ContentCatalog;

/// The current value of the counter an achievement kind watches.
pub fn counter(state: &GameState, kind: &AchievementKind) -> f64 {
    match kind {
        AchievementKind::TotalEvidence => state.balances.total_evidence_earned,
        AchievementKind::TotalClicks => state.total_clicks as f64,
        AchievementKind::GeneratorOwned(generator) => f64::from(state.owned(generator)),
        AchievementKind::ConspiraciesProven => state.proven_conspiracies.len() as f64,
        AchievementKind::PlayTime => state.total_play_time_seconds,
        AchievementKind::TimesAscended => f64::from(state.times_ascended),
        AchievementKind::TimesMatrixBroken => f64::from(state.times_matrix_broken),
        AchievementKind::QuestsCompleted => state.quests_completed as f64,
        AchievementKind::CriticalClicks => state.critical_clicks as f64,
    }
}

/// Unlock every achievement whose threshold is met.
///
/// Returns the newly unlocked definitions in unlock order: ascending
/// threshold, ties broken by catalog order.
pub fn evaluate<'a>(state: &mut GameState, catalog: &'a ContentCatalog) -> Vec<&'a AchievementDef> {
    let mut ready: Vec<&AchievementDef> = catalog
        .achievements()
        .all()
        .iter()
        .filter(|def| !state.unlocked_achievements.contains(&def.id))
        .filter(|def| counter(state, &def.kind) >= def.threshold)
        .collect();
    ready.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));

    for def in &ready {
        state.unlocked_achievements.insert(def.id.clone());
        Ledger::new(&mut state.balances).grant_tinfoil(def.tinfoil_reward);
        info!(
            achievement = %def.id,
            name = %def.name,
            tinfoil = def.tinfoil_reward,
            "achievement unlocked"
        );
    }
    ready
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tinfoil_types::GeneratorId;

    use super::*;

    fn catalog() -> ContentCatalog {
        let yaml = r"
generators:
  - { id: red_string, name: Red String, base_cost: 15, base_production: 0.1 }
achievements:
  - { id: clicks_100, name: Clicker, kind: { kind: total_clicks }, threshold: 100, tinfoil_reward: 5 }
  - { id: clicks_10, name: First Steps, kind: { kind: total_clicks }, threshold: 10, tinfoil_reward: 1 }
  - { id: clicks_1000, name: Obsessed, kind: { kind: total_clicks }, threshold: 1000 }
  - id: strings_10
    name: Web of Lies
    kind: { kind: generator_owned, value: red_string }
    threshold: 10
    reward: { kind: production_multiplier, value: 1.1 }
";
        ContentCatalog::parse(yaml).unwrap()
    }

    #[test]
    fn nothing_unlocks_on_a_new_game() {
        let mut state = GameState::new(Utc::now());
        assert!(evaluate(&mut state, &catalog()).is_empty());
    }

    #[test]
    fn unlocks_in_threshold_order() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.total_clicks = 150;
        let unlocked: Vec<&str> = evaluate(&mut state, &catalog)
            .iter()
            .map(|def| def.id.as_str())
            .collect();
        assert_eq!(unlocked, vec!["clicks_10", "clicks_100"]);
        assert_eq!(state.balances.tinfoil, 6);
    }

    #[test]
    fn never_unlocks_twice() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.total_clicks = 150;
        evaluate(&mut state, &catalog);
        assert!(evaluate(&mut state, &catalog).is_empty());
        assert_eq!(state.balances.tinfoil, 6);
        assert_eq!(state.unlocked_achievements.len(), 2);
    }

    #[test]
    fn generator_achievement_watches_its_target() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.generator_counts.insert(GeneratorId::new("red_string"), 10);
        let unlocked = evaluate(&mut state, &catalog);
        assert_eq!(unlocked.len(), 1);
        assert!(unlocked[0].reward.is_some());
    }

    #[test]
    fn counters_read_state() {
        let mut state = GameState::new(Utc::now());
        state.balances.total_evidence_earned = 42.0;
        state.times_ascended = 3;
        assert_eq!(counter(&state, &AchievementKind::TotalEvidence), 42.0);
        assert_eq!(counter(&state, &AchievementKind::TimesAscended), 3.0);
    }
}
