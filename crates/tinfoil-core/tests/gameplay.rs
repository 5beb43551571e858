//! End-to-end gameplay scenarios driven through the [`GameEngine`] intent
//! API with a manual clock and a fixed seed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use tinfoil_core::clock::ManualClock;
use tinfoil_core::{ContentCatalog, EngineConfig, GameEngine, daily};
use tinfoil_types::{GameState, GeneratorId, Notification, PrestigeTier, SkillId};

// =============================================================================
// Helpers
// =============================================================================

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.session.seed = Some(7);
    config.events.chance_per_tick = 0.0;
    config.events.flavor_interval_ticks = 0;
    config
}

fn bundled() -> Arc<ContentCatalog> {
    Arc::new(ContentCatalog::bundled().unwrap())
}

fn engine_with(catalog: Arc<ContentCatalog>, state: GameState) -> (GameEngine, ManualClock) {
    let clock = ManualClock::new(start());
    let engine = GameEngine::from_state(catalog, config(), Arc::new(clock.clone()), state);
    (engine, clock)
}

fn rich_state(evidence: f64) -> GameState {
    let mut state = GameState::new(start());
    state.balances.evidence = evidence;
    state.balances.total_evidence_earned = evidence;
    state.balances.run_evidence_earned = evidence;
    state
}

// =============================================================================
// Clicks
// =============================================================================

#[test]
fn first_click_of_a_new_game_pays_one() {
    let clock = ManualClock::new(start());
    let mut engine = GameEngine::new(bundled(), config(), Arc::new(clock));

    assert_eq!(engine.process_click(1.0), 1.0);
    assert_eq!(engine.state().balances.evidence, 1.0);
    assert_eq!(engine.state().total_clicks, 1);

    let notes = engine.drain_notifications();
    assert!(matches!(
        notes[0],
        Notification::ClickProcessed { power, is_critical: false } if power == 1.0
    ));
    assert!(notes.iter().any(|n| matches!(
        n,
        Notification::AchievementUnlocked { achievement_id, .. } if achievement_id.as_str() == "first_click"
    )));
}

#[test]
fn external_multiplier_scales_the_click() {
    let clock = ManualClock::new(start());
    let mut engine = GameEngine::new(bundled(), config(), Arc::new(clock));
    assert_eq!(engine.process_click(3.0), 3.0);
    assert_eq!(engine.process_click(0.0), 0.0);
    assert_eq!(engine.state().total_clicks, 2);
}

// =============================================================================
// Generators
// =============================================================================

#[test]
fn bulk_purchase_matches_buying_one_at_a_time() {
    let (mut bulk, _) = engine_with(bundled(), rich_state(1000.0));
    let (mut single, _) = engine_with(bundled(), rich_state(1000.0));

    assert!(bulk.purchase_generators("red_string", 10));
    for _ in 0..10 {
        assert!(single.purchase_generator("red_string"));
    }

    let red_string = GeneratorId::new("red_string");
    assert_eq!(bulk.state().owned(&red_string), 10);
    assert_eq!(single.state().owned(&red_string), 10);
    let difference = (bulk.state().balances.evidence - single.state().balances.evidence).abs();
    assert!(difference < 1e-9, "bulk and single purchases diverged by {difference}");
}

#[test]
fn unaffordable_bulk_purchase_buys_nothing() {
    let (mut engine, _) = engine_with(bundled(), rich_state(100.0));
    assert!(!engine.purchase_generators("red_string", 10));
    assert_eq!(engine.state().owned(&GeneratorId::new("red_string")), 0);
    assert_eq!(engine.state().balances.evidence, 100.0);
}

#[test]
fn locked_generator_cannot_be_bought() {
    let (mut engine, _) = engine_with(bundled(), rich_state(1_000_000.0));
    assert!(!engine.purchase_generator("blurry_photo"));
    assert!(engine.purchase_generator("red_string"));
    assert!(engine.purchase_generator("blurry_photo"));
}

#[test]
fn production_accrues_over_ticks() {
    let mut state = rich_state(0.0);
    state.generator_counts.insert(GeneratorId::new("red_string"), 10);
    let (mut engine, clock) = engine_with(bundled(), state);

    for _ in 0..5 {
        clock.advance(TimeDelta::seconds(1)).unwrap();
        engine.tick();
    }
    assert!((engine.state().balances.evidence - 5.0).abs() < 1e-9);
    assert_eq!(engine.state().ticks, 5);
}

// =============================================================================
// Quests
// =============================================================================

fn raid_catalog() -> Arc<ContentCatalog> {
    let yaml = r"
skills:
  - id: safehouse
    name: Safehouse
    tinfoil_cost: 1
    effect: { kind: protect_high_risk_believers }
quests:
  - id: raid
    name: Raid
    duration_seconds: 60
    believers_required: 10
    success_chance: 0
    risk: high
    evidence_multiplier: 100
";
    Arc::new(ContentCatalog::parse(yaml).unwrap())
}

fn believers_state() -> GameState {
    let mut state = GameState::new(start());
    state.balances.believers = 10.0;
    state.balances.available_believers = 10.0;
    state
}

#[test]
fn failed_high_risk_quest_loses_its_believers() {
    let (mut engine, clock) = engine_with(raid_catalog(), believers_state());
    assert!(engine.start_quest("raid"));
    assert_eq!(engine.state().balances.available_believers, 0.0);
    assert_eq!(engine.state().balances.believers, 10.0);

    clock.advance(TimeDelta::seconds(60)).unwrap();
    engine.tick();

    assert!(engine.state().active_quests.is_empty());
    assert_eq!(engine.state().balances.believers, 0.0);
    assert_eq!(engine.state().quests_failed, 1);
    assert!(engine.drain_notifications().iter().any(|n| matches!(
        n,
        Notification::QuestComplete { success: false, believers_lost, .. } if *believers_lost == 10.0
    )));
}

#[test]
fn protected_high_risk_failure_returns_believers() {
    let mut state = believers_state();
    state.unlocked_skills.insert(SkillId::new("safehouse"));
    let (mut engine, clock) = engine_with(raid_catalog(), state);
    assert!(engine.start_quest("raid"));

    clock.advance(TimeDelta::seconds(60)).unwrap();
    engine.tick();

    assert_eq!(engine.state().balances.believers, 10.0);
    assert_eq!(engine.state().balances.available_believers, 10.0);
    assert_eq!(engine.state().quests_failed, 1);
}

#[test]
fn quest_without_enough_believers_is_refused() {
    let (mut engine, _) = engine_with(raid_catalog(), GameState::new(start()));
    assert!(!engine.start_quest("raid"));
    assert!(engine.state().active_quests.is_empty());
}

#[test]
fn overlong_quest_deadline_saturates_instead_of_overflowing() {
    let yaml = r"
quests:
  - id: forever
    name: Forever
    duration_seconds: 1.0e13
    believers_required: 10
    success_chance: 1
    risk: low
    evidence_multiplier: 1
";
    let catalog = Arc::new(ContentCatalog::parse(yaml).unwrap());
    let (mut engine, clock) = engine_with(catalog, believers_state());
    assert!(engine.start_quest("forever"));

    let end_time = engine.state().active_quests[0].end_time;
    assert_eq!(end_time, Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());

    clock.advance(TimeDelta::days(365)).unwrap();
    engine.tick();
    assert_eq!(engine.state().active_quests.len(), 1);

    let json = serde_json::to_string(engine.state()).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.active_quests[0].end_time, end_time);
}

// =============================================================================
// Daily challenges
// =============================================================================

#[test]
fn daily_challenges_are_the_same_for_everyone_on_a_date() {
    let clock = ManualClock::new(start());
    let first = GameEngine::new(bundled(), config(), Arc::new(clock.clone()));
    let second = GameEngine::new(bundled(), config(), Arc::new(clock));

    let ids = |engine: &GameEngine| -> Vec<String> {
        engine
            .state()
            .daily_challenges
            .iter()
            .map(|c| c.challenge_id.as_str().to_owned())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(ids(&first).len(), 3);

    let catalog = bundled();
    let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let generated: Vec<String> = daily::generate(&catalog, date, 3)
        .iter()
        .map(|t| t.id.as_str().to_owned())
        .collect();
    assert_eq!(ids(&first), generated);
    assert!(first.state().daily_challenges.iter().all(|c| c.date == date));
}

#[test]
fn daily_challenges_roll_over_at_midnight() {
    let (mut engine, clock) = engine_with(bundled(), GameState::new(start()));
    clock.advance(TimeDelta::hours(12)).unwrap();
    engine.tick();

    let tomorrow = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
    assert_eq!(engine.state().daily_challenges.len(), 3);
    assert!(engine.state().daily_challenges.iter().all(|c| c.date == tomorrow));
}

// =============================================================================
// Prestige
// =============================================================================

#[test]
fn ascension_yields_follow_the_token_curve() {
    for (total, expected) in [(1e12, 3), (1e13, 15), (1e14, 63)] {
        let (mut engine, _) = engine_with(bundled(), rich_state(total));
        assert_eq!(engine.pending_tokens(), expected);
        assert_eq!(engine.perform_prestige(), Some(expected));
        assert_eq!(engine.state().balances.illuminati_tokens, expected);
        assert_eq!(engine.state().balances.evidence, 0.0);
        assert_eq!(engine.state().times_ascended, 1);
    }
}

#[test]
fn second_ascension_pays_only_the_difference() {
    let (mut engine, _) = engine_with(bundled(), rich_state(1e12));
    assert_eq!(engine.perform_prestige(), Some(3));
    assert_eq!(engine.perform_prestige(), None);

    let mut state = engine.snapshot();
    state.balances.total_evidence_earned = 1e13;
    let (mut engine, _) = engine_with(bundled(), state);
    assert_eq!(engine.perform_prestige(), Some(12));
    assert_eq!(engine.state().balances.total_illuminati_tokens_earned, 15);

    let notes = engine.drain_notifications();
    assert!(notes.iter().any(|n| matches!(
        n,
        Notification::PrestigeComplete { tier: PrestigeTier::Ascension, tokens_granted: 12 }
    )));
}

#[test]
fn ascension_below_threshold_is_refused() {
    let (mut engine, _) = engine_with(bundled(), rich_state(1e11));
    let before = engine.snapshot();
    assert_eq!(engine.perform_prestige(), None);
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn prestige_availability_is_announced_once() {
    let (mut engine, clock) = engine_with(bundled(), rich_state(1e12));
    for _ in 0..3 {
        clock.advance(TimeDelta::seconds(1)).unwrap();
        engine.tick();
    }
    let announced = engine
        .drain_notifications()
        .iter()
        .filter(|n| matches!(n, Notification::PrestigeAvailable { tokens: 3 }))
        .count();
    assert_eq!(announced, 1);
}

// =============================================================================
// Achievements
// =============================================================================

#[test]
fn achievements_unlock_exactly_once() {
    let clock = ManualClock::new(start());
    let mut engine = GameEngine::new(bundled(), config(), Arc::new(clock.clone()));
    engine.process_click(1.0);
    let tinfoil = engine.state().balances.tinfoil;
    let unlocked = engine.state().unlocked_achievements.len();
    assert!(unlocked >= 1);

    for _ in 0..5 {
        engine.process_click(1.0);
        clock.advance(TimeDelta::seconds(1)).unwrap();
        engine.tick();
    }
    assert_eq!(engine.state().unlocked_achievements.len(), unlocked);
    assert_eq!(engine.state().balances.tinfoil, tinfoil);
    let repeats = engine
        .drain_notifications()
        .iter()
        .filter(|n| matches!(n, Notification::AchievementUnlocked { .. }))
        .count();
    assert_eq!(repeats, 1);
}
