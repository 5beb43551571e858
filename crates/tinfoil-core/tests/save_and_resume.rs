//! Save, load and offline catch-up through the public engine API, against
//! both the in-memory store and JSON files in a temporary directory.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tinfoil_core::clock::{Clock, ManualClock};
use tinfoil_core::persistence::{JsonFileStore, MemoryStore, SaveSlot, SaveStore};
use tinfoil_core::{ContentCatalog, EngineConfig, GameEngine};
use tinfoil_types::{ActiveQuest, GameState, GeneratorId, Notification, QuestId, QuestRunId};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.session.seed = Some(11);
    config.events.chance_per_tick = 0.0;
    config.events.flavor_interval_ticks = 0;
    config
}

fn catalog() -> Arc<ContentCatalog> {
    Arc::new(ContentCatalog::bundled().unwrap())
}

/// Ten red strings produce one evidence per second.
fn producing_state() -> GameState {
    let mut state = GameState::new(start());
    state.generator_counts.insert(GeneratorId::new("red_string"), 10);
    state.balances.evidence = 50.0;
    state.balances.total_evidence_earned = 50.0;
    state.balances.run_evidence_earned = 50.0;
    state
}

#[test]
fn file_save_round_trips_the_whole_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let clock = ManualClock::new(start());

    let mut engine =
        GameEngine::from_state(catalog(), config(), Arc::new(clock.clone()), producing_state());
    engine.process_click(1.0);
    engine.save(&store, SaveSlot::Two).unwrap();
    assert!(store.path(SaveSlot::Two).exists());

    let loaded =
        GameEngine::load(catalog(), config(), Arc::new(clock), &store, SaveSlot::Two).unwrap();
    assert_eq!(loaded.state(), engine.state());

    let empty = GameEngine::load(
        catalog(),
        config(),
        Arc::new(ManualClock::new(start())),
        &store,
        SaveSlot::One,
    );
    assert!(empty.is_none());
}

#[test]
fn slot_listing_reports_saved_progress() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(start());
    let mut engine =
        GameEngine::from_state(catalog(), config(), Arc::new(clock), producing_state());
    engine.save(&store, SaveSlot::Three).unwrap();

    let slots = store.list_slot_info();
    assert_eq!(slots.len(), 3);
    assert!(!slots[0].exists);
    assert!(!slots[1].exists);
    assert!(slots[2].exists);
    assert_eq!(slots[2].slot, 3);
    assert_eq!(slots[2].total_evidence, 50.0);
    assert_eq!(slots[2].last_played, Some(start()));
}

#[test]
fn resuming_credits_the_time_away() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(start());
    let mut engine =
        GameEngine::from_state(catalog(), config(), Arc::new(clock.clone()), producing_state());
    engine.save(&store, SaveSlot::One).unwrap();

    clock.advance(TimeDelta::hours(1)).unwrap();
    let mut resumed =
        GameEngine::load(catalog(), config(), Arc::new(clock.clone()), &store, SaveSlot::One)
            .unwrap();

    assert!((resumed.state().balances.evidence - 3650.0).abs() < 1e-6);
    assert!((resumed.state().total_play_time_seconds - 3600.0).abs() < 1e-9);
    assert_eq!(resumed.state().last_tick, clock.now());
    assert!(resumed.drain_notifications().iter().any(|n| matches!(
        n,
        Notification::OfflineProgress { seconds, quests_resolved: 0, .. } if *seconds == 3600.0
    )));
}

#[test]
fn offline_credit_respects_the_cap() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(start());
    let mut engine =
        GameEngine::from_state(catalog(), config(), Arc::new(clock.clone()), producing_state());
    engine.save(&store, SaveSlot::One).unwrap();

    let mut capped = config();
    capped.offline.max_seconds = Some(600.0);
    clock.advance(TimeDelta::hours(2)).unwrap();
    let resumed =
        GameEngine::load(catalog(), capped, Arc::new(clock), &store, SaveSlot::One).unwrap();
    assert!((resumed.state().balances.evidence - 650.0).abs() < 1e-6);
}

#[test]
fn quests_that_finished_while_away_are_resolved() {
    let mut state = producing_state();
    state.balances.believers = 5.0;
    state.balances.available_believers = 0.0;
    state.active_quests.push(ActiveQuest {
        run_id: QuestRunId::new(),
        quest_id: QuestId::new("stakeout"),
        start_time: start(),
        end_time: start() + TimeDelta::seconds(60),
        believers_sent: 5.0,
    });

    let store = MemoryStore::new();
    store.save(SaveSlot::One, &state).unwrap();

    let clock = ManualClock::new(start() + TimeDelta::minutes(10));
    let mut resumed =
        GameEngine::load(catalog(), config(), Arc::new(clock), &store, SaveSlot::One).unwrap();

    assert!(resumed.state().active_quests.is_empty());
    assert_eq!(
        resumed.state().quests_completed + resumed.state().quests_failed,
        1
    );
    assert_eq!(resumed.state().balances.available_believers, 5.0);
    let notes = resumed.drain_notifications();
    assert!(notes.iter().any(|n| matches!(n, Notification::QuestComplete { .. })));
    assert!(notes.iter().any(|n| matches!(
        n,
        Notification::OfflineProgress { quests_resolved: 1, .. }
    )));
}

fn coin_flip_catalog() -> Arc<ContentCatalog> {
    let yaml = r"
generators:
  - { id: red_string, name: Red String, base_cost: 15, base_production: 0.5, believers_per_second: 0.1 }
quests:
  - id: raid
    name: Raid
    duration_seconds: 60
    believers_required: 10
    success_chance: 0.5
    risk: high
    evidence_multiplier: 100
    tinfoil_reward: 3
";
    Arc::new(ContentCatalog::parse(yaml).unwrap())
}

fn quest_results(engine: &mut GameEngine) -> Vec<Notification> {
    engine
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::QuestComplete { .. }))
        .collect()
}

#[test]
fn quest_outcome_is_the_same_live_and_after_resume() {
    for seed in 1..=16 {
        let mut config = config();
        config.session.seed = Some(seed);

        let mut state = GameState::new(start());
        state.generator_counts.insert(GeneratorId::new("red_string"), 4);
        state.balances.believers = 10.0;
        state.balances.available_believers = 10.0;
        let mut setup = GameEngine::from_state(
            coin_flip_catalog(),
            config.clone(),
            Arc::new(ManualClock::new(start())),
            state,
        );
        assert!(setup.start_quest("raid"));
        let snapshot = setup.snapshot();
        let later = start() + TimeDelta::seconds(90);

        let live_clock = ManualClock::new(start());
        let mut live = GameEngine::from_state(
            coin_flip_catalog(),
            config.clone(),
            Arc::new(live_clock.clone()),
            snapshot.clone(),
        );
        live.drain_notifications();
        live_clock.set(later);
        live.tick();

        let mut resumed = GameEngine::resume(
            coin_flip_catalog(),
            config,
            Arc::new(ManualClock::new(later)),
            snapshot,
        );

        let live_results = quest_results(&mut live);
        assert_eq!(live_results.len(), 1, "seed {seed}");
        assert_eq!(live_results, quest_results(&mut resumed), "seed {seed}");

        let (live, resumed) = (&live.state().balances, &resumed.state().balances);
        assert_eq!(live.believers, resumed.believers, "seed {seed}");
        assert_eq!(
            live.available_believers, resumed.available_believers,
            "seed {seed}"
        );
        assert_eq!(live.tinfoil, resumed.tinfoil, "seed {seed}");
    }
}

#[test]
fn golden_eye_that_expired_offline_is_announced() {
    let mut state = producing_state();
    state.golden_eye_active = true;
    state.golden_eye_end_time = Some(start() + TimeDelta::seconds(20));
    let store = MemoryStore::new();
    store.save(SaveSlot::Three, &state).unwrap();

    let clock = ManualClock::new(start() + TimeDelta::minutes(5));
    let mut resumed =
        GameEngine::load(catalog(), config(), Arc::new(clock), &store, SaveSlot::Three).unwrap();

    assert!(!resumed.state().golden_eye_active);
    let notes = resumed.drain_notifications();
    assert!(notes.contains(&Notification::GoldenEyeEnd));
}
