//! The game engine: one owner of the state, one entry point per intent.
//!
//! [`GameEngine`] owns the [`GameState`], the immutable catalog, the
//! config, a clock and a seeded RNG. The presentation layer talks to it
//! through intents (`process_click`, `purchase_generator`, ...) that
//! return a plain success indicator, and reads back the notifications the
//! engine queued while handling them.
//!
//! # Tick order
//!
//! 1. Expire buffs and the Golden Eye.
//! 2. Credit production and believers for the elapsed time.
//! 3. Resolve due quests in deadline order.
//! 4. Roll for a random event; emit flavor text on its interval.
//! 5. Refresh daily challenges and count evidence toward them.
//! 6. Evaluate achievements and prestige availability.
//! 7. Queue the `Tick` notification.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tinfoil_ledger::{Ledger, invariants};
use tinfoil_types::{ChallengeType, GameState, Notification, PrestigeTier, StoredChallenge};
use tracing::{debug, info, warn};

use crate::achievement;
use crate::catalog::ContentCatalog;
use crate::click;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::daily;
use crate::events::{self, EventOutcome};
use crate::market;
use crate::multiplier::{Contribution, Multipliers};
use crate::numbers::{delta_to_seconds, finite_or_clamped};
use crate::offline::{self, OfflineReport};
use crate::persistence::{PersistError, SaveSlot, SaveStore};
use crate::prestige;
use crate::quest::{self, QuestResolution};
use crate::rejection::Rejection;
use crate::shop;

/// The simulation engine for one save.
#[derive(Debug)]
pub struct GameEngine {
    catalog: Arc<ContentCatalog>,
    config: EngineConfig,
    state: GameState,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
    outbox: VecDeque<Notification>,
}

impl GameEngine {
    /// Start a new game.
    pub fn new(catalog: Arc<ContentCatalog>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let state = GameState::new(clock.now());
        info!("new game started");
        Self::from_state(catalog, config, clock, state)
    }

    /// Wrap an existing state without offline catch-up.
    pub fn from_state(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        state: GameState,
    ) -> Self {
        let rng = config
            .session
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let mut engine = Self {
            catalog,
            config,
            state,
            clock,
            rng,
            outbox: VecDeque::new(),
        };
        let today = engine.clock.now().date_naive();
        daily::refresh(
            &mut engine.state,
            &engine.catalog,
            today,
            engine.config.daily.challenges_per_day,
        );
        engine
    }

    /// Wrap a loaded state and credit the time since it was saved.
    pub fn resume(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        state: GameState,
    ) -> Self {
        let mut engine = Self::from_state(catalog, config, clock, state);
        let now = engine.clock.now();
        let report = offline::reconcile(
            &mut engine.state,
            &engine.catalog,
            &engine.config,
            now,
            &mut engine.rng,
        );
        engine.announce_offline(&report);
        engine.after_change();
        engine
    }

    /// Load a slot and resume it. `None` if the slot is empty.
    pub fn load(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        store: &dyn SaveStore,
        slot: SaveSlot,
    ) -> Option<Self> {
        let state = store.load(slot)?;
        info!(%slot, "continuing saved game");
        Some(Self::resume(catalog, config, clock, state))
    }

    /// Write the state to a slot, stamping `last_saved`.
    pub fn save(&mut self, store: &dyn SaveStore, slot: SaveSlot) -> Result<(), PersistError> {
        let previous = self.state.last_saved;
        self.state.last_saved = Some(self.clock.now());
        if let Err(err) = store.save(slot, &self.state) {
            self.state.last_saved = previous;
            warn!(%slot, error = %err, "save failed");
            return Err(err);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------

    /// The current state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// The content catalog.
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Every composite stat right now.
    pub fn multipliers(&self) -> Multipliers {
        Multipliers::compute(&self.state, &self.catalog, &self.config, self.clock.now())
    }

    /// Every active modifier, in fold order.
    pub fn breakdown(&self) -> Vec<Contribution> {
        Multipliers::breakdown(&self.state, &self.catalog, self.clock.now())
    }

    /// Evidence per second right now.
    pub fn eps(&self) -> f64 {
        market::total_eps(&self.state, &self.catalog, &self.multipliers())
    }

    /// Illuminati tokens an ascension would grant right now.
    pub fn pending_tokens(&self) -> u64 {
        prestige::pending_tokens(&self.state, &self.config, &self.multipliers())
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain(..).collect()
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Resolve one manual click.
    ///
    /// Returns the evidence the click itself granted (0 for a rejected
    /// multiplier).
    pub fn process_click(&mut self, external_multiplier: f64) -> f64 {
        if !external_multiplier.is_finite() || external_multiplier < 0.0 {
            debug!(external_multiplier, "click rejected: invalid multiplier");
            return 0.0;
        }
        if events::expire(&mut self.state, self.clock.now()) {
            self.notify(Notification::GoldenEyeEnd);
        }
        let multipliers = self.multipliers();
        let eps = market::total_eps(&self.state, &self.catalog, &multipliers);
        let roll: f64 = self.rng.random();
        let outcome = click::resolve(
            &mut self.state,
            &self.config,
            &multipliers,
            eps,
            external_multiplier,
            roll,
        );

        self.notify(Notification::ClickProcessed {
            power: outcome.power,
            is_critical: outcome.is_critical,
        });
        self.record(ChallengeType::Clicks, 1.0);
        if outcome.is_critical {
            self.record(ChallengeType::CriticalClicks, 1.0);
        }
        let mut earned = outcome.power;
        if let Some(amount) = outcome.burst {
            earned += amount;
            self.notify(Notification::ComboBurst { amount });
            self.record(ChallengeType::ComboBursts, 1.0);
        }
        self.record(ChallengeType::EarnEvidence, earned);
        self.after_change();
        outcome.power
    }

    /// Buy one unit of a generator.
    pub fn purchase_generator(&mut self, id: &str) -> bool {
        self.purchase_generators(id, 1)
    }

    /// Buy `count` units of a generator, all or nothing.
    pub fn purchase_generators(&mut self, id: &str, count: u32) -> bool {
        let result = market::purchase(&mut self.state, &self.catalog, id, count);
        if accepted("purchase_generators", result).is_none() {
            return false;
        }
        self.record(ChallengeType::PurchaseGenerators, f64::from(count));
        self.after_change();
        true
    }

    /// Buy as many units of a generator as the evidence balance allows.
    ///
    /// Returns the number bought.
    pub fn purchase_max_generators(&mut self, id: &str) -> u32 {
        let Some(def) = self.catalog.generators().get(id) else {
            debug!(generator = id, "purchase_max rejected: unknown generator");
            return 0;
        };
        let count = market::buy_max(def, self.state.owned(&def.id), self.state.balances.evidence);
        if count == 0 || !self.purchase_generators(id, count) {
            return 0;
        }
        count
    }

    /// Buy an evidence or tinfoil shop upgrade.
    pub fn purchase_upgrade(&mut self, id: &str) -> bool {
        let result = shop::purchase_upgrade(&mut self.state, &self.catalog, id);
        if accepted("purchase_upgrade", result).is_none() {
            return false;
        }
        self.record(ChallengeType::PurchaseUpgrades, 1.0);
        self.after_change();
        true
    }

    /// Prove a conspiracy.
    pub fn prove_conspiracy(&mut self, id: &str) -> bool {
        let result = shop::prove_conspiracy(&mut self.state, &self.catalog, id);
        self.finish("prove_conspiracy", result)
    }

    /// Unlock a skill.
    pub fn unlock_skill(&mut self, id: &str) -> bool {
        let result = shop::unlock_skill(&mut self.state, &self.catalog, id);
        self.finish("unlock_skill", result)
    }

    /// Buy an Illuminati upgrade.
    pub fn purchase_illuminati_upgrade(&mut self, id: &str) -> bool {
        let result = shop::purchase_illuminati_upgrade(&mut self.state, &self.catalog, id);
        self.finish("purchase_illuminati_upgrade", result)
    }

    /// Buy a matrix upgrade.
    pub fn purchase_matrix_upgrade(&mut self, id: &str) -> bool {
        let result = shop::purchase_matrix_upgrade(&mut self.state, &self.catalog, id);
        self.finish("purchase_matrix_upgrade", result)
    }

    /// Start a quest.
    pub fn start_quest(&mut self, id: &str) -> bool {
        let multipliers = self.multipliers();
        let now = self.clock.now();
        let result = quest::start(&mut self.state, &self.catalog, &multipliers, id, now);
        let Some(run) = accepted("start_quest", result) else {
            return false;
        };
        self.notify(Notification::QuestStarted {
            run_id: run.run_id,
            quest_id: run.quest_id,
            end_time: run.end_time,
        });
        true
    }

    /// Perform Illuminati Ascension.
    ///
    /// Returns the tokens granted, or `None` if not eligible.
    pub fn perform_prestige(&mut self) -> Option<u64> {
        let multipliers = self.multipliers();
        let result = prestige::ascend(&mut self.state, &self.config, &multipliers);
        let tokens = accepted("perform_prestige", result)?;
        self.notify(Notification::PrestigeComplete {
            tier: PrestigeTier::Ascension,
            tokens_granted: tokens,
        });
        self.after_change();
        Some(tokens)
    }

    /// Perform a Matrix Break.
    ///
    /// Returns the glitch tokens granted, or `None` if not eligible.
    pub fn perform_matrix_break(&mut self) -> Option<u64> {
        let multipliers = self.multipliers();
        let result = prestige::break_matrix(&mut self.state, &self.config, &multipliers);
        let glitch = accepted("perform_matrix_break", result)?;
        self.notify(Notification::PrestigeComplete {
            tier: PrestigeTier::MatrixBreak,
            tokens_granted: glitch,
        });
        self.after_change();
        Some(glitch)
    }

    /// Claim a completed daily challenge.
    pub fn claim_daily_challenge(&mut self, id: &str) -> bool {
        let result = daily::claim(&mut self.state, &self.catalog, id);
        self.finish("claim_daily_challenge", result)
    }

    // -----------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------

    /// Advance the simulation to the clock's current time.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let elapsed = delta_to_seconds(now - self.state.last_tick).max(0.0);
        self.state.last_tick = now;
        self.state.ticks = self.state.ticks.saturating_add(1);
        let lifetime_before = self.state.balances.total_evidence_earned;

        if events::expire(&mut self.state, now) {
            self.notify(Notification::GoldenEyeEnd);
        }

        let multipliers = Multipliers::compute(&self.state, &self.catalog, &self.config, now);
        let eps = market::total_eps(&self.state, &self.catalog, &multipliers);
        let believers = market::believers_per_second(&self.state, &self.catalog, &multipliers);
        {
            let mut ledger = Ledger::new(&mut self.state.balances);
            ledger.earn_evidence(finite_or_clamped(eps * elapsed)).ok();
            ledger.recruit_believers(finite_or_clamped(believers * elapsed)).ok();
        }
        self.state.total_play_time_seconds += elapsed;

        for due in quest::take_due(&mut self.state, now) {
            let roll: f64 = self.rng.random();
            let resolution = quest::resolve(
                &mut self.state,
                &self.catalog,
                &multipliers,
                self.config.quests.success_cap,
                eps,
                &due,
                roll,
            );
            self.announce_quest(resolution);
        }

        self.roll_random_event(eps, now);
        let catalog = Arc::clone(&self.catalog);
        if let Some(text) = events::flavor_message(&catalog, &self.config, self.state.ticks) {
            self.notify(Notification::FlavorMessage {
                text: text.to_owned(),
            });
        }

        daily::refresh(
            &mut self.state,
            &self.catalog,
            now.date_naive(),
            self.config.daily.challenges_per_day,
        );
        let earned = self.state.balances.total_evidence_earned - lifetime_before;
        self.record(ChallengeType::EarnEvidence, earned);

        self.after_change();
        debug_assert!(invariants::verify(&self.state.balances).is_healthy());
        self.notify(Notification::Tick {
            tick: self.state.ticks,
            evidence: self.state.balances.evidence,
            eps,
        });
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn notify(&mut self, notification: Notification) {
        self.outbox.push_back(notification);
    }

    /// Collapse a result into a bool, running the post-change checks on
    /// success.
    fn finish<T>(&mut self, intent: &'static str, result: Result<T, Rejection>) -> bool {
        if accepted(intent, result).is_none() {
            return false;
        }
        self.after_change();
        true
    }

    /// Add daily challenge progress and announce completions.
    fn record(&mut self, kind: ChallengeType, amount: f64) {
        let completed: Vec<StoredChallenge> = daily::record(&mut self.state, kind, amount);
        for challenge in completed {
            self.notify(Notification::DailyChallengeComplete { challenge });
        }
    }

    /// Achievements and prestige availability.
    fn after_change(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        for def in achievement::evaluate(&mut self.state, &catalog) {
            self.notify(Notification::AchievementUnlocked {
                achievement_id: def.id.clone(),
                name: def.name.clone(),
                tinfoil_reward: def.tinfoil_reward,
            });
        }

        if !self.state.prestige_notified {
            let multipliers = self.multipliers();
            if prestige::can_ascend(&self.state, &self.config, &multipliers) {
                self.state.prestige_notified = true;
                let tokens = prestige::pending_tokens(&self.state, &self.config, &multipliers);
                info!(tokens, "illuminati ascension available");
                self.notify(Notification::PrestigeAvailable { tokens });
            }
        }
    }

    fn roll_random_event(&mut self, eps: f64, now: DateTime<Utc>) {
        let chance = self.config.events.chance_per_tick;
        if chance <= 0.0 || self.rng.random::<f64>() >= chance {
            return;
        }
        let roll: u64 = self.rng.random();
        let catalog = Arc::clone(&self.catalog);
        let Some(def) = events::pick(&catalog, roll) else {
            return;
        };
        let outcome = events::apply(&mut self.state, &self.config, def, eps, now);
        if !def.message.is_empty() {
            self.notify(Notification::FlavorMessage {
                text: def.message.clone(),
            });
        }
        if let EventOutcome::GoldenEye { ends_at, .. } = outcome {
            self.notify(Notification::GoldenEyeStart { ends_at });
        }
    }

    fn announce_quest(&mut self, resolution: QuestResolution) {
        if resolution.success {
            self.record(ChallengeType::CompleteQuests, 1.0);
        }
        self.notify(Notification::QuestComplete {
            run_id: resolution.run_id,
            quest_id: resolution.quest_id,
            success: resolution.success,
            evidence: resolution.evidence,
            tinfoil: resolution.tinfoil,
            believers_lost: resolution.believers_lost,
        });
    }

    fn announce_offline(&mut self, report: &OfflineReport) {
        if report.golden_eye_ended {
            self.notify(Notification::GoldenEyeEnd);
        }
        for resolution in report.resolutions.iter().cloned() {
            self.announce_quest(resolution);
        }
        if report.is_noteworthy(&self.config) {
            self.notify(Notification::OfflineProgress {
                seconds: report.seconds,
                evidence: report.evidence,
                quests_resolved: u32::try_from(report.resolutions.len()).unwrap_or(u32::MAX),
            });
        }
    }
}

/// Log a rejection and turn the result into an option.
fn accepted<T>(intent: &'static str, result: Result<T, Rejection>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(reason) => {
            debug!(intent, %reason, "intent rejected");
            None
        }
    }
}
