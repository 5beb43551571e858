//! The single mutable game aggregate and its parts.
//!
//! [`GameState`] is owned exclusively by the engine. It is created fresh on
//! "New Game", loaded wholesale from a save slot on "Continue", and
//! serialized wholesale on save. Nothing outside the engine mutates it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::effects::Effect;
use crate::enums::ChallengeType;
use crate::ids::{
    AchievementId, ChallengeId, ConspiracyId, EventId, GeneratorId, MatrixUpgradeId,
    PrestigeUpgradeId, QuestId, QuestRunId, SkillId, UpgradeId,
};

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Numeric balances guarded by the resource ledger.
///
/// Invariants (restored by the ledger after every mutation):
/// - every float is finite and `>= 0`
/// - `available_believers <= believers`
/// - `total_evidence_earned` never decreases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Balances {
    /// Spendable evidence.
    pub evidence: f64,
    /// Lifetime evidence earned. Never reset.
    pub total_evidence_earned: f64,
    /// Evidence earned since the last prestige reset.
    pub run_evidence_earned: f64,
    /// Tinfoil balance.
    pub tinfoil: u64,
    /// Believers recruited (including those away on quests).
    pub believers: f64,
    /// Believers not committed to a running quest.
    pub available_believers: f64,
    /// Unspent Illuminati tokens.
    pub illuminati_tokens: u64,
    /// Illuminati tokens ever granted by ascension.
    pub total_illuminati_tokens_earned: u64,
    /// Unspent glitch tokens.
    pub glitch_tokens: u64,
}

impl Balances {
    /// Believers currently committed to running quests.
    pub fn committed_believers(&self) -> f64 {
        (self.believers - self.available_believers).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Running things
// ---------------------------------------------------------------------------

/// A quest that has been started and not yet resolved.
///
/// `end_time` is an absolute timestamp, so time spent with the game closed
/// counts toward completion without any countdown bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveQuest {
    /// This run's identifier.
    pub run_id: QuestRunId,
    /// The quest definition.
    pub quest_id: QuestId,
    /// When the quest was started.
    pub start_time: DateTime<Utc>,
    /// When the quest resolves.
    pub end_time: DateTime<Utc>,
    /// Believers reserved for this run.
    pub believers_sent: f64,
}

/// One of today's daily challenges and the player's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StoredChallenge {
    /// Template this challenge was drawn from.
    pub challenge_id: ChallengeId,
    /// Calendar date the challenge belongs to.
    pub date: NaiveDate,
    /// Gameplay event counted.
    pub challenge_type: ChallengeType,
    /// Progress needed.
    pub target: f64,
    /// Progress so far.
    pub progress: f64,
    /// `progress >= target` has been reached.
    pub completed: bool,
    /// The reward has been paid out.
    pub claimed: bool,
}

/// A temporary modifier from a random event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveBuff {
    /// Event that granted the buff.
    pub event_id: EventId,
    /// The modifier, active while `now < expires_at`.
    pub effect: Effect,
    /// When the buff ends.
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The complete mutable state of one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Numeric balances.
    pub balances: Balances,

    /// Units owned per generator.
    pub generator_counts: BTreeMap<GeneratorId, u32>,
    /// Evidence shop upgrades bought this run.
    pub purchased_upgrades: BTreeSet<UpgradeId>,
    /// Tinfoil shop upgrades bought.
    pub purchased_tinfoil_upgrades: BTreeSet<UpgradeId>,
    /// Illuminati upgrades bought.
    pub purchased_illuminati_upgrades: BTreeSet<PrestigeUpgradeId>,
    /// Matrix upgrades bought. Never reset.
    pub purchased_matrix_upgrades: BTreeSet<MatrixUpgradeId>,
    /// Skills unlocked.
    pub unlocked_skills: BTreeSet<SkillId>,
    /// Conspiracies proven.
    pub proven_conspiracies: BTreeSet<ConspiracyId>,
    /// Achievements unlocked. Never reset.
    pub unlocked_achievements: BTreeSet<AchievementId>,

    /// Quests currently running.
    pub active_quests: Vec<ActiveQuest>,
    /// Today's challenges.
    pub daily_challenges: Vec<StoredChallenge>,
    /// Temporary buffs.
    pub active_buffs: Vec<ActiveBuff>,

    /// Combo meter charge in `[0, 1]`.
    pub combo_meter: f64,
    /// Clicks since the last combo burst.
    pub combo_clicks: u32,
    /// Lifetime manual clicks.
    pub total_clicks: u64,
    /// Lifetime critical clicks.
    pub critical_clicks: u64,
    /// Lifetime combo bursts.
    pub combo_bursts: u64,
    /// Quests resolved successfully.
    pub quests_completed: u64,
    /// Quests that failed.
    pub quests_failed: u64,

    /// Illuminati Ascensions performed.
    pub times_ascended: u32,
    /// Matrix Breaks performed.
    pub times_matrix_broken: u32,
    /// Play time accumulated by ticks and offline catch-up.
    pub total_play_time_seconds: f64,

    /// Golden Eye frenzy is running.
    pub golden_eye_active: bool,
    /// When the running Golden Eye ends.
    pub golden_eye_end_time: Option<DateTime<Utc>>,

    /// `PrestigeAvailable` has been announced this run.
    pub prestige_notified: bool,
    /// Ticks processed for this save.
    pub ticks: u64,
    /// When the save was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp production has been applied up to.
    pub last_tick: DateTime<Utc>,
    /// When the state was last written to a save slot.
    pub last_saved: Option<DateTime<Utc>>,
}

impl GameState {
    /// A fresh "New Game" state.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            balances: Balances::default(),
            generator_counts: BTreeMap::new(),
            purchased_upgrades: BTreeSet::new(),
            purchased_tinfoil_upgrades: BTreeSet::new(),
            purchased_illuminati_upgrades: BTreeSet::new(),
            purchased_matrix_upgrades: BTreeSet::new(),
            unlocked_skills: BTreeSet::new(),
            proven_conspiracies: BTreeSet::new(),
            unlocked_achievements: BTreeSet::new(),
            active_quests: Vec::new(),
            daily_challenges: Vec::new(),
            active_buffs: Vec::new(),
            combo_meter: 0.0,
            combo_clicks: 0,
            total_clicks: 0,
            critical_clicks: 0,
            combo_bursts: 0,
            quests_completed: 0,
            quests_failed: 0,
            times_ascended: 0,
            times_matrix_broken: 0,
            total_play_time_seconds: 0.0,
            golden_eye_active: false,
            golden_eye_end_time: None,
            prestige_notified: false,
            ticks: 0,
            created_at: now,
            last_tick: now,
            last_saved: None,
        }
    }

    /// Units of a generator owned (0 if never bought).
    pub fn owned(&self, generator: &GeneratorId) -> u32 {
        self.generator_counts.get(generator).copied().unwrap_or(0)
    }

    /// Whether a quest with this id is currently running.
    pub fn is_quest_running(&self, quest: &QuestId) -> bool {
        self.active_quests.iter().any(|q| &q.quest_id == quest)
    }
}
