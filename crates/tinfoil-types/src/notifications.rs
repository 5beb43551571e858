//! Engine-to-presentation notifications and save slot metadata.
//!
//! Notifications are appended to the engine's outbound queue in the order
//! the underlying state changes happened; the presentation layer drains
//! and renders them. They carry plain data only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::PrestigeTier;
use crate::ids::{AchievementId, QuestId, QuestRunId};
use crate::state::StoredChallenge;

/// A state-change notification emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Notification {
    /// A tick finished.
    Tick {
        /// Tick counter after the tick.
        tick: u64,
        /// Evidence balance after the tick.
        evidence: f64,
        /// Current evidence per second.
        eps: f64,
    },
    /// A line of flavor text.
    FlavorMessage {
        /// The message.
        text: String,
    },
    /// An achievement unlocked.
    AchievementUnlocked {
        /// Achievement id.
        achievement_id: AchievementId,
        /// Display name.
        name: String,
        /// Tinfoil granted.
        tinfoil_reward: u64,
    },
    /// A manual click resolved.
    ClickProcessed {
        /// Evidence granted by the click.
        power: f64,
        /// Whether the click was a critical hit.
        is_critical: bool,
    },
    /// The combo meter filled and paid out.
    ComboBurst {
        /// Bonus evidence granted.
        amount: f64,
    },
    /// A quest run started.
    QuestStarted {
        /// Run id.
        run_id: QuestRunId,
        /// Quest id.
        quest_id: QuestId,
        /// When it will resolve.
        end_time: DateTime<Utc>,
    },
    /// A quest run resolved.
    QuestComplete {
        /// Run id.
        run_id: QuestRunId,
        /// Quest id.
        quest_id: QuestId,
        /// Whether it succeeded.
        success: bool,
        /// Evidence granted.
        evidence: f64,
        /// Tinfoil granted.
        tinfoil: u64,
        /// Believers permanently lost.
        believers_lost: f64,
    },
    /// Golden Eye frenzy started (or was extended).
    GoldenEyeStart {
        /// When it ends.
        ends_at: DateTime<Utc>,
    },
    /// Golden Eye frenzy ended.
    GoldenEyeEnd,
    /// Illuminati Ascension became available this run.
    PrestigeAvailable {
        /// Tokens an ascension would grant right now.
        tokens: u64,
    },
    /// A prestige reset completed.
    PrestigeComplete {
        /// Which tier was performed.
        tier: PrestigeTier,
        /// Tokens granted (Illuminati or glitch, per tier).
        tokens_granted: u64,
    },
    /// A daily challenge reached its target.
    DailyChallengeComplete {
        /// The completed challenge.
        challenge: StoredChallenge,
    },
    /// Offline catch-up was applied after loading.
    OfflineProgress {
        /// Seconds credited.
        seconds: f64,
        /// Evidence granted.
        evidence: f64,
        /// Quests resolved during catch-up.
        quests_resolved: u32,
    },
}

/// Summary of one save slot for the slot picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotInfo {
    /// Slot number (1..=3).
    pub slot: u8,
    /// Whether a readable save exists.
    pub exists: bool,
    /// Lifetime evidence earned.
    pub total_evidence: f64,
    /// Illuminati Ascensions performed.
    pub ascension_count: u32,
    /// Play time in seconds.
    pub playtime_seconds: f64,
    /// When the slot was last written.
    pub last_played: Option<DateTime<Utc>>,
}

impl SlotInfo {
    /// Info for a slot without a (readable) save.
    pub const fn empty(slot: u8) -> Self {
        Self {
            slot,
            exists: false,
            total_evidence: 0.0,
            ascension_count: 0,
            playtime_seconds: 0.0,
            last_played: None,
        }
    }
}
