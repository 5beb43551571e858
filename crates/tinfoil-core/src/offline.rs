//! Offline catch-up.
//!
//! On resume, the gap since the last save is credited in one step:
//! `EPS * seconds * offline efficiency` evidence, plus believers at the
//! live rate. Quests whose deadline fell inside the gap are resolved in
//! deadline order through the same [`quest::resolve`] the live tick uses.

use chrono::{DateTime, Utc};
use rand::Rng;
use tinfoil_ledger::Ledger;
use tinfoil_types::GameState;
use tracing::info;

use crate::catalog::ContentCatalog;
use crate::config::EngineConfig;
use crate::events;
use crate::market;
use crate::multiplier::Multipliers;
use crate::numbers::{delta_to_seconds, finite_or_clamped};
use crate::quest::{self, QuestResolution};

/// What the catch-up credited.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineReport {
    /// Seconds credited (after the cap).
    pub seconds: f64,
    /// Evidence credited by production.
    pub evidence: f64,
    /// Believers recruited.
    pub believers: f64,
    /// Quests resolved during the gap, in deadline order.
    pub resolutions: Vec<QuestResolution>,
    /// Whether a saved Golden Eye ran out during the gap.
    pub golden_eye_ended: bool,
}

impl OfflineReport {
    /// Whether the gap is long enough to report to the player.
    pub fn is_noteworthy(&self, config: &EngineConfig) -> bool {
        self.seconds >= config.offline.min_seconds || !self.resolutions.is_empty()
    }
}

/// Seconds to credit for a gap, after the configured cap.
pub fn credited_seconds(
    state: &GameState,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> f64 {
    let since = state.last_saved.unwrap_or(state.last_tick).max(state.last_tick);
    let elapsed = delta_to_seconds(now - since).max(0.0);
    config
        .offline
        .max_seconds
        .map_or(elapsed, |cap| elapsed.min(cap.max(0.0)))
}

/// Credit the gap between the last save and `now`.
pub fn reconcile<R: Rng>(
    state: &mut GameState,
    catalog: &ContentCatalog,
    config: &EngineConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> OfflineReport {
    let seconds = credited_seconds(state, config, now);
    let golden_eye_ended = events::expire(state, now);
    let multipliers = Multipliers::compute(state, catalog, config, now);
    let eps = market::total_eps(state, catalog, &multipliers);

    let evidence = finite_or_clamped(eps * seconds * multipliers.offline_efficiency()).max(0.0);
    let believers =
        finite_or_clamped(market::believers_per_second(state, catalog, &multipliers) * seconds)
            .max(0.0);
    {
        let mut ledger = Ledger::new(&mut state.balances);
        ledger.earn_evidence(evidence).ok();
        ledger.recruit_believers(believers).ok();
    }

    let resolutions: Vec<QuestResolution> = quest::take_due(state, now)
        .iter()
        .map(|due| {
            let roll: f64 = rng.random();
            quest::resolve(
                state,
                catalog,
                &multipliers,
                config.quests.success_cap,
                eps,
                due,
                roll,
            )
        })
        .collect();

    state.total_play_time_seconds += seconds;
    state.last_tick = now;

    info!(
        seconds,
        evidence,
        believers,
        quests_resolved = resolutions.len(),
        "offline progress credited"
    );
    OfflineReport {
        seconds,
        evidence,
        believers,
        resolutions,
        golden_eye_ended,
    }
}
