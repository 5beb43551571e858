//! The quest scheduler.
//!
//! Each quest run is an independent timed state machine:
//!
//! ```text
//! Available --start--> Running --(now >= end_time)--> Succeeded | Failed --> removed
//! ```
//!
//! Starting reserves believers and records an absolute `end_time`, so time
//! spent with the game closed counts without any countdown. Resolution is
//! triggered by the live tick and by offline catch-up through the same
//! [`resolve`] function; the outcome depends only on the roll passed in,
//! never on which path triggered it.
//!
//! # Failure policy
//!
//! | Risk | Reward on failure | Believers |
//! |------|-------------------|-----------|
//! | Low | `fail_evidence_multiplier` of the intended evidence | returned |
//! | Medium | none | returned |
//! | High | none | lost, unless protected |

use chrono::{DateTime, Utc};
use tinfoil_ledger::Ledger;
use tinfoil_types::{ActiveQuest, GameState, QuestDef, QuestId, QuestRisk, QuestRunId};
use tracing::debug;

use crate::catalog::ContentCatalog;
use crate::multiplier::Multipliers;
use crate::numbers::{deadline, finite_or_clamped};
use crate::rejection::{Rejection, check_requirements};

/// The outcome of one resolved quest run.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestResolution {
    /// The run that resolved.
    pub run_id: QuestRunId,
    /// Its quest definition.
    pub quest_id: QuestId,
    /// Whether the roll succeeded.
    pub success: bool,
    /// Evidence granted.
    pub evidence: f64,
    /// Tinfoil granted.
    pub tinfoil: u64,
    /// Believers permanently lost.
    pub believers_lost: f64,
}

/// Success probability after modifiers, clamped to `[0, cap]`.
///
/// The guaranteed-success flag bypasses this entirely; see [`resolve`].
pub fn success_probability(base_chance: f64, bonus: f64, cap: f64) -> f64 {
    let chance = base_chance + bonus;
    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, cap.clamp(0.0, 1.0))
}

/// Start a quest: reserve believers and schedule its deadline.
pub fn start(
    state: &mut GameState,
    catalog: &ContentCatalog,
    multipliers: &Multipliers,
    id: &str,
    now: DateTime<Utc>,
) -> Result<ActiveQuest, Rejection> {
    let def = catalog.quests().get(id).ok_or_else(|| Rejection::UnknownId {
        kind: "quest",
        id: id.to_owned(),
    })?;
    check_requirements(&def.requires, state)?;
    if state.is_quest_running(&def.id) {
        return Err(Rejection::QuestRunning);
    }
    let available = state.balances.available_believers;
    if available < def.believers_required {
        return Err(Rejection::NotEnoughBelievers {
            required: def.believers_required,
            available,
        });
    }

    Ledger::new(&mut state.balances).reserve_believers(def.believers_required)?;

    let duration = def.duration_seconds * multipliers.quest_duration();
    let quest = ActiveQuest {
        run_id: QuestRunId::new(),
        quest_id: def.id.clone(),
        start_time: now,
        end_time: deadline(now, duration),
        believers_sent: def.believers_required,
    };
    state.active_quests.push(quest.clone());

    debug!(quest = %def.id, run = %quest.run_id, end_time = %quest.end_time, "quest started");
    Ok(quest)
}

/// Remove and return every running quest whose deadline has passed,
/// earliest deadline first.
pub fn take_due(state: &mut GameState, now: DateTime<Utc>) -> Vec<ActiveQuest> {
    let (mut due, running): (Vec<_>, Vec<_>) = state
        .active_quests
        .drain(..)
        .partition(|quest| quest.end_time <= now);
    state.active_quests = running;
    due.sort_by_key(|quest| quest.end_time);
    due
}

/// Resolve one run that has already been removed from the active list.
///
/// `roll` is a uniform draw from `[0, 1)`; the run succeeds when the
/// guaranteed-success flag is set or `roll < success probability`.
/// `eps` is the evidence-per-second snapshot used to size the reward.
pub fn resolve(
    state: &mut GameState,
    catalog: &ContentCatalog,
    multipliers: &Multipliers,
    success_cap: f64,
    eps: f64,
    quest: &ActiveQuest,
    roll: f64,
) -> QuestResolution {
    let mut resolution = QuestResolution {
        run_id: quest.run_id,
        quest_id: quest.quest_id.clone(),
        success: false,
        evidence: 0.0,
        tinfoil: 0,
        believers_lost: 0.0,
    };

    let Some(def) = catalog.quests().get(&quest.quest_id) else {
        // The definition vanished from the catalog: hand the believers back.
        Ledger::new(&mut state.balances)
            .release_believers(quest.believers_sent)
            .ok();
        return resolution;
    };

    resolution.success = multipliers.guaranteed_success
        || roll
            < success_probability(
                def.success_chance,
                multipliers.quest_success.value(),
                success_cap,
            );

    let intended = intended_reward(def, eps);
    let mut ledger = Ledger::new(&mut state.balances);

    if resolution.success {
        resolution.evidence = intended;
        resolution.tinfoil = def.tinfoil_reward;
        ledger.earn_evidence(intended).ok();
        ledger.grant_tinfoil(def.tinfoil_reward);
        ledger.release_believers(quest.believers_sent).ok();
        state.quests_completed = state.quests_completed.saturating_add(1);
    } else {
        match def.risk {
            QuestRisk::Low => {
                let partial = finite_or_clamped(intended * def.fail_evidence_multiplier).max(0.0);
                resolution.evidence = partial;
                ledger.earn_evidence(partial).ok();
                ledger.release_believers(quest.believers_sent).ok();
            }
            QuestRisk::Medium => {
                ledger.release_believers(quest.believers_sent).ok();
            }
            QuestRisk::High => {
                if multipliers.protect_high_risk {
                    ledger.release_believers(quest.believers_sent).ok();
                } else {
                    resolution.believers_lost = quest.believers_sent;
                    ledger.forfeit_believers(quest.believers_sent).ok();
                }
            }
        }
        state.quests_failed = state.quests_failed.saturating_add(1);
    }

    debug!(
        quest = %quest.quest_id,
        run = %quest.run_id,
        success = resolution.success,
        evidence = resolution.evidence,
        tinfoil = resolution.tinfoil,
        believers_lost = resolution.believers_lost,
        "quest resolved"
    );
    resolution
}

/// Evidence a successful run pays at the given EPS.
fn intended_reward(def: &QuestDef, eps: f64) -> f64 {
    finite_or_clamped(def.evidence_multiplier * eps).max(0.0)
}
