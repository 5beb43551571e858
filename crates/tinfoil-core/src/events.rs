//! Random events, temporary buffs, the Golden Eye frenzy and flavor text.
//!
//! Each tick rolls `events.chance_per_tick`; on a hit one catalog event is
//! drawn by weight and applied. Buffs and the Golden Eye store absolute
//! expiry times and are swept by [`expire`] at the start of every tick.

use chrono::{DateTime, Utc};
use tinfoil_ledger::Ledger;
use tinfoil_types::{ActiveBuff, GameState, RandomEventDef, RandomEventKind};
use tracing::{debug, info};

use crate::catalog::ContentCatalog;
use crate::config::EngineConfig;
use crate::numbers::deadline;

/// What applying an event changed, for notification purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The Golden Eye started or was extended until this time.
    GoldenEye {
        /// New end of the frenzy.
        ends_at: DateTime<Utc>,
        /// Whether it was already running.
        extended: bool,
    },
    /// Evidence was granted.
    Windfall {
        /// Evidence granted.
        evidence: f64,
    },
    /// Tinfoil was granted.
    TinfoilCache {
        /// Tinfoil granted.
        amount: u64,
    },
    /// A buff was added.
    Buff {
        /// When it ends.
        expires_at: DateTime<Utc>,
    },
}

/// Pick an event by weight. `roll` is any uniform `u64`.
pub fn pick(catalog: &ContentCatalog, roll: u64) -> Option<&RandomEventDef> {
    let events = catalog.random_events().all();
    let total: u64 = events.iter().map(|def| u64::from(def.weight)).sum();
    if total == 0 {
        return None;
    }
    let mut target = roll % total;
    for def in events {
        let weight = u64::from(def.weight);
        if target < weight {
            return Some(def);
        }
        target -= weight;
    }
    None
}

/// Apply an event to the state.
pub fn apply(
    state: &mut GameState,
    config: &EngineConfig,
    def: &RandomEventDef,
    eps: f64,
    now: DateTime<Utc>,
) -> EventOutcome {
    let outcome = match &def.kind {
        RandomEventKind::GoldenEye => start_golden_eye(state, config, now),
        RandomEventKind::Windfall { eps_seconds } => {
            let evidence = Ledger::new(&mut state.balances)
                .earn_evidence((eps * eps_seconds).max(0.0))
                .unwrap_or(0.0);
            EventOutcome::Windfall { evidence }
        }
        RandomEventKind::TinfoilCache { amount } => {
            Ledger::new(&mut state.balances).grant_tinfoil(*amount);
            EventOutcome::TinfoilCache { amount: *amount }
        }
        RandomEventKind::Buff { effect, seconds } => {
            let expires_at = deadline(now, *seconds);
            state.active_buffs.push(ActiveBuff {
                event_id: def.id.clone(),
                effect: effect.clone(),
                expires_at,
            });
            EventOutcome::Buff { expires_at }
        }
    };
    info!(event = %def.id, outcome = ?outcome, "random event");
    outcome
}

/// Start the Golden Eye, or push back its end if it is already running.
pub fn start_golden_eye(
    state: &mut GameState,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> EventOutcome {
    let extended = state.golden_eye_active;
    let from = state
        .golden_eye_end_time
        .filter(|_| extended)
        .map_or(now, |end| end.max(now));
    let ends_at = deadline(from, config.golden_eye.duration_seconds);
    state.golden_eye_active = true;
    state.golden_eye_end_time = Some(ends_at);
    EventOutcome::GoldenEye { ends_at, extended }
}

/// Drop expired buffs and end the Golden Eye when due.
///
/// Returns `true` when the Golden Eye ended.
pub fn expire(state: &mut GameState, now: DateTime<Utc>) -> bool {
    let before = state.active_buffs.len();
    state.active_buffs.retain(|buff| now < buff.expires_at);
    let dropped = before - state.active_buffs.len();
    if dropped > 0 {
        debug!(dropped, "buffs expired");
    }

    let ended = state.golden_eye_active
        && state.golden_eye_end_time.is_none_or(|end| now >= end);
    if ended {
        state.golden_eye_active = false;
        state.golden_eye_end_time = None;
    }
    ended
}

/// The flavor message due on this tick, if any.
pub fn flavor_message<'a>(
    catalog: &'a ContentCatalog,
    config: &EngineConfig,
    tick: u64,
) -> Option<&'a str> {
    let interval = config.events.flavor_interval_ticks;
    let messages = catalog.flavor_messages();
    if interval == 0 || messages.is_empty() || tick == 0 || tick % interval != 0 {
        return None;
    }
    let index = usize::try_from((tick / interval - 1) % messages.len() as u64).ok()?;
    messages.get(index).map(String::as_str)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn catalog() -> ContentCatalog {
        let yaml = r"
random_events:
  - { id: golden_eye, name: Golden Eye, weight: 1, kind: { kind: golden_eye } }
  - { id: leak, name: Leaked Memo, weight: 3, kind: { kind: windfall, value: { eps_seconds: 60 } } }
  - id: rally
    name: Rally
    weight: 1
    kind: { kind: buff, value: { effect: { kind: production_multiplier, value: 2 }, seconds: 30 } }
flavor_messages:
  - The birds are watching.
  - Check the water supply.
";
        ContentCatalog::parse(yaml).unwrap()
    }

    #[test]
    fn pick_respects_weights() {
        let catalog = catalog();
        assert_eq!(pick(&catalog, 0).unwrap().id.as_str(), "golden_eye");
        assert_eq!(pick(&catalog, 1).unwrap().id.as_str(), "leak");
        assert_eq!(pick(&catalog, 3).unwrap().id.as_str(), "leak");
        assert_eq!(pick(&catalog, 4).unwrap().id.as_str(), "rally");
        assert_eq!(pick(&catalog, 5).unwrap().id.as_str(), "golden_eye");
    }

    #[test]
    fn empty_pool_picks_nothing() {
        let catalog = ContentCatalog::parse("{}").unwrap();
        assert!(pick(&catalog, 7).is_none());
    }

    #[test]
    fn windfall_pays_seconds_of_eps() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut state = GameState::new(Utc::now());
        let leak = catalog.random_events().get("leak").unwrap();
        let outcome = apply(&mut state, &config, leak, 2.0, Utc::now());
        assert_eq!(outcome, EventOutcome::Windfall { evidence: 120.0 });
        assert_eq!(state.balances.evidence, 120.0);
    }

    #[test]
    fn golden_eye_extends_while_running() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let mut state = GameState::new(now);
        let first = start_golden_eye(&mut state, &config, now);
        assert_eq!(
            first,
            EventOutcome::GoldenEye {
                ends_at: now + TimeDelta::seconds(20),
                extended: false,
            }
        );
        let later = now + TimeDelta::seconds(5);
        let second = start_golden_eye(&mut state, &config, later);
        assert_eq!(
            second,
            EventOutcome::GoldenEye {
                ends_at: now + TimeDelta::seconds(40),
                extended: true,
            }
        );
    }

    #[test]
    fn golden_eye_ends_on_time() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let mut state = GameState::new(now);
        start_golden_eye(&mut state, &config, now);
        assert!(!expire(&mut state, now + TimeDelta::seconds(19)));
        assert!(state.golden_eye_active);
        assert!(expire(&mut state, now + TimeDelta::seconds(20)));
        assert!(!state.golden_eye_active);
        assert!(!expire(&mut state, now + TimeDelta::seconds(21)));
    }

    #[test]
    fn buffs_expire() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let now = Utc::now();
        let mut state = GameState::new(now);
        let rally = catalog.random_events().get("rally").unwrap();
        apply(&mut state, &config, rally, 0.0, now);
        assert_eq!(state.active_buffs.len(), 1);
        expire(&mut state, now + TimeDelta::seconds(29));
        assert_eq!(state.active_buffs.len(), 1);
        expire(&mut state, now + TimeDelta::seconds(30));
        assert!(state.active_buffs.is_empty());
    }

    #[test]
    fn flavor_cycles_on_interval() {
        let catalog = catalog();
        let config = EngineConfig::default();
        assert!(flavor_message(&catalog, &config, 0).is_none());
        assert!(flavor_message(&catalog, &config, 119).is_none());
        assert_eq!(flavor_message(&catalog, &config, 120), Some("The birds are watching."));
        assert_eq!(flavor_message(&catalog, &config, 240), Some("Check the water supply."));
        assert_eq!(flavor_message(&catalog, &config, 360), Some("The birds are watching."));
    }
}
