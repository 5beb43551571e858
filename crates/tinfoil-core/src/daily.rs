//! The daily challenge generator.
//!
//! The challenge set for a calendar date is a pure function of the date
//! and the template pool: the seed `year * 10000 + month * 100 + day`
//! drives an `xorshift64` Fisher-Yates shuffle of the templates in catalog
//! order, and the first few are taken. Every installation sees the same
//! challenges on the same day.
//!
//! Progress accumulates from gameplay events of the matching
//! [`ChallengeType`]. `completed` flips once `progress >= target`;
//! `claimed` is set by the player and pays the reward exactly once.

use chrono::{Datelike, NaiveDate};
use tinfoil_ledger::Ledger;
use tinfoil_types::{ChallengeType, DailyChallengeTemplate, GameState, StoredChallenge};
use tracing::{debug, info};

use crate::catalog::ContentCatalog;
use crate::rejection::Rejection;

/// Replacement state for a zero seed (xorshift is stuck at zero).
const ZERO_SEED_REPLACEMENT: u64 = 0xdead_beef_cafe_babe;

/// The shuffle seed for a date.
pub fn seed_for(date: NaiveDate) -> u64 {
    let year = u64::try_from(date.year()).unwrap_or(0);
    year.saturating_mul(10_000)
        .saturating_add(u64::from(date.month()) * 100)
        .saturating_add(u64::from(date.day()))
}

/// Deterministic `xorshift64` stream.
#[derive(Debug, Clone)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed },
        }
    }

    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish index in `0..bound`.
    fn below(&mut self, bound: usize) -> usize {
        let bound = u64::try_from(bound).unwrap_or(u64::MAX).max(1);
        usize::try_from(self.next() % bound).unwrap_or(0)
    }
}

/// The templates selected for a date, in selection order.
pub fn generate<'a>(
    catalog: &'a ContentCatalog,
    date: NaiveDate,
    count: usize,
) -> Vec<&'a DailyChallengeTemplate> {
    let mut pool: Vec<&DailyChallengeTemplate> = catalog.daily_challenges().all().iter().collect();
    let mut rng = XorShift64::new(seed_for(date));
    for i in (1..pool.len()).rev() {
        let j = rng.below(i + 1);
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}

/// Replace the stored challenges when the date has changed (or none are
/// stored). Unclaimed challenges from an earlier day are discarded. With
/// an empty template pool nothing is generated.
///
/// Returns whether a new set was generated.
pub fn refresh(
    state: &mut GameState,
    catalog: &ContentCatalog,
    today: NaiveDate,
    count: usize,
) -> bool {
    let current = state
        .daily_challenges
        .first()
        .is_some_and(|challenge| challenge.date == today);
    if current {
        return false;
    }
    if catalog.daily_challenges().is_empty() {
        let stale = !state.daily_challenges.is_empty();
        state.daily_challenges.clear();
        return stale;
    }

    state.daily_challenges = generate(catalog, today, count)
        .into_iter()
        .map(|template| StoredChallenge {
            challenge_id: template.id.clone(),
            date: today,
            challenge_type: template.challenge_type,
            target: template.target,
            progress: 0.0,
            completed: false,
            claimed: false,
        })
        .collect();
    info!(date = %today, count = state.daily_challenges.len(), "daily challenges generated");
    true
}

/// Add progress to every matching challenge.
///
/// Returns the challenges that completed because of this event.
pub fn record(state: &mut GameState, kind: ChallengeType, amount: f64) -> Vec<StoredChallenge> {
    if !(amount > 0.0) {
        return Vec::new();
    }
    let mut completed = Vec::new();
    for challenge in state
        .daily_challenges
        .iter_mut()
        .filter(|challenge| challenge.challenge_type == kind && !challenge.completed)
    {
        challenge.progress = (challenge.progress + amount).min(challenge.target);
        if challenge.progress >= challenge.target {
            challenge.completed = true;
            debug!(challenge = %challenge.challenge_id, "daily challenge completed");
            completed.push(challenge.clone());
        }
    }
    completed
}

/// Pay out a completed challenge once.
///
/// Returns the tinfoil granted.
pub fn claim(state: &mut GameState, catalog: &ContentCatalog, id: &str) -> Result<u64, Rejection> {
    let challenge = state
        .daily_challenges
        .iter_mut()
        .find(|challenge| challenge.challenge_id.as_str() == id)
        .ok_or_else(|| Rejection::UnknownId {
            kind: "daily challenge",
            id: id.to_owned(),
        })?;
    if !challenge.completed {
        return Err(Rejection::NotCompleted);
    }
    if challenge.claimed {
        return Err(Rejection::AlreadyClaimed);
    }
    let reward = catalog
        .daily_challenges()
        .get(&challenge.challenge_id)
        .map_or(0, |template| template.tinfoil_reward);
    challenge.claimed = true;
    Ledger::new(&mut state.balances).grant_tinfoil(reward);
    info!(challenge = id, reward, "daily challenge claimed");
    Ok(reward)
}
