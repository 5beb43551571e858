//! Balance invariant verification and enforcement.
//!
//! After every mutation the ledger calls [`enforce`], which restores:
//!
//! - every float balance is finite and `>= 0`
//! - `available_believers <= believers`
//!
//! Tiny negative values from float subtraction are clamped silently.
//! Anything larger indicates a logic error elsewhere: it is logged at
//! `warn` and clamped, and a debug build asserts.
//!
//! [`verify`] performs the same checks without mutating and reports what
//! it found, so saves and tests can confirm a state is healthy.

use tinfoil_types::{Balances, Resource};
use tracing::warn;

use crate::{LedgerAnomaly, balance_of};

/// Below this magnitude a negative balance is float noise, not a bug.
pub const EPSILON: f64 = 1e-9;

/// Result of an invariant check.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantResult {
    /// All invariants hold.
    Healthy,
    /// At least one invariant is violated.
    Violated(LedgerAnomaly),
}

impl InvariantResult {
    /// Whether all invariants hold.
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Check the invariants without mutating.
pub fn verify(balances: &Balances) -> InvariantResult {
    let mut violations = Vec::new();

    for resource in [Resource::Evidence, Resource::Believers] {
        let value = balance_of(balances, resource);
        if !value.is_finite() || value < 0.0 {
            violations.push((resource, value));
        }
    }
    for value in [
        balances.available_believers,
        balances.total_evidence_earned,
        balances.run_evidence_earned,
    ] {
        if !value.is_finite() || value < 0.0 {
            violations.push((Resource::Believers, value));
        }
    }
    if balances.available_believers > balances.believers + EPSILON {
        violations.push((Resource::Believers, balances.available_believers));
    }

    if violations.is_empty() {
        InvariantResult::Healthy
    } else {
        let message = format!("{} balance invariant(s) violated", violations.len());
        InvariantResult::Violated(LedgerAnomaly {
            violations,
            message,
        })
    }
}

/// Restore the invariants in place.
pub fn enforce(balances: &mut Balances) {
    balances.evidence = clamp(Resource::Evidence, balances.evidence);
    balances.total_evidence_earned = clamp(Resource::Evidence, balances.total_evidence_earned);
    balances.run_evidence_earned = clamp(Resource::Evidence, balances.run_evidence_earned);
    balances.believers = clamp(Resource::Believers, balances.believers);
    balances.available_believers = clamp(Resource::Believers, balances.available_believers);

    if balances.available_believers > balances.believers {
        let excess = balances.available_believers - balances.believers;
        if excess > EPSILON {
            warn!(
                available = balances.available_believers,
                believers = balances.believers,
                "available believers exceeded total"
            );
            debug_assert!(excess <= EPSILON, "available believers exceeded total");
        }
        balances.available_believers = balances.believers;
    }
}

/// Clamp one float to a finite, non-negative value.
fn clamp(resource: Resource, value: f64) -> f64 {
    if value.is_nan() {
        warn!(?resource, "balance was NaN, reset to zero");
        return 0.0;
    }
    if value.is_infinite() {
        if value > 0.0 {
            warn!(?resource, "balance overflowed, clamped to maximum");
            return f64::MAX;
        }
        return 0.0;
    }
    if value < 0.0 {
        if value < -EPSILON {
            warn!(?resource, value, "balance went negative, clamped to zero");
        }
        return 0.0;
    }
    value
}
