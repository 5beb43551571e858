//! Resource ledger and balance invariants for the Tinfoil engine.
//!
//! Every change to a numeric balance in [`Balances`] goes through this
//! crate. Operations are check-then-mutate with no intervening observation
//! point: a debit either succeeds in full or leaves the balances untouched.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] view: typed credit/debit operations over
//!   a borrowed [`Balances`].
//! - [`invariants`] -- Verification and enforcement of the balance
//!   invariants (finite, non-negative, `available <= believers`).
//!
//! # Numeric policy
//!
//! Evidence and believers are `f64`. Repeated multiplication and
//! subtraction can leave a tiny negative epsilon, so every float mutation
//! is followed by [`invariants::enforce`], which clamps to `>= 0`.
//! Integer currencies (tinfoil and tokens) use checked subtraction and
//! saturating addition.
//!
//! # Usage
//!
//! ```
//! use tinfoil_ledger::Ledger;
//! use tinfoil_types::Balances;
//!
//! let mut balances = Balances::default();
//! let mut ledger = Ledger::new(&mut balances);
//!
//! ledger.earn_evidence(20.0).ok();
//! assert!(ledger.spend_evidence(15.0).is_ok());
//! assert!(ledger.spend_evidence(15.0).is_err());
//! assert_eq!(balances.evidence, 5.0);
//! assert_eq!(balances.total_evidence_earned, 20.0);
//! ```

pub mod invariants;
pub mod ledger;

// Re-export primary types at crate root.
pub use invariants::InvariantResult;
pub use ledger::Ledger;

use tinfoil_types::{Balances, Resource};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when moving resources.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// The balance does not cover the requested debit.
    #[error("insufficient {resource:?}: requested {requested}, available {available}")]
    Insufficient {
        /// The resource being debited.
        resource: Resource,
        /// The amount requested.
        requested: f64,
        /// The amount available.
        available: f64,
    },

    /// Amounts must not be negative.
    #[error("{resource:?} amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The resource being moved.
        resource: Resource,
        /// The invalid amount.
        amount: f64,
    },

    /// Amounts must be finite.
    #[error("{resource:?} amount must be finite")]
    NonFiniteAmount {
        /// The resource being moved.
        resource: Resource,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// An invariant violation found by [`invariants::verify`].
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAnomaly {
    /// Each violated invariant, as `(resource, offending value)`.
    pub violations: Vec<(Resource, f64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Read the float or integer balance of a resource as `f64`.
pub fn balance_of(balances: &Balances, resource: Resource) -> f64 {
    match resource {
        Resource::Evidence => balances.evidence,
        Resource::Tinfoil => balances.tinfoil as f64,
        Resource::Believers => balances.believers,
        Resource::IlluminatiTokens => balances.illuminati_tokens as f64,
        Resource::GlitchTokens => balances.glitch_tokens as f64,
    }
}
