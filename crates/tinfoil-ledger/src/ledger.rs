//! The [`Ledger`] view over a borrowed [`Balances`].
//!
//! All methods follow the same shape: validate the amount, check the
//! balance, mutate, then restore the invariants. A rejected debit leaves
//! every balance exactly as it was.

use tinfoil_types::{Balances, Resource};
use tracing::trace;

use crate::LedgerError;
use crate::invariants;

/// Typed credit and debit operations on a set of balances.
///
/// The ledger borrows the balances mutably for the duration of one engine
/// operation. It holds no state of its own.
#[derive(Debug)]
pub struct Ledger<'a> {
    balances: &'a mut Balances,
}

impl<'a> Ledger<'a> {
    /// Wrap a set of balances.
    pub const fn new(balances: &'a mut Balances) -> Self {
        Self { balances }
    }

    /// Read-only view of the wrapped balances.
    pub const fn balances(&self) -> &Balances {
        self.balances
    }

    // -----------------------------------------------------------------
    // Evidence
    // -----------------------------------------------------------------

    /// Whether the evidence balance covers `amount`.
    pub fn can_afford_evidence(&self, amount: f64) -> bool {
        amount.is_finite() && amount >= 0.0 && self.balances.evidence >= amount
    }

    /// Credit evidence, also counting it toward lifetime and run totals.
    ///
    /// Returns the amount actually credited.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] or
    /// [`LedgerError::NonFiniteAmount`] for invalid amounts.
    pub fn earn_evidence(&mut self, amount: f64) -> Result<f64, LedgerError> {
        validate(Resource::Evidence, amount)?;
        self.balances.evidence += amount;
        self.balances.total_evidence_earned += amount;
        self.balances.run_evidence_earned += amount;
        invariants::enforce(self.balances);
        trace!(amount, balance = self.balances.evidence, "evidence earned");
        Ok(amount)
    }

    /// Debit evidence.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if the balance does not cover
    /// `amount`; nothing is debited in that case.
    pub fn spend_evidence(&mut self, amount: f64) -> Result<(), LedgerError> {
        validate(Resource::Evidence, amount)?;
        if self.balances.evidence < amount {
            return Err(LedgerError::Insufficient {
                resource: Resource::Evidence,
                requested: amount,
                available: self.balances.evidence,
            });
        }
        self.balances.evidence -= amount;
        invariants::enforce(self.balances);
        trace!(amount, balance = self.balances.evidence, "evidence spent");
        Ok(())
    }

    /// Zero the spendable evidence and the run total (prestige reset).
    /// Lifetime evidence is untouched.
    pub const fn clear_evidence(&mut self) {
        self.balances.evidence = 0.0;
        self.balances.run_evidence_earned = 0.0;
    }

    // -----------------------------------------------------------------
    // Tinfoil
    // -----------------------------------------------------------------

    /// Credit tinfoil.
    pub const fn grant_tinfoil(&mut self, amount: u64) {
        self.balances.tinfoil = self.balances.tinfoil.saturating_add(amount);
    }

    /// Debit tinfoil.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if the balance is too small.
    pub fn spend_tinfoil(&mut self, amount: u64) -> Result<(), LedgerError> {
        self.balances.tinfoil = self.balances.tinfoil.checked_sub(amount).ok_or(
            LedgerError::Insufficient {
                resource: Resource::Tinfoil,
                requested: amount as f64,
                available: self.balances.tinfoil as f64,
            },
        )?;
        trace!(amount, balance = self.balances.tinfoil, "tinfoil spent");
        Ok(())
    }

    /// Zero the tinfoil balance.
    pub const fn clear_tinfoil(&mut self) {
        self.balances.tinfoil = 0;
    }

    // -----------------------------------------------------------------
    // Believers
    // -----------------------------------------------------------------

    /// Recruit believers. They arrive available.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite amounts.
    pub fn recruit_believers(&mut self, amount: f64) -> Result<(), LedgerError> {
        validate(Resource::Believers, amount)?;
        self.balances.believers += amount;
        self.balances.available_believers += amount;
        invariants::enforce(self.balances);
        Ok(())
    }

    /// Reserve available believers for a quest.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if fewer than `amount`
    /// believers are available.
    pub fn reserve_believers(&mut self, amount: f64) -> Result<(), LedgerError> {
        validate(Resource::Believers, amount)?;
        if self.balances.available_believers < amount {
            return Err(LedgerError::Insufficient {
                resource: Resource::Believers,
                requested: amount,
                available: self.balances.available_believers,
            });
        }
        self.balances.available_believers -= amount;
        invariants::enforce(self.balances);
        trace!(
            amount,
            available = self.balances.available_believers,
            "believers reserved"
        );
        Ok(())
    }

    /// Return reserved believers to the available pool.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite amounts.
    pub fn release_believers(&mut self, amount: f64) -> Result<(), LedgerError> {
        validate(Resource::Believers, amount)?;
        self.balances.available_believers =
            (self.balances.available_believers + amount).min(self.balances.believers);
        invariants::enforce(self.balances);
        Ok(())
    }

    /// Permanently remove reserved believers (a failed high-risk quest).
    ///
    /// The believers were already absent from the available pool, so only
    /// the total shrinks.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite amounts.
    pub fn forfeit_believers(&mut self, amount: f64) -> Result<(), LedgerError> {
        validate(Resource::Believers, amount)?;
        self.balances.believers -= amount;
        invariants::enforce(self.balances);
        trace!(amount, believers = self.balances.believers, "believers lost");
        Ok(())
    }

    /// Zero all believers, available and reserved.
    pub const fn clear_believers(&mut self) {
        self.balances.believers = 0.0;
        self.balances.available_believers = 0.0;
    }

    // -----------------------------------------------------------------
    // Prestige currencies
    // -----------------------------------------------------------------

    /// Grant Illuminati tokens from an ascension, counting them toward the
    /// lifetime total that drives the differential yield.
    pub const fn grant_illuminati_tokens(&mut self, amount: u64) {
        self.balances.illuminati_tokens = self.balances.illuminati_tokens.saturating_add(amount);
        self.balances.total_illuminati_tokens_earned = self
            .balances
            .total_illuminati_tokens_earned
            .saturating_add(amount);
    }

    /// Debit Illuminati tokens.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if the balance is too small.
    pub fn spend_illuminati_tokens(&mut self, amount: u64) -> Result<(), LedgerError> {
        self.balances.illuminati_tokens = self
            .balances
            .illuminati_tokens
            .checked_sub(amount)
            .ok_or(LedgerError::Insufficient {
                resource: Resource::IlluminatiTokens,
                requested: amount as f64,
                available: self.balances.illuminati_tokens as f64,
            })?;
        Ok(())
    }

    /// Zero the unspent Illuminati token balance. The lifetime total is
    /// kept.
    pub const fn clear_illuminati_tokens(&mut self) {
        self.balances.illuminati_tokens = 0;
    }

    /// Convert the whole Illuminati balance into glitch tokens at `rate`
    /// Illuminati per glitch, rounding down.
    ///
    /// The full Illuminati balance is consumed, including any remainder
    /// that did not make up a whole glitch token. Returns the glitch tokens
    /// granted.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if the conversion would grant
    /// zero glitch tokens; nothing is consumed in that case.
    pub fn convert_illuminati_to_glitch(&mut self, rate: u64) -> Result<u64, LedgerError> {
        let granted = self
            .balances
            .illuminati_tokens
            .checked_div(rate)
            .unwrap_or(0);
        if granted == 0 {
            return Err(LedgerError::Insufficient {
                resource: Resource::IlluminatiTokens,
                requested: rate as f64,
                available: self.balances.illuminati_tokens as f64,
            });
        }
        self.balances.illuminati_tokens = 0;
        self.balances.glitch_tokens = self.balances.glitch_tokens.saturating_add(granted);
        trace!(granted, "illuminati tokens converted to glitch tokens");
        Ok(granted)
    }

    /// Debit glitch tokens.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] if the balance is too small.
    pub fn spend_glitch_tokens(&mut self, amount: u64) -> Result<(), LedgerError> {
        self.balances.glitch_tokens = self.balances.glitch_tokens.checked_sub(amount).ok_or(
            LedgerError::Insufficient {
                resource: Resource::GlitchTokens,
                requested: amount as f64,
                available: self.balances.glitch_tokens as f64,
            },
        )?;
        Ok(())
    }
}

/// Reject negative and non-finite amounts.
fn validate(resource: Resource, amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::NonFiniteAmount { resource });
    }
    if amount < 0.0 {
        return Err(LedgerError::NegativeAmount { resource, amount });
    }
    Ok(())
}
