//! Why an intent was refused.
//!
//! Refusals are ordinary gameplay, not errors: the engine logs the
//! [`Rejection`] at `debug` and reports `false`/`0`/`None` to the caller.
//! Every subsystem checks everything before it mutates anything, so a
//! rejected intent leaves the state untouched.

use tinfoil_ledger::LedgerError;
use tinfoil_types::{GameState, Requirement};

/// The reason an intent was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// No definition with this id exists.
    #[error("unknown {kind} `{id}`")]
    UnknownId {
        /// What kind of definition was looked up.
        kind: &'static str,
        /// The id requested.
        id: String,
    },

    /// A one-time purchase is already owned.
    #[error("already owned")]
    AlreadyOwned,

    /// A precondition is not met.
    #[error("requirement not met: {0:?}")]
    Locked(Requirement),

    /// A prerequisite upgrade is missing.
    #[error("prerequisite `{0}` not owned")]
    MissingPrerequisite(String),

    /// The balance does not cover the price.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Not enough available believers.
    #[error("needs {required} available believers, have {available}")]
    NotEnoughBelievers {
        /// Believers needed.
        required: f64,
        /// Believers available.
        available: f64,
    },

    /// The quest is already running.
    #[error("quest already running")]
    QuestRunning,

    /// A prestige tier's gate is closed.
    #[error("not eligible")]
    NotEligible,

    /// The challenge is not complete yet.
    #[error("challenge not completed")]
    NotCompleted,

    /// The challenge reward was already paid out.
    #[error("already claimed")]
    AlreadyClaimed,

    /// The intent carried an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Return the first unmet requirement, if any.
pub fn first_unmet<'a>(requires: &'a [Requirement], state: &GameState) -> Option<&'a Requirement> {
    requires.iter().find(|requirement| !is_met(requirement, state))
}

/// Check every requirement, rejecting with the first unmet one.
pub fn check_requirements(requires: &[Requirement], state: &GameState) -> Result<(), Rejection> {
    first_unmet(requires, state).map_or(Ok(()), |unmet| Err(Rejection::Locked(unmet.clone())))
}

/// Whether one requirement holds for the current state.
pub fn is_met(requirement: &Requirement, state: &GameState) -> bool {
    match requirement {
        Requirement::TotalEvidence(amount) => state.balances.total_evidence_earned >= *amount,
        Requirement::GeneratorOwned { generator, count } => state.owned(generator) >= *count,
        Requirement::Upgrade(upgrade) => {
            state.purchased_upgrades.contains(upgrade)
                || state.purchased_tinfoil_upgrades.contains(upgrade)
        }
        Requirement::Conspiracy(conspiracy) => state.proven_conspiracies.contains(conspiracy),
        Requirement::Skill(skill) => state.unlocked_skills.contains(skill),
        Requirement::TimesAscended(times) => state.times_ascended >= *times,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tinfoil_types::{GeneratorId, SkillId, UpgradeId};

    use super::*;

    #[test]
    fn empty_requirements_are_met() {
        let state = GameState::new(Utc::now());
        assert!(check_requirements(&[], &state).is_ok());
    }

    #[test]
    fn generator_count_requirement() {
        let mut state = GameState::new(Utc::now());
        let requirement = Requirement::GeneratorOwned {
            generator: GeneratorId::new("red_string"),
            count: 10,
        };
        assert!(!is_met(&requirement, &state));
        state.generator_counts.insert(GeneratorId::new("red_string"), 10);
        assert!(is_met(&requirement, &state));
    }

    #[test]
    fn first_unmet_requirement_is_reported() {
        let mut state = GameState::new(Utc::now());
        state.purchased_upgrades.insert(UpgradeId::new("tinfoil_hat"));
        let requires = vec![
            Requirement::Upgrade(UpgradeId::new("tinfoil_hat")),
            Requirement::Skill(SkillId::new("paranoia")),
        ];
        assert_eq!(
            check_requirements(&requires, &state),
            Err(Rejection::Locked(Requirement::Skill(SkillId::new("paranoia"))))
        );
    }

    #[test]
    fn tinfoil_upgrades_satisfy_upgrade_requirements() {
        let mut state = GameState::new(Utc::now());
        state
            .purchased_tinfoil_upgrades
            .insert(UpgradeId::new("foil_lining"));
        assert!(is_met(
            &Requirement::Upgrade(UpgradeId::new("foil_lining")),
            &state
        ));
    }
}
