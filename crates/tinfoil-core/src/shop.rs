//! One-time purchases: upgrades, conspiracies, skills, and the two
//! prestige upgrade trees.
//!
//! Every operation checks ownership, requirements and price before it
//! touches the state, so a rejection leaves everything unchanged.

use tinfoil_ledger::Ledger;
use tinfoil_types::{GameState, UpgradeCurrency};
use tracing::{debug, info};

use crate::catalog::ContentCatalog;
use crate::numbers::floor_to_u64;
use crate::rejection::{Rejection, check_requirements};

/// Buy an evidence or tinfoil shop upgrade.
pub fn purchase_upgrade(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
) -> Result<(), Rejection> {
    let def = catalog.upgrades().get(id).ok_or_else(|| Rejection::UnknownId {
        kind: "upgrade",
        id: id.to_owned(),
    })?;
    if state.purchased_upgrades.contains(&def.id)
        || state.purchased_tinfoil_upgrades.contains(&def.id)
    {
        return Err(Rejection::AlreadyOwned);
    }
    check_requirements(&def.requires, state)?;

    let mut ledger = Ledger::new(&mut state.balances);
    match def.currency {
        UpgradeCurrency::Evidence => {
            ledger.spend_evidence(def.cost)?;
            state.purchased_upgrades.insert(def.id.clone());
        }
        UpgradeCurrency::Tinfoil => {
            ledger.spend_tinfoil(floor_to_u64(def.cost))?;
            state.purchased_tinfoil_upgrades.insert(def.id.clone());
        }
    }

    debug!(upgrade = %def.id, currency = ?def.currency, cost = def.cost, "upgrade purchased");
    Ok(())
}

/// Prove a conspiracy: spend evidence, check believers, grant tinfoil.
///
/// Returns the tinfoil granted.
pub fn prove_conspiracy(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
) -> Result<u64, Rejection> {
    let def = catalog
        .conspiracies()
        .get(id)
        .ok_or_else(|| Rejection::UnknownId {
            kind: "conspiracy",
            id: id.to_owned(),
        })?;
    if state.proven_conspiracies.contains(&def.id) {
        return Err(Rejection::AlreadyOwned);
    }
    check_requirements(&def.requires, state)?;
    let available = state.balances.available_believers;
    if available < def.believers_required {
        return Err(Rejection::NotEnoughBelievers {
            required: def.believers_required,
            available,
        });
    }

    let mut ledger = Ledger::new(&mut state.balances);
    ledger.spend_evidence(def.evidence_cost)?;
    ledger.grant_tinfoil(def.tinfoil_reward);
    state.proven_conspiracies.insert(def.id.clone());

    info!(conspiracy = %def.id, tinfoil = def.tinfoil_reward, "conspiracy proven");
    Ok(def.tinfoil_reward)
}

/// Unlock a skill-tree node with tinfoil.
pub fn unlock_skill(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
) -> Result<(), Rejection> {
    let def = catalog.skills().get(id).ok_or_else(|| Rejection::UnknownId {
        kind: "skill",
        id: id.to_owned(),
    })?;
    if state.unlocked_skills.contains(&def.id) {
        return Err(Rejection::AlreadyOwned);
    }
    check_requirements(&def.requires, state)?;

    Ledger::new(&mut state.balances).spend_tinfoil(def.tinfoil_cost)?;
    state.unlocked_skills.insert(def.id.clone());

    debug!(skill = %def.id, cost = def.tinfoil_cost, "skill unlocked");
    Ok(())
}

/// Buy an Illuminati upgrade with Illuminati tokens.
pub fn purchase_illuminati_upgrade(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
) -> Result<(), Rejection> {
    let def = catalog
        .prestige_upgrades()
        .get(id)
        .ok_or_else(|| Rejection::UnknownId {
            kind: "illuminati upgrade",
            id: id.to_owned(),
        })?;
    if state.purchased_illuminati_upgrades.contains(&def.id) {
        return Err(Rejection::AlreadyOwned);
    }
    if let Some(prerequisite) = &def.prerequisite
        && !state.purchased_illuminati_upgrades.contains(prerequisite)
    {
        return Err(Rejection::MissingPrerequisite(prerequisite.to_string()));
    }

    Ledger::new(&mut state.balances).spend_illuminati_tokens(def.token_cost)?;
    state.purchased_illuminati_upgrades.insert(def.id.clone());

    info!(upgrade = %def.id, tokens = def.token_cost, "illuminati upgrade purchased");
    Ok(())
}

/// Buy a matrix upgrade with glitch tokens.
pub fn purchase_matrix_upgrade(
    state: &mut GameState,
    catalog: &ContentCatalog,
    id: &str,
) -> Result<(), Rejection> {
    let def = catalog
        .matrix_upgrades()
        .get(id)
        .ok_or_else(|| Rejection::UnknownId {
            kind: "matrix upgrade",
            id: id.to_owned(),
        })?;
    if state.purchased_matrix_upgrades.contains(&def.id) {
        return Err(Rejection::AlreadyOwned);
    }
    if let Some(prerequisite) = &def.prerequisite
        && !state.purchased_matrix_upgrades.contains(prerequisite)
    {
        return Err(Rejection::MissingPrerequisite(prerequisite.to_string()));
    }

    Ledger::new(&mut state.balances).spend_glitch_tokens(def.glitch_cost)?;
    state.purchased_matrix_upgrades.insert(def.id.clone());

    info!(upgrade = %def.id, glitch = def.glitch_cost, "matrix upgrade purchased");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tinfoil_ledger::LedgerError;
    use tinfoil_types::{ConspiracyId, PrestigeUpgradeId, SkillId, UpgradeId};

    use super::*;

    fn catalog() -> ContentCatalog {
        let yaml = r"
upgrades:
  - { id: sharper_pencil, name: Sharper Pencil, cost: 100, effect: { kind: click_power, value: 1 } }
  - id: foil_hat
    name: Foil Hat
    currency: tinfoil
    cost: 5
    effect: { kind: click_multiplier, value: 2 }
  - id: second_pencil
    name: Second Pencil
    cost: 10
    requires: [ { kind: upgrade, value: sharper_pencil } ]
    effect: { kind: click_power, value: 1 }
conspiracies:
  - id: moon_landing
    name: Moon Landing
    evidence_cost: 1000
    believers_required: 10
    tinfoil_reward: 3
    effect: { kind: production_multiplier, value: 1.5 }
skills:
  - { id: paranoia, name: Paranoia, tinfoil_cost: 4, effect: { kind: crit_chance, value: 0.05 } }
prestige_upgrades:
  - { id: inner_circle, name: Inner Circle, token_cost: 2, effect: { kind: production_multiplier, value: 2 } }
  - id: secret_handshake
    name: Secret Handshake
    token_cost: 1
    prerequisite: inner_circle
    effect: { kind: click_multiplier, value: 2 }
matrix_upgrades:
  - { id: deja_vu, name: Deja Vu, glitch_cost: 1, effect: { kind: offline_efficiency, value: 0.5 } }
";
        ContentCatalog::parse(yaml).unwrap()
    }

    #[test]
    fn evidence_upgrade_is_bought_once() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 250.0;

        purchase_upgrade(&mut state, &catalog, "sharper_pencil").unwrap();
        assert!(state.purchased_upgrades.contains(&UpgradeId::new("sharper_pencil")));
        assert_eq!(state.balances.evidence, 150.0);
        assert_eq!(
            purchase_upgrade(&mut state, &catalog, "sharper_pencil"),
            Err(Rejection::AlreadyOwned)
        );
        assert_eq!(state.balances.evidence, 150.0);
    }

    #[test]
    fn tinfoil_upgrade_spends_tinfoil() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.tinfoil = 7;
        purchase_upgrade(&mut state, &catalog, "foil_hat").unwrap();
        assert_eq!(state.balances.tinfoil, 2);
        assert!(state.purchased_tinfoil_upgrades.contains(&UpgradeId::new("foil_hat")));
        assert!(state.purchased_upgrades.is_empty());
    }

    #[test]
    fn locked_upgrade_is_rejected() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 1000.0;
        assert!(matches!(
            purchase_upgrade(&mut state, &catalog, "second_pencil"),
            Err(Rejection::Locked(_))
        ));
    }

    #[test]
    fn unaffordable_upgrade_leaves_state_alone() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 99.0;
        let before = state.clone();
        assert!(matches!(
            purchase_upgrade(&mut state, &catalog, "sharper_pencil"),
            Err(Rejection::Ledger(LedgerError::Insufficient { .. }))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn conspiracy_needs_believers_but_keeps_them() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 1000.0;
        state.balances.believers = 5.0;
        state.balances.available_believers = 5.0;
        assert!(matches!(
            prove_conspiracy(&mut state, &catalog, "moon_landing"),
            Err(Rejection::NotEnoughBelievers { .. })
        ));

        state.balances.believers = 10.0;
        state.balances.available_believers = 10.0;
        assert_eq!(prove_conspiracy(&mut state, &catalog, "moon_landing"), Ok(3));
        assert_eq!(state.balances.evidence, 0.0);
        assert_eq!(state.balances.available_believers, 10.0);
        assert_eq!(state.balances.tinfoil, 3);
        assert!(state.proven_conspiracies.contains(&ConspiracyId::new("moon_landing")));
        assert_eq!(
            prove_conspiracy(&mut state, &catalog, "moon_landing"),
            Err(Rejection::AlreadyOwned)
        );
    }

    #[test]
    fn skill_costs_tinfoil() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.tinfoil = 3;
        assert!(unlock_skill(&mut state, &catalog, "paranoia").is_err());
        state.balances.tinfoil = 4;
        unlock_skill(&mut state, &catalog, "paranoia").unwrap();
        assert!(state.unlocked_skills.contains(&SkillId::new("paranoia")));
        assert_eq!(state.balances.tinfoil, 0);
    }

    #[test]
    fn illuminati_prerequisite_is_enforced() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        state.balances.illuminati_tokens = 5;
        assert_eq!(
            purchase_illuminati_upgrade(&mut state, &catalog, "secret_handshake"),
            Err(Rejection::MissingPrerequisite("inner_circle".to_owned()))
        );
        purchase_illuminati_upgrade(&mut state, &catalog, "inner_circle").unwrap();
        purchase_illuminati_upgrade(&mut state, &catalog, "secret_handshake").unwrap();
        assert_eq!(state.balances.illuminati_tokens, 2);
        assert!(
            state
                .purchased_illuminati_upgrades
                .contains(&PrestigeUpgradeId::new("secret_handshake"))
        );
    }

    #[test]
    fn matrix_upgrade_spends_glitch_tokens() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        assert!(purchase_matrix_upgrade(&mut state, &catalog, "deja_vu").is_err());
        state.balances.glitch_tokens = 1;
        purchase_matrix_upgrade(&mut state, &catalog, "deja_vu").unwrap();
        assert_eq!(state.balances.glitch_tokens, 0);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let catalog = catalog();
        let mut state = GameState::new(Utc::now());
        assert!(matches!(
            purchase_upgrade(&mut state, &catalog, "nope"),
            Err(Rejection::UnknownId { kind: "upgrade", .. })
        ));
        assert!(matches!(
            unlock_skill(&mut state, &catalog, "nope"),
            Err(Rejection::UnknownId { kind: "skill", .. })
        ));
    }
}
