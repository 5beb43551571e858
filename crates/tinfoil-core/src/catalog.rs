//! The immutable content catalog.
//!
//! All static definitions (generators, upgrades, conspiracies, skills,
//! quests, achievements, prestige and matrix upgrades, daily challenge
//! templates, random events and flavor text) are read once from a YAML
//! document, validated, and frozen into a [`ContentCatalog`]. The engine
//! holds it behind an `Arc` and never mutates it.
//!
//! Each table keeps definitions in document order ([`Table::all`]) with
//! an id index ([`Table::get`]).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tinfoil_types::{
    AchievementDef, AchievementKind, ConspiracyDef, DailyChallengeTemplate, Effect, GeneratorDef,
    MatrixUpgradeDef, PrestigeUpgradeDef, QuestDef, RandomEventDef, RandomEventKind, Requirement,
    SkillDef, UpgradeDef, UpgradeCurrency,
};
use tracing::info;

/// The catalog compiled into the binary.
const BUNDLED_CATALOG: &str = include_str!("../content/default-catalog.yaml");

/// Errors that can occur when loading the content catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file from disk.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// Two definitions in one table share an id.
    #[error("duplicate {table} id `{id}`")]
    DuplicateId {
        /// Table containing the duplicate.
        table: &'static str,
        /// The repeated id.
        id: String,
    },

    /// A definition refers to an id that does not exist.
    #[error("{table} `{id}` references unknown {kind} `{reference}`")]
    DanglingReference {
        /// Table of the referring definition.
        table: &'static str,
        /// Id of the referring definition.
        id: String,
        /// What kind of thing is referenced.
        kind: &'static str,
        /// The missing id.
        reference: String,
    },

    /// A definition carries a value the engine cannot use.
    #[error("{table} `{id}` is invalid: {reason}")]
    InvalidDefinition {
        /// Table of the definition.
        table: &'static str,
        /// Id of the definition.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A definition with a catalog key.
pub trait Keyed {
    /// The key, as a string.
    fn key(&self) -> &str;
}

macro_rules! keyed {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                self.id.as_str()
            }
        })*
    };
}

keyed!(
    GeneratorDef,
    UpgradeDef,
    ConspiracyDef,
    SkillDef,
    QuestDef,
    AchievementDef,
    PrestigeUpgradeDef,
    MatrixUpgradeDef,
    DailyChallengeTemplate,
    RandomEventDef,
);

/// An ordered, id-indexed table of definitions.
#[derive(Debug, Clone)]
pub struct Table<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Table<T> {
    /// Build a table, rejecting duplicate ids.
    fn build(table: &'static str, items: Vec<T>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.key().to_owned(), position).is_some() {
                return Err(CatalogError::DuplicateId {
                    table,
                    id: item.key().to_owned(),
                });
            }
        }
        Ok(Self { items, index })
    }

    /// Look up a definition by id.
    pub fn get<K: Borrow<str> + ?Sized>(&self, id: &K) -> Option<&T> {
        self.index
            .get(id.borrow())
            .and_then(|&position| self.items.get(position))
    }

    /// Whether an id exists.
    pub fn contains<K: Borrow<str> + ?Sized>(&self, id: &K) -> bool {
        self.index.contains_key(id.borrow())
    }

    /// All definitions in document order.
    pub fn all(&self) -> &[T] {
        &self.items
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The raw catalog document as written in YAML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogDocument {
    /// Generators.
    #[serde(default)]
    pub generators: Vec<GeneratorDef>,
    /// Evidence and tinfoil shop upgrades.
    #[serde(default)]
    pub upgrades: Vec<UpgradeDef>,
    /// Conspiracies.
    #[serde(default)]
    pub conspiracies: Vec<ConspiracyDef>,
    /// Skill tree nodes.
    #[serde(default)]
    pub skills: Vec<SkillDef>,
    /// Quests.
    #[serde(default)]
    pub quests: Vec<QuestDef>,
    /// Achievements.
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
    /// Illuminati upgrades.
    #[serde(default)]
    pub prestige_upgrades: Vec<PrestigeUpgradeDef>,
    /// Matrix upgrades.
    #[serde(default)]
    pub matrix_upgrades: Vec<MatrixUpgradeDef>,
    /// Daily challenge templates.
    #[serde(default)]
    pub daily_challenges: Vec<DailyChallengeTemplate>,
    /// Random events.
    #[serde(default)]
    pub random_events: Vec<RandomEventDef>,
    /// Flavor messages cycled during play.
    #[serde(default)]
    pub flavor_messages: Vec<String>,
}

// ---------------------------------------------------------------------------
// ContentCatalog
// ---------------------------------------------------------------------------

/// Validated, immutable content tables.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    generators: Table<GeneratorDef>,
    upgrades: Table<UpgradeDef>,
    conspiracies: Table<ConspiracyDef>,
    skills: Table<SkillDef>,
    quests: Table<QuestDef>,
    achievements: Table<AchievementDef>,
    prestige_upgrades: Table<PrestigeUpgradeDef>,
    matrix_upgrades: Table<MatrixUpgradeDef>,
    daily_challenges: Table<DailyChallengeTemplate>,
    random_events: Table<RandomEventDef>,
    flavor_messages: Vec<String>,
}

impl ContentCatalog {
    /// The catalog bundled with the engine.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled document is itself invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::parse(BUNDLED_CATALOG)
    }

    /// Load and validate a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or any
    /// parse or validation error from [`ContentCatalog::parse`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&contents)?;
        info!(path = %path.display(), "content catalog loaded");
        Ok(catalog)
    }

    /// Parse and validate a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] for malformed YAML, or a validation
    /// error for duplicate ids, dangling references or invalid values.
    pub fn parse(yaml: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_yml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Validate and freeze an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns a validation error for duplicate ids, dangling references
    /// or invalid values.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let catalog = Self {
            generators: Table::build("generator", document.generators)?,
            upgrades: Table::build("upgrade", document.upgrades)?,
            conspiracies: Table::build("conspiracy", document.conspiracies)?,
            skills: Table::build("skill", document.skills)?,
            quests: Table::build("quest", document.quests)?,
            achievements: Table::build("achievement", document.achievements)?,
            prestige_upgrades: Table::build("prestige upgrade", document.prestige_upgrades)?,
            matrix_upgrades: Table::build("matrix upgrade", document.matrix_upgrades)?,
            daily_challenges: Table::build("daily challenge", document.daily_challenges)?,
            random_events: Table::build("random event", document.random_events)?,
            flavor_messages: document.flavor_messages,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Generators.
    pub const fn generators(&self) -> &Table<GeneratorDef> {
        &self.generators
    }

    /// Evidence and tinfoil shop upgrades.
    pub const fn upgrades(&self) -> &Table<UpgradeDef> {
        &self.upgrades
    }

    /// Conspiracies.
    pub const fn conspiracies(&self) -> &Table<ConspiracyDef> {
        &self.conspiracies
    }

    /// Skill tree nodes.
    pub const fn skills(&self) -> &Table<SkillDef> {
        &self.skills
    }

    /// Quests.
    pub const fn quests(&self) -> &Table<QuestDef> {
        &self.quests
    }

    /// Achievements.
    pub const fn achievements(&self) -> &Table<AchievementDef> {
        &self.achievements
    }

    /// Illuminati upgrades.
    pub const fn prestige_upgrades(&self) -> &Table<PrestigeUpgradeDef> {
        &self.prestige_upgrades
    }

    /// Matrix upgrades.
    pub const fn matrix_upgrades(&self) -> &Table<MatrixUpgradeDef> {
        &self.matrix_upgrades
    }

    /// Daily challenge templates.
    pub const fn daily_challenges(&self) -> &Table<DailyChallengeTemplate> {
        &self.daily_challenges
    }

    /// Random events.
    pub const fn random_events(&self) -> &Table<RandomEventDef> {
        &self.random_events
    }

    /// Flavor messages.
    pub fn flavor_messages(&self) -> &[String] {
        &self.flavor_messages
    }

    // -----------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------

    fn validate(&self) -> Result<(), CatalogError> {
        for def in self.generators.all() {
            let table = "generator";
            check(table, &def.id, def.base_cost > 0.0, "base_cost must be positive")?;
            check(
                table,
                &def.id,
                def.cost_multiplier > 1.0 && def.cost_multiplier.is_finite(),
                "cost_multiplier must be greater than 1",
            )?;
            check(
                table,
                &def.id,
                def.base_production >= 0.0 && def.believers_per_second >= 0.0,
                "production must not be negative",
            )?;
            self.check_requirements(table, def.id.as_str(), &def.requires)?;
        }

        for def in self.upgrades.all() {
            let table = "upgrade";
            check(table, &def.id, def.cost >= 0.0, "cost must not be negative")?;
            if def.currency == UpgradeCurrency::Tinfoil {
                check(
                    table,
                    &def.id,
                    def.cost.fract() == 0.0,
                    "tinfoil prices must be whole units",
                )?;
            }
            self.check_requirements(table, def.id.as_str(), &def.requires)?;
            self.check_effect(table, def.id.as_str(), &def.effect)?;
        }

        for def in self.conspiracies.all() {
            let table = "conspiracy";
            check(
                table,
                &def.id,
                def.evidence_cost >= 0.0 && def.believers_required >= 0.0,
                "costs must not be negative",
            )?;
            self.check_requirements(table, def.id.as_str(), &def.requires)?;
            self.check_effect(table, def.id.as_str(), &def.effect)?;
        }

        for def in self.skills.all() {
            let table = "skill";
            self.check_requirements(table, def.id.as_str(), &def.requires)?;
            self.check_effect(table, def.id.as_str(), &def.effect)?;
        }

        for def in self.quests.all() {
            let table = "quest";
            check(
                table,
                &def.id,
                (0.0..=1.0).contains(&def.success_chance),
                "success_chance must be in [0, 1]",
            )?;
            check(
                table,
                &def.id,
                (0.0..=1.0).contains(&def.fail_evidence_multiplier),
                "fail_evidence_multiplier must be in [0, 1]",
            )?;
            check(
                table,
                &def.id,
                def.duration_seconds >= 0.0
                    && def.believers_required >= 0.0
                    && def.evidence_multiplier >= 0.0,
                "duration, believers and rewards must not be negative",
            )?;
            check(
                table,
                &def.id,
                def.duration_seconds.is_finite(),
                "duration must be finite",
            )?;
            self.check_requirements(table, def.id.as_str(), &def.requires)?;
        }

        for def in self.achievements.all() {
            let table = "achievement";
            check(table, &def.id, def.threshold >= 0.0, "threshold must not be negative")?;
            if let AchievementKind::GeneratorOwned(generator) = &def.kind {
                self.check_generator(table, def.id.as_str(), generator.as_str())?;
            }
            if let Some(effect) = &def.reward {
                self.check_effect(table, def.id.as_str(), effect)?;
            }
        }

        for def in self.prestige_upgrades.all() {
            let table = "prestige upgrade";
            if let Some(parent) = &def.prerequisite {
                if !self.prestige_upgrades.contains(parent) {
                    return Err(dangling(table, def.id.as_str(), table, parent.as_str()));
                }
            }
            self.check_effect(table, def.id.as_str(), &def.effect)?;
        }

        for def in self.matrix_upgrades.all() {
            let table = "matrix upgrade";
            if let Some(parent) = &def.prerequisite {
                if !self.matrix_upgrades.contains(parent) {
                    return Err(dangling(table, def.id.as_str(), table, parent.as_str()));
                }
            }
            self.check_effect(table, def.id.as_str(), &def.effect)?;
        }

        for def in self.daily_challenges.all() {
            check(
                "daily challenge",
                &def.id,
                def.target > 0.0,
                "target must be positive",
            )?;
        }

        for def in self.random_events.all() {
            let table = "random event";
            check(table, &def.id, def.weight > 0, "weight must be positive")?;
            match &def.kind {
                RandomEventKind::Buff { effect, seconds } => {
                    check(
                        table,
                        &def.id,
                        *seconds > 0.0 && seconds.is_finite(),
                        "buff length must be positive and finite",
                    )?;
                    self.check_effect(table, def.id.as_str(), effect)?;
                }
                RandomEventKind::Windfall { eps_seconds } => {
                    check(
                        table,
                        &def.id,
                        *eps_seconds >= 0.0,
                        "eps_seconds must not be negative",
                    )?;
                }
                RandomEventKind::GoldenEye | RandomEventKind::TinfoilCache { .. } => {}
            }
        }

        Ok(())
    }

    fn check_requirements(
        &self,
        table: &'static str,
        id: &str,
        requires: &[Requirement],
    ) -> Result<(), CatalogError> {
        for requirement in requires {
            match requirement {
                Requirement::GeneratorOwned { generator, .. } => {
                    self.check_generator(table, id, generator.as_str())?;
                }
                Requirement::Upgrade(upgrade) => {
                    if !self.upgrades.contains(upgrade) {
                        return Err(dangling(table, id, "upgrade", upgrade.as_str()));
                    }
                }
                Requirement::Conspiracy(conspiracy) => {
                    if !self.conspiracies.contains(conspiracy) {
                        return Err(dangling(table, id, "conspiracy", conspiracy.as_str()));
                    }
                }
                Requirement::Skill(skill) => {
                    if !self.skills.contains(skill) {
                        return Err(dangling(table, id, "skill", skill.as_str()));
                    }
                }
                Requirement::TotalEvidence(_) | Requirement::TimesAscended(_) => {}
            }
        }
        Ok(())
    }

    fn check_effect(
        &self,
        table: &'static str,
        id: &str,
        effect: &Effect,
    ) -> Result<(), CatalogError> {
        if let Effect::GeneratorMultiplier { generator, .. } = effect {
            self.check_generator(table, id, generator.as_str())?;
        }
        Ok(())
    }

    fn check_generator(
        &self,
        table: &'static str,
        id: &str,
        generator: &str,
    ) -> Result<(), CatalogError> {
        if self.generators.contains(generator) {
            Ok(())
        } else {
            Err(dangling(table, id, "generator", generator))
        }
    }
}

fn check(
    table: &'static str,
    id: &impl core::fmt::Display,
    ok: bool,
    reason: &str,
) -> Result<(), CatalogError> {
    if ok {
        Ok(())
    } else {
        Err(CatalogError::InvalidDefinition {
            table,
            id: id.to_string(),
            reason: reason.to_owned(),
        })
    }
}

fn dangling(table: &'static str, id: &str, kind: &'static str, reference: &str) -> CatalogError {
    CatalogError::DanglingReference {
        table,
        id: id.to_owned(),
        kind,
        reference: reference.to_owned(),
    }
}
