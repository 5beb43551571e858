//! Type-safe identifier wrappers.
//!
//! Content definitions (generators, upgrades, quests, ...) are keyed by
//! stable string ids taken from the content catalog, wrapped in distinct
//! newtypes so that a [`GeneratorId`] can never be passed where an
//! [`UpgradeId`] is expected. Running quest instances get a UUID v7
//! [`QuestRunId`] so notifications can refer to one specific run.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around a catalog key with standard derives.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the raw catalog key.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_key! {
    /// Identifier of a generator definition (e.g. `red_string`).
    GeneratorId
}

define_key! {
    /// Identifier of an evidence- or tinfoil-priced upgrade.
    UpgradeId
}

define_key! {
    /// Identifier of a conspiracy that can be proven.
    ConspiracyId
}

define_key! {
    /// Identifier of a skill-tree node.
    SkillId
}

define_key! {
    /// Identifier of a quest definition.
    QuestId
}

define_key! {
    /// Identifier of an achievement.
    AchievementId
}

define_key! {
    /// Identifier of an Illuminati (first prestige tier) upgrade.
    PrestigeUpgradeId
}

define_key! {
    /// Identifier of a Matrix (second prestige tier) upgrade.
    MatrixUpgradeId
}

define_key! {
    /// Identifier of a daily challenge template.
    ChallengeId
}

define_key! {
    /// Identifier of a random event definition.
    EventId
}

/// Unique identifier for one running instance of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestRunId(pub Uuid);

impl QuestRunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for QuestRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for QuestRunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
