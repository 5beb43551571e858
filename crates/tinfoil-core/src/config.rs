//! Configuration loading and typed config structures for the Tinfoil engine.
//!
//! The canonical configuration lives in `tinfoil-config.yaml` next to the
//! binary (overridable with `TINFOIL_CONFIG`). This module defines
//! strongly-typed structs that mirror the YAML structure, a loader, and
//! [`EngineConfig::validate`] which rejects values the engine cannot run
//! with. Every field has a default, so an empty document is a valid
//! configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tinfoil_types::{PrestigeTier, ResetAction, ResetField};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside the range the engine accepts.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `tinfoil-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Session timing, seed and save location.
    #[serde(default)]
    pub session: SessionConfig,

    /// Click economy base values.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Combo meter tuning.
    #[serde(default)]
    pub combo: ComboConfig,

    /// Golden Eye frenzy tuning.
    #[serde(default)]
    pub golden_eye: GoldenEyeConfig,

    /// Random event and flavor message cadence.
    #[serde(default)]
    pub events: EventsConfig,

    /// Quest resolution tuning.
    #[serde(default)]
    pub quests: QuestsConfig,

    /// Prestige thresholds and yield curve.
    #[serde(default)]
    pub prestige: PrestigeConfig,

    /// Offline catch-up policy.
    #[serde(default)]
    pub offline: OfflineConfig,

    /// Daily challenge settings.
    #[serde(default)]
    pub daily: DailyConfig,

    /// The retained/reset field table applied on prestige.
    #[serde(default)]
    pub resets: ResetTable,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.tick_interval_ms == 0 {
            return Err(invalid("session.tick_interval_ms", "must be at least 1"));
        }
        if !(1..=3).contains(&self.session.default_slot) {
            return Err(invalid("session.default_slot", "must be 1, 2 or 3"));
        }
        if !(self.quests.success_cap > 0.0 && self.quests.success_cap <= 1.0) {
            return Err(invalid("quests.success_cap", "must be in (0, 1]"));
        }
        if !(self.events.chance_per_tick >= 0.0 && self.events.chance_per_tick <= 1.0) {
            return Err(invalid("events.chance_per_tick", "must be in [0, 1]"));
        }
        if !(self.economy.base_crit_chance >= 0.0 && self.economy.base_crit_chance <= 1.0) {
            return Err(invalid("economy.base_crit_chance", "must be in [0, 1]"));
        }
        if !(self.combo.increment_per_click > 0.0) {
            return Err(invalid("combo.increment_per_click", "must be positive"));
        }
        if !(self.prestige.token_scaling > 0.0) {
            return Err(invalid("prestige.token_scaling", "must be positive"));
        }
        if !(self.prestige.token_power > 0.0) {
            return Err(invalid("prestige.token_power", "must be positive"));
        }
        if !(self.prestige.threshold > 0.0) {
            return Err(invalid("prestige.threshold", "must be positive"));
        }
        if self.prestige.glitch_conversion_rate == 0 {
            return Err(invalid(
                "prestige.glitch_conversion_rate",
                "must be at least 1",
            ));
        }
        let frenzy = self.golden_eye.duration_seconds;
        if !(frenzy >= 0.0 && frenzy.is_finite()) {
            return Err(invalid(
                "golden_eye.duration_seconds",
                "must be finite and not negative",
            ));
        }
        if !(self.offline.efficiency >= 0.0) {
            return Err(invalid("offline.efficiency", "must not be negative"));
        }
        if self.offline.max_seconds.is_some_and(|max| !(max >= 0.0)) {
            return Err(invalid("offline.max_seconds", "must not be negative"));
        }
        if self.daily.challenges_per_day == 0 {
            return Err(invalid("daily.challenges_per_day", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Random seed. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks between autosaves.
    #[serde(default = "default_autosave_interval_ticks")]
    pub autosave_interval_ticks: u64,

    /// Directory holding `slot{n}.json` files.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Slot used when none is given on the command line.
    #[serde(default = "default_slot")]
    pub default_slot: u8,

    /// Content catalog to load instead of the bundled one.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
            autosave_interval_ticks: default_autosave_interval_ticks(),
            save_dir: default_save_dir(),
            default_slot: default_slot(),
            catalog_path: None,
        }
    }
}

/// Click economy base values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Evidence per click before modifiers.
    #[serde(default = "default_base_click_power")]
    pub base_click_power: f64,

    /// Fraction of EPS added to each click before modifiers.
    #[serde(default = "default_eps_fraction_per_click")]
    pub eps_fraction_per_click: f64,

    /// Critical-hit chance before modifiers.
    #[serde(default)]
    pub base_crit_chance: f64,

    /// Critical damage multiplier before modifiers.
    #[serde(default = "default_base_crit_multiplier")]
    pub base_crit_multiplier: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_click_power: default_base_click_power(),
            eps_fraction_per_click: default_eps_fraction_per_click(),
            base_crit_chance: 0.0,
            base_crit_multiplier: default_base_crit_multiplier(),
        }
    }
}

/// Combo meter tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComboConfig {
    /// Meter charge added per click before modifiers.
    #[serde(default = "default_combo_increment")]
    pub increment_per_click: f64,

    /// Burst payout in seconds of current EPS.
    #[serde(default = "default_burst_eps_seconds")]
    pub burst_eps_seconds: f64,

    /// The burst is never worth less than this many clicks.
    #[serde(default = "default_burst_min_clicks_value")]
    pub burst_min_clicks_value: f64,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            increment_per_click: default_combo_increment(),
            burst_eps_seconds: default_burst_eps_seconds(),
            burst_min_clicks_value: default_burst_min_clicks_value(),
        }
    }
}

/// Golden Eye frenzy tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoldenEyeConfig {
    /// Click power factor while active, before modifiers.
    #[serde(default = "default_golden_eye_factor")]
    pub click_factor: f64,

    /// Frenzy length in seconds.
    #[serde(default = "default_golden_eye_duration")]
    pub duration_seconds: f64,
}

impl Default for GoldenEyeConfig {
    fn default() -> Self {
        Self {
            click_factor: default_golden_eye_factor(),
            duration_seconds: default_golden_eye_duration(),
        }
    }
}

/// Random event and flavor message cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventsConfig {
    /// Probability that a random event fires on a tick.
    #[serde(default = "default_event_chance")]
    pub chance_per_tick: f64,

    /// Ticks between flavor messages. 0 disables them.
    #[serde(default = "default_flavor_interval_ticks")]
    pub flavor_interval_ticks: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            chance_per_tick: default_event_chance(),
            flavor_interval_ticks: default_flavor_interval_ticks(),
        }
    }
}

/// Quest resolution tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestsConfig {
    /// Upper bound on success probability without a guaranteed-success
    /// effect.
    #[serde(default = "default_success_cap")]
    pub success_cap: f64,
}

impl Default for QuestsConfig {
    fn default() -> Self {
        Self {
            success_cap: default_success_cap(),
        }
    }
}

/// Prestige thresholds and yield curve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrestigeConfig {
    /// Lifetime evidence needed to ascend.
    #[serde(default = "default_prestige_threshold")]
    pub threshold: f64,

    /// Divisor applied to lifetime evidence in the yield curve.
    #[serde(default = "default_token_scaling")]
    pub token_scaling: f64,

    /// Exponent of the yield curve.
    #[serde(default = "default_token_power")]
    pub token_power: f64,

    /// Ascensions needed before a Matrix Break.
    #[serde(default = "default_matrix_min_ascensions")]
    pub matrix_min_ascensions: u32,

    /// Lifetime Illuminati tokens needed before a Matrix Break.
    #[serde(default = "default_matrix_min_tokens_earned")]
    pub matrix_min_tokens_earned: u64,

    /// Illuminati tokens per glitch token.
    #[serde(default = "default_glitch_conversion_rate")]
    pub glitch_conversion_rate: u64,
}

impl Default for PrestigeConfig {
    fn default() -> Self {
        Self {
            threshold: default_prestige_threshold(),
            token_scaling: default_token_scaling(),
            token_power: default_token_power(),
            matrix_min_ascensions: default_matrix_min_ascensions(),
            matrix_min_tokens_earned: default_matrix_min_tokens_earned(),
            glitch_conversion_rate: default_glitch_conversion_rate(),
        }
    }
}

/// Offline catch-up policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OfflineConfig {
    /// Cap on credited offline seconds. `None` means uncapped.
    #[serde(default)]
    pub max_seconds: Option<f64>,

    /// Fraction of EPS earned while offline, before modifiers.
    #[serde(default = "default_offline_efficiency")]
    pub efficiency: f64,

    /// Gaps shorter than this are not reported as offline progress.
    #[serde(default = "default_offline_min_seconds")]
    pub min_seconds: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            max_seconds: None,
            efficiency: default_offline_efficiency(),
            min_seconds: default_offline_min_seconds(),
        }
    }
}

/// Daily challenge settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyConfig {
    /// Challenges drawn per calendar day.
    #[serde(default = "default_challenges_per_day")]
    pub challenges_per_day: usize,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            challenges_per_day: default_challenges_per_day(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reset table
// ---------------------------------------------------------------------------

/// What each prestige tier does to one field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResetRule {
    /// Action on Illuminati Ascension.
    pub ascension: ResetAction,
    /// Action on Matrix Break.
    pub matrix_break: ResetAction,
}

impl ResetRule {
    const fn new(ascension: ResetAction, matrix_break: ResetAction) -> Self {
        Self {
            ascension,
            matrix_break,
        }
    }

    /// The action for a tier.
    pub const fn action(&self, tier: PrestigeTier) -> ResetAction {
        match tier {
            PrestigeTier::Ascension => self.ascension,
            PrestigeTier::MatrixBreak => self.matrix_break,
        }
    }
}

/// The retained/reset field table.
///
/// Rows missing from a configured table fall back to the default row for
/// that field, so a config only needs to list the rows it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<ResetField, ResetRule>")]
pub struct ResetTable {
    rows: BTreeMap<ResetField, ResetRule>,
}

impl ResetTable {
    /// The action a tier applies to a field.
    pub fn action(&self, field: ResetField, tier: PrestigeTier) -> ResetAction {
        self.rows
            .get(&field)
            .copied()
            .unwrap_or_else(|| default_rule(field))
            .action(tier)
    }

    /// Override one row.
    pub fn set(&mut self, field: ResetField, rule: ResetRule) {
        self.rows.insert(field, rule);
    }
}

impl Default for ResetTable {
    fn default() -> Self {
        Self {
            rows: ALL_RESET_FIELDS
                .iter()
                .map(|&field| (field, default_rule(field)))
                .collect(),
        }
    }
}

impl From<BTreeMap<ResetField, ResetRule>> for ResetTable {
    fn from(configured: BTreeMap<ResetField, ResetRule>) -> Self {
        let mut table = Self::default();
        table.rows.extend(configured);
        table
    }
}

/// Every reset field, in declaration order.
pub const ALL_RESET_FIELDS: [ResetField; 13] = [
    ResetField::Evidence,
    ResetField::Generators,
    ResetField::Upgrades,
    ResetField::TinfoilUpgrades,
    ResetField::Tinfoil,
    ResetField::Believers,
    ResetField::ActiveQuests,
    ResetField::Conspiracies,
    ResetField::Skills,
    ResetField::Combo,
    ResetField::Buffs,
    ResetField::IlluminatiUpgrades,
    ResetField::IlluminatiTokens,
];

/// Ascension clears the run economy; Matrix Break also clears the
/// tinfoil and Illuminati layers.
const fn default_rule(field: ResetField) -> ResetRule {
    use ResetAction::{Reset, Retain};
    match field {
        ResetField::Evidence
        | ResetField::Generators
        | ResetField::Upgrades
        | ResetField::Believers
        | ResetField::ActiveQuests
        | ResetField::Conspiracies
        | ResetField::Combo
        | ResetField::Buffs => ResetRule::new(Reset, Reset),
        ResetField::TinfoilUpgrades
        | ResetField::Tinfoil
        | ResetField::Skills
        | ResetField::IlluminatiUpgrades
        | ResetField::IlluminatiTokens => ResetRule::new(Retain, Reset),
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_autosave_interval_ticks() -> u64 {
    30
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

const fn default_slot() -> u8 {
    1
}

const fn default_base_click_power() -> f64 {
    1.0
}

const fn default_eps_fraction_per_click() -> f64 {
    0.01
}

const fn default_base_crit_multiplier() -> f64 {
    2.0
}

const fn default_combo_increment() -> f64 {
    0.02
}

const fn default_burst_eps_seconds() -> f64 {
    10.0
}

const fn default_burst_min_clicks_value() -> f64 {
    10.0
}

const fn default_golden_eye_factor() -> f64 {
    7.0
}

const fn default_golden_eye_duration() -> f64 {
    20.0
}

const fn default_event_chance() -> f64 {
    0.005
}

const fn default_flavor_interval_ticks() -> u64 {
    120
}

const fn default_success_cap() -> f64 {
    0.95
}

const fn default_prestige_threshold() -> f64 {
    1e12
}

const fn default_token_scaling() -> f64 {
    1e11
}

const fn default_token_power() -> f64 {
    0.6
}

const fn default_matrix_min_ascensions() -> u32 {
    5
}

const fn default_matrix_min_tokens_earned() -> u64 {
    100
}

const fn default_glitch_conversion_rate() -> u64 {
    10
}

const fn default_offline_efficiency() -> f64 {
    1.0
}

const fn default_offline_min_seconds() -> f64 {
    5.0
}

const fn default_challenges_per_day() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_owned()
}
