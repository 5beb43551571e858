//! Save slots and the stores that hold them.
//!
//! The engine sees a save as an opaque [`GameState`] snapshot behind the
//! [`SaveStore`] trait. [`JsonFileStore`] writes `slot{n}.json` envelopes
//! carrying a format version; [`MemoryStore`] keeps snapshots in memory
//! for tests and embedding.
//!
//! A slot that cannot be read (corrupt JSON, unknown version) is logged
//! and treated as empty rather than failing the caller.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tinfoil_types::{GameState, SlotInfo};
use tracing::{debug, info, warn};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Slots and errors
// ---------------------------------------------------------------------------

/// One of the three save slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SaveSlot {
    /// Slot 1.
    One,
    /// Slot 2.
    Two,
    /// Slot 3.
    Three,
}

impl SaveSlot {
    /// Every slot, in order.
    pub const ALL: [Self; 3] = [Self::One, Self::Two, Self::Three];

    /// The slot number, 1..=3.
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<u8> for SaveSlot {
    type Error = PersistError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(PersistError::InvalidSlot { slot: other }),
        }
    }
}

impl std::fmt::Display for SaveSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.number())
    }
}

/// Errors from reading or writing saves.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("save I/O failed: {source}")]
    Io {
        /// The underlying error.
        #[from]
        source: io::Error,
    },

    /// The state could not be encoded or decoded.
    #[error("save encoding failed: {source}")]
    Json {
        /// The underlying error.
        #[from]
        source: serde_json::Error,
    },

    /// The file was written by an incompatible version.
    #[error("unsupported save version {found} (expected {SAVE_VERSION})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },

    /// Slot number outside 1..=3.
    #[error("invalid save slot {slot}")]
    InvalidSlot {
        /// The number given.
        slot: u8,
    },
}

// ---------------------------------------------------------------------------
// SaveStore
// ---------------------------------------------------------------------------

/// Where saves live.
pub trait SaveStore: Send + Sync {
    /// Load a slot. `None` if it is empty or unreadable.
    fn load(&self, slot: SaveSlot) -> Option<GameState>;

    /// Write a slot, replacing what was there.
    fn save(&self, slot: SaveSlot, state: &GameState) -> Result<(), PersistError>;

    /// Summaries of every slot, in slot order.
    fn list_slot_info(&self) -> Vec<SlotInfo> {
        SaveSlot::ALL
            .iter()
            .map(|&slot| {
                self.load(slot)
                    .map_or_else(|| SlotInfo::empty(slot.number()), |state| slot_info(slot, &state))
            })
            .collect()
    }
}

/// Summarise a saved state for the slot picker.
pub fn slot_info(slot: SaveSlot, state: &GameState) -> SlotInfo {
    SlotInfo {
        slot: slot.number(),
        exists: true,
        total_evidence: state.balances.total_evidence_earned,
        ascension_count: state.times_ascended,
        playtime_seconds: state.total_play_time_seconds,
        last_played: state.last_saved.or(Some(state.last_tick)),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory saves. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<BTreeMap<SaveSlot, GameState>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self, slot: SaveSlot) -> Option<GameState> {
        let Ok(slots) = self.slots.lock() else {
            warn!(%slot, "save store lock poisoned");
            return None;
        };
        slots.get(&slot).cloned()
    }

    fn save(&self, slot: SaveSlot, state: &GameState) -> Result<(), PersistError> {
        let Ok(mut slots) = self.slots.lock() else {
            warn!(%slot, "save store lock poisoned");
            return Err(PersistError::Io {
                source: io::Error::other("save store lock poisoned"),
            });
        };
        slots.insert(slot, state.clone());
        debug!(%slot, "state saved in memory");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    state: &'a GameState,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: GameState,
}

/// Saves as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one slot's file.
    pub fn path(&self, slot: SaveSlot) -> PathBuf {
        self.dir.join(format!("slot{}.json", slot.number()))
    }

    /// Read and decode a slot, distinguishing every failure.
    pub fn read(&self, slot: SaveSlot) -> Result<Option<GameState>, PersistError> {
        let text = match fs::read_to_string(self.path(slot)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let probe: VersionProbe = serde_json::from_str(&text)?;
        if probe.version != SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: probe.version,
            });
        }
        let envelope: Envelope = serde_json::from_str(&text)?;
        Ok(Some(envelope.state))
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self, slot: SaveSlot) -> Option<GameState> {
        match self.read(slot) {
            Ok(Some(state)) => {
                info!(%slot, path = %self.path(slot).display(), "save loaded");
                Some(state)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(%slot, error = %err, "unreadable save ignored");
                None
            }
        }
    }

    fn save(&self, slot: SaveSlot, state: &GameState) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let envelope = EnvelopeRef {
            version: SAVE_VERSION,
            saved_at: state.last_saved.unwrap_or_else(Utc::now),
            state,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        let path = self.path(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        info!(%slot, path = %path.display(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tinfoil_types::GeneratorId;

    use super::*;

    fn sample() -> GameState {
        let mut state = GameState::new(Utc::now());
        state.balances.evidence = 1234.5;
        state.balances.total_evidence_earned = 5000.0;
        state.times_ascended = 2;
        state.generator_counts.insert(GeneratorId::new("red_string"), 12);
        state.last_saved = Some(Utc::now());
        state
    }

    #[test]
    fn slot_numbers_round_trip() {
        for slot in SaveSlot::ALL {
            assert_eq!(SaveSlot::try_from(slot.number()).unwrap(), slot);
        }
        assert!(matches!(
            SaveSlot::try_from(4),
            Err(PersistError::InvalidSlot { slot: 4 })
        ));
    }

    #[test]
    fn memory_store_keeps_slots_apart() {
        let store = MemoryStore::new();
        let state = sample();
        store.save(SaveSlot::Two, &state).unwrap();
        assert_eq!(store.load(SaveSlot::Two), Some(state));
        assert!(store.load(SaveSlot::One).is_none());

        let info = store.list_slot_info();
        assert_eq!(info.len(), 3);
        assert!(!info[0].exists);
        assert!(info[1].exists);
        assert_eq!(info[1].ascension_count, 2);
        assert_eq!(info[1].total_evidence, 5000.0);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let state = sample();
        store.save(SaveSlot::One, &state).unwrap();
        assert!(store.path(SaveSlot::One).exists());
        assert_eq!(store.load(SaveSlot::One), Some(state));
        assert!(store.load(SaveSlot::Three).is_none());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(SaveSlot::One), "{ not json").unwrap();
        assert!(store.load(SaveSlot::One).is_none());
        assert!(matches!(store.read(SaveSlot::One), Err(PersistError::Json { .. })));
    }

    #[test]
    fn future_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(SaveSlot::Two), r#"{"version": 99, "state": {}}"#).unwrap();
        assert!(matches!(
            store.read(SaveSlot::Two),
            Err(PersistError::UnsupportedVersion { found: 99 })
        ));
        assert!(store.load(SaveSlot::Two).is_none());
    }
}
