//! Versioned, checksummed save blobs.
//!
//! A blob is a JSON envelope `{version, checksum, payload}`. The payload is the
//! serialized [`SaveSnapshot`] text and the checksum is its XXH64, so a blob
//! edited or truncated by hand is detected as corrupt instead of half-loaded.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::SaveStore;
use crate::constants::SAVE_VERSION;
use crate::items::SlotKind;
use crate::scenario::Scenario;
use crate::state::{GamePhase, GameState};

/// The persisted `{phase, gameState, currentScenario}` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub phase: GamePhase,
    pub game_state: GameState,
    #[serde(default)]
    pub current_scenario: Option<Scenario>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    checksum: String,
    payload: String,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save data could not be parsed: {0}")]
    Unparseable(#[source] serde_json::Error),
    #[error("save was written by schema v{found}, expected v{expected}")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("save checksum mismatch")]
    ChecksumMismatch,
    #[error("equipped {slot} `{item_id}` is not in the saved inventory")]
    DanglingEquipment { slot: SlotKind, item_id: String },
    #[error("failed to serialize save: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("save store failed: {0}")]
    Store(String),
}

impl PersistenceError {
    /// Whether the blob itself is unusable, as opposed to the store or encoder failing.
    #[must_use]
    pub const fn is_corrupt_save(&self) -> bool {
        matches!(
            self,
            Self::Unparseable(_)
                | Self::VersionMismatch { .. }
                | Self::ChecksumMismatch
                | Self::DanglingEquipment { .. }
        )
    }
}

fn payload_checksum(payload: &str) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(payload.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Serialize a snapshot into an opaque blob.
///
/// # Errors
///
/// Returns [`PersistenceError::Encode`] if serialization fails.
pub fn encode_save(snapshot: &SaveSnapshot) -> Result<String, PersistenceError> {
    let payload = serde_json::to_string(snapshot).map_err(PersistenceError::Encode)?;
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        checksum: payload_checksum(&payload),
        payload,
    };
    serde_json::to_string(&envelope).map_err(PersistenceError::Encode)
}

/// Restore a snapshot from a blob.
///
/// # Errors
///
/// Returns a corrupt-save variant when the blob does not parse, was written by
/// another schema version, fails its checksum, or equips an item missing from
/// its inventory.
pub fn decode_save(blob: &str) -> Result<SaveSnapshot, PersistenceError> {
    let envelope: SaveEnvelope =
        serde_json::from_str(blob).map_err(PersistenceError::Unparseable)?;
    if envelope.version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            found: envelope.version,
            expected: SAVE_VERSION,
        });
    }
    if payload_checksum(&envelope.payload) != envelope.checksum {
        return Err(PersistenceError::ChecksumMismatch);
    }

    let snapshot: SaveSnapshot =
        serde_json::from_str(&envelope.payload).map_err(PersistenceError::Unparseable)?;
    if let Some((slot, item_id)) = snapshot.game_state.dangling_equipment().into_iter().next() {
        return Err(PersistenceError::DanglingEquipment { slot, item_id });
    }
    Ok(snapshot)
}

/// Encode `snapshot` and write it under `key`.
///
/// # Errors
///
/// Returns an error if encoding fails or the store rejects the write.
pub fn save_to<S: SaveStore + ?Sized>(
    store: &S,
    key: &str,
    snapshot: &SaveSnapshot,
) -> Result<(), PersistenceError> {
    let blob = encode_save(snapshot)?;
    store
        .write_blob(key, &blob)
        .map_err(|err| PersistenceError::Store(err.to_string()))?;
    log::info!("save written to `{key}` ({} bytes)", blob.len());
    Ok(())
}

/// Read and decode the blob under `key`. A missing key is `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the store read fails or the blob is corrupt.
pub fn load_from<S: SaveStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<SaveSnapshot>, PersistenceError> {
    let blob = store
        .read_blob(key)
        .map_err(|err| PersistenceError::Store(err.to_string()))?;
    blob.as_deref().map(decode_save).transpose()
}

/// In-memory store, handy for hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemorySaveStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a blob directly, bypassing encoding.
    pub fn insert_raw(&self, key: &str, blob: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.to_string(), blob.into());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }
}

impl SaveStore for MemorySaveStore {
    type Error = Infallible;

    fn write_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.insert_raw(key, blob);
        Ok(())
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn delete_blob(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{LootItem, Rarity, StatBonuses};
    use crate::state::HistoryEntry;

    fn snapshot() -> SaveSnapshot {
        let mut state = GameState::default();
        state.inventory.push(LootItem {
            id: "k3j9x0a1b".into(),
            name: "Moon Sickle".into(),
            description: String::new(),
            rarity: Rarity::Mythic,
            slot: SlotKind::Weapon,
            stat_bonuses: StatBonuses {
                dexterity: Some(4.0),
                ..StatBonuses::default()
            },
            price: None,
        });
        state.equipment.weapon = Some("k3j9x0a1b".into());
        state.history.push(HistoryEntry::Narrative {
            text: "Fog.".into(),
            success: None,
        });
        SaveSnapshot {
            phase: GamePhase::Adventure,
            game_state: state,
            current_scenario: None,
        }
    }

    #[test]
    fn blob_roundtrips() {
        let original = snapshot();
        let blob = encode_save(&original).unwrap();
        assert_eq!(decode_save(&blob).unwrap(), original);
    }

    #[test]
    fn fractional_bonuses_survive_exactly() {
        let mut original = snapshot();
        original.game_state.inventory[0].stat_bonuses.strength = Some(3.452_981_424_015_515_4);
        let blob = encode_save(&original).unwrap();
        let restored = decode_save(&blob).unwrap();
        let bonus = restored.game_state.inventory[0].stat_bonuses.strength.unwrap();
        assert_eq!(bonus.to_bits(), 3.452_981_424_015_515_4_f64.to_bits());
        assert_eq!(restored, original);
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let blob = encode_save(&snapshot()).unwrap();
        let tampered = blob.replace("Moon Sickle", "Sun Sickle");
        let err = decode_save(&tampered).unwrap_err();
        assert!(matches!(err, PersistenceError::ChecksumMismatch));
        assert!(err.is_corrupt_save());
    }

    #[test]
    fn other_versions_and_garbage_are_corrupt() {
        let blob = encode_save(&snapshot()).unwrap();
        let mut envelope: serde_json::Value = serde_json::from_str(&blob).unwrap();
        envelope["version"] = serde_json::json!(0);
        let err = decode_save(&envelope.to_string()).unwrap_err();
        assert!(matches!(err, PersistenceError::VersionMismatch { found: 0, expected: 1 }));

        assert!(decode_save("{").unwrap_err().is_corrupt_save());
        assert!(!PersistenceError::Store("disk full".into()).is_corrupt_save());
    }

    #[test]
    fn dangling_equipment_is_rejected() {
        let mut broken = snapshot();
        broken.game_state.inventory.clear();
        let blob = encode_save(&broken).unwrap();
        assert!(matches!(
            decode_save(&blob).unwrap_err(),
            PersistenceError::DanglingEquipment { slot: SlotKind::Weapon, .. }
        ));
    }

    #[test]
    fn store_helpers_use_the_key() {
        let store = MemorySaveStore::new();
        assert!(load_from(&store, "slot").unwrap().is_none());
        save_to(&store, "slot", &snapshot()).unwrap();
        assert_eq!(load_from(&store, "slot").unwrap(), Some(snapshot()));
        assert!(load_from(&store, "other").unwrap().is_none());
        store.delete_blob("slot").unwrap();
        assert!(store.raw("slot").is_none());
    }
}
