//! Ethereal Ink Game Engine
//!
//! Platform-agnostic game-state and progression core for the Ethereal Ink text
//! adventure. Narrative text comes from an external generator; this crate turns
//! its responses into consistent player state: layered stats, dice checks,
//! karma and gold bookkeeping, equipment slots, shop purchases and saves.
//! It performs no I/O itself. Randomness, the generator and durable storage
//! are injected through [`RandomSource`], [`NarrativeGateway`] and [`SaveStore`].

pub mod catalog;
pub mod constants;
pub mod dice;
pub mod equipment;
pub mod gateway;
pub mod items;
pub mod notifications;
pub mod numbers;
pub mod persistence;
pub mod progression;
pub mod scenario;
pub mod session;
pub mod state;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use catalog::{BaseStats, Catalog, CharacterClass, Companion, CompanionBonus, Location, StartingItem};
pub use constants::{EngineConfig, SAVE_VERSION};
pub use dice::{
    RandomSource, RollOutcome, ScriptedDice, SeededDice, evaluate_roll, resolve_action,
    resolve_action_with_die,
};
pub use equipment::{EquipChange, EquipError, toggle_equip};
pub use gateway::{
    GatewayError, NarrativeGateway, NarrativeRequest, OpeningRequest, OpeningScene,
    OutcomeRequest, OutcomeScene, decode_opening, decode_outcome,
};
pub use items::{LootItem, Rarity, SlotKind, StatBonuses, StatName, generate_item_id};
pub use notifications::{Notification, NotificationQueue};
pub use persistence::{MemorySaveStore, PersistenceError, SaveSnapshot, decode_save, encode_save};
pub use progression::{OutcomeSource, ProgressReport, apply_outcome};
pub use scenario::{ActionChoice, ActionList, Scenario, SpecialInteraction, answer_matches};
pub use session::{GameSession, SelectionError, SessionError};
pub use state::{Equipment, GamePhase, GameState, HistoryEntry};
pub use stats::{compute_stat, modifier, stat_modifier, stat_sheet};
pub use store::{EconomyError, can_afford, purchase, purchase_from_catalog};

/// Trait for abstracting durable save storage.
/// Platform-specific implementations should provide this
pub trait SaveStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store a blob under `key`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn write_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Fetch the blob under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_blob(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Remove the blob under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be removed.
    fn delete_blob(&self, key: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_saves_and_loads_through_store() {
        let store = MemorySaveStore::new();
        let mut session = GameSession::seeded(5);
        session.select_class("paladin").unwrap();
        session.save_to(&store).unwrap();
        assert!(store.raw("ethereal_ink.save.v1").is_some());

        let mut fresh = GameSession::seeded(6);
        assert!(fresh.load_from(&store).unwrap());
        assert_eq!(fresh.phase(), GamePhase::PetSelect);
        assert_eq!(fresh.snapshot(), session.snapshot());
    }

    #[test]
    fn corrupt_or_foreign_saves_count_as_absent() {
        let store = MemorySaveStore::new();
        let mut session = GameSession::seeded(7);
        assert!(!session.load_from(&store).unwrap());

        store.insert_raw("ethereal_ink.save.v1", "{ not a save");
        assert!(!session.load_from(&store).unwrap());
        assert_eq!(session.phase(), GamePhase::ClassSelect);

        store.delete_blob("ethereal_ink.save.v1").unwrap();
        store.insert_raw("ethereal_ink.save.v0", "{}");
        assert!(!session.load_from(&store).unwrap());
    }
}
