//! Equip toggling over the owned inventory.
//!
//! Slots reference inventory entries by id; the inventory stays the permanent
//! record of ownership and is never touched here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::SlotKind;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("item `{0}` is not in the inventory")]
    NotOwned(String),
}

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum EquipChange {
    Equipped {
        slot: SlotKind,
        item_id: String,
        /// Item that was displaced from the slot, still owned.
        replaced: Option<String>,
    },
    Unequipped {
        slot: SlotKind,
        item_id: String,
    },
}

/// Equip `item_id` into the slot matching its type, or unequip it when it already
/// occupies that slot.
///
/// # Errors
///
/// Returns [`EquipError::NotOwned`] if no inventory entry has that id; the state
/// is left unchanged.
pub fn toggle_equip(state: &mut GameState, item_id: &str) -> Result<EquipChange, EquipError> {
    let slot = state
        .item(item_id)
        .map(|item| item.slot)
        .ok_or_else(|| EquipError::NotOwned(item_id.to_string()))?;

    let current = state.equipment.slot_mut(slot);
    let change = if current.as_deref() == Some(item_id) {
        *current = None;
        EquipChange::Unequipped {
            slot,
            item_id: item_id.to_string(),
        }
    } else {
        let replaced = current.replace(item_id.to_string());
        EquipChange::Equipped {
            slot,
            item_id: item_id.to_string(),
            replaced,
        }
    };
    log::debug!("equip toggle: {change:?}");
    Ok(change)
}
