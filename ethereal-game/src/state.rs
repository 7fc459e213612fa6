use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{CharacterClass, Companion, CompanionBonus, StartingItem};
use crate::constants::EngineConfig;
use crate::items::{LootItem, SlotKind};

/// Screens of a playthrough, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    ClassSelect,
    PetSelect,
    ItemSelect,
    WorldMap,
    Adventure,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassSelect => "class_select",
            Self::PetSelect => "pet_select",
            Self::ItemSelect => "item_select",
            Self::WorldMap => "world_map",
            Self::Adventure => "adventure",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class_select" => Ok(Self::ClassSelect),
            "pet_select" => Ok(Self::PetSelect),
            "item_select" => Ok(Self::ItemSelect),
            "world_map" => Ok(Self::WorldMap),
            "adventure" => Ok(Self::Adventure),
            _ => Err(()),
        }
    }
}

/// One line of the adventure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// Player-authored action label.
    Choice { text: String },
    /// Generator-authored narration; `success` styles outcome beats.
    Narrative {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        success: Option<bool>,
    },
}

impl HistoryEntry {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Choice { text } | Self::Narrative { text, .. } => text,
        }
    }
}

/// Equipped item ids per slot. Items themselves live in the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trinket: Option<String>,
}

impl Equipment {
    #[must_use]
    pub fn slot(&self, slot: SlotKind) -> Option<&str> {
        match slot {
            SlotKind::Weapon => self.weapon.as_deref(),
            SlotKind::Armor => self.armor.as_deref(),
            SlotKind::Trinket => self.trinket.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, slot: SlotKind) -> &mut Option<String> {
        match slot {
            SlotKind::Weapon => &mut self.weapon,
            SlotKind::Armor => &mut self.armor,
            SlotKind::Trinket => &mut self.trinket,
        }
    }

    /// Occupied slots with their item ids.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKind, &str)> {
        SlotKind::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot).map(|id| (slot, id)))
    }

    #[must_use]
    pub fn is_equipped(&self, item_id: &str) -> bool {
        self.iter().any(|(_, id)| id == item_id)
    }
}

/// Root aggregate of a playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub character_class: Option<CharacterClass>,
    pub companion: Option<Companion>,
    #[serde(default)]
    pub selected_items: Vec<StartingItem>,
    /// Acquisition order; never reordered.
    #[serde(default)]
    pub inventory: Vec<LootItem>,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub hp: i32,
    pub max_hp: i32,
    pub karma: i32,
    pub gold: i64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl GameState {
    /// Fresh state with the configured starting values.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            character_class: None,
            companion: None,
            selected_items: Vec::new(),
            inventory: Vec::new(),
            equipment: Equipment::default(),
            location: None,
            history: Vec::new(),
            hp: config.starting_hp,
            max_hp: config.starting_hp,
            karma: 0,
            gold: config.starting_gold,
        }
    }

    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&LootItem> {
        self.inventory.iter().find(|item| item.id == item_id)
    }

    /// Item currently equipped in `slot`.
    #[must_use]
    pub fn equipped(&self, slot: SlotKind) -> Option<&LootItem> {
        self.equipment.slot(slot).and_then(|id| self.item(id))
    }

    /// All equipped items.
    pub fn equipped_items(&self) -> impl Iterator<Item = &LootItem> {
        self.equipment
            .iter()
            .filter_map(move |(_, id)| self.item(id))
    }

    /// Install the companion, applying a max-HP bonus once.
    pub fn attach_companion(&mut self, companion: Companion) {
        if let Some(CompanionBonus::MaxHp { value }) = companion.bonus {
            self.max_hp = self.max_hp.saturating_add(value);
            self.hp = self.hp.saturating_add(value).clamp(0, self.max_hp.max(0));
        }
        self.companion = Some(companion);
    }

    /// Change hit points, keeping them within `0..=max_hp`.
    pub fn adjust_hp(&mut self, delta: i32) {
        self.hp = self.hp.saturating_add(delta).clamp(0, self.max_hp.max(0));
    }

    /// Add gold, never dropping below zero.
    pub fn add_gold(&mut self, delta: i64) {
        self.gold = self.gold.saturating_add(delta).max(0);
    }

    /// Equipment slots whose id is not in the inventory, or whose item is of another slot type.
    #[must_use]
    pub fn dangling_equipment(&self) -> Vec<(SlotKind, String)> {
        self.equipment
            .iter()
            .filter(|(slot, id)| self.item(id).is_none_or(|item| item.slot != *slot))
            .map(|(slot, id)| (slot, id.to_string()))
            .collect()
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}
