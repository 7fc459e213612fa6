//! Static reference data: classes, companions, starting items, shop stock and locations.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::items::{LootItem, StatName};

const DEFAULT_CATALOG: &str = include_str!("../data/catalog.json");

/// Base attributes of a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BaseStats {
    pub strength: u32,
    pub intelligence: u32,
    pub dexterity: u32,
}

impl BaseStats {
    #[must_use]
    pub const fn get(&self, stat: StatName) -> u32 {
        match stat {
            StatName::Strength => self.strength,
            StatName::Intelligence => self.intelligence,
            StatName::Dexterity => self.dexterity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterClass {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub stats: BaseStats,
}

/// Passive companion effect. The two shapes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompanionBonus {
    /// Added to one stat whenever it is aggregated.
    Stat { stat: StatName, value: i32 },
    /// Added to maximum hit points once, at selection.
    MaxHp { value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub effect_description: String,
    #[serde(default)]
    pub bonus: Option<CompanionBonus>,
}

impl Companion {
    /// Bonus this companion contributes to `stat`.
    #[must_use]
    pub fn stat_bonus(&self, stat: StatName) -> i32 {
        match self.bonus {
            Some(CompanionBonus::Stat { stat: target, value }) if target == stat => value,
            _ => 0,
        }
    }
}

/// Narrative-only starting gear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    /// Map position in percent of width.
    pub x: f32,
    /// Map position in percent of height.
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub classes: Vec<CharacterClass>,
    pub companions: Vec<Companion>,
    pub starting_items: Vec<StartingItem>,
    pub shop: Vec<LootItem>,
    pub locations: Vec<Location>,
}

impl Catalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            classes: Vec::new(),
            companions: Vec::new(),
            starting_items: Vec::new(),
            shop: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Load a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The catalog shipped with the crate.
    #[must_use]
    pub fn load_default() -> Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG
            .get_or_init(|| {
                Self::from_json(DEFAULT_CATALOG).unwrap_or_else(|err| {
                    log::error!("embedded catalog failed to parse: {err}");
                    Self::empty()
                })
            })
            .clone()
    }

    #[must_use]
    pub fn class(&self, id: &str) -> Option<&CharacterClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn companion(&self, id: &str) -> Option<&Companion> {
        self.companions.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn starting_item(&self, id: &str) -> Option<&StartingItem> {
        self.starting_items.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn shop_item(&self, id: &str) -> Option<&LootItem> {
        self.shop.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Rarity, SlotKind};

    #[test]
    fn embedded_catalog_is_complete() {
        let catalog = Catalog::load_default();
        assert_eq!(catalog.classes.len(), 6);
        assert_eq!(catalog.companions.len(), 4);
        assert_eq!(catalog.starting_items.len(), 8);
        assert_eq!(catalog.shop.len(), 4);
        assert_eq!(catalog.locations.len(), 4);
        assert!(catalog.shop.iter().all(|item| item.price.is_some()));
    }

    #[test]
    fn lookups_resolve_known_ids() {
        let catalog = Catalog::load_default();
        let mage = catalog.class("mage").unwrap();
        assert_eq!(mage.stats.intelligence, 16);
        assert_eq!(mage.stats.get(StatName::Strength), 6);

        let sword = catalog.shop_item("shop_4").unwrap();
        assert_eq!(sword.slot, SlotKind::Weapon);
        assert_eq!(sword.rarity, Rarity::Legendary);
        assert_eq!(sword.price, Some(600));

        assert!(catalog.location("forest").is_some());
        assert!(catalog.starting_item("lamp").is_some());
        assert!(catalog.class("necromancer").is_none());
    }

    #[test]
    fn companion_bonus_targets_one_stat() {
        let catalog = Catalog::load_default();
        let owl = catalog.companion("owl").unwrap();
        assert_eq!(owl.stat_bonus(StatName::Intelligence), 2);
        assert_eq!(owl.stat_bonus(StatName::Strength), 0);

        let drake = catalog.companion("dragon").unwrap();
        assert_eq!(drake.bonus, Some(CompanionBonus::MaxHp { value: 10 }));
        assert_eq!(drake.stat_bonus(StatName::Dexterity), 0);
    }
}
