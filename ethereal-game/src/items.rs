//! Loot items, rarities, equipment slots and stat bonuses.
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::ITEM_ID_LEN;
use crate::dice::RandomSource;

/// One of the three attributes a check can be made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatName {
    Strength,
    Intelligence,
    Dexterity,
}

impl StatName {
    pub const ALL: [Self; 3] = [Self::Strength, Self::Intelligence, Self::Dexterity];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Intelligence => "intelligence",
            Self::Dexterity => "dexterity",
        }
    }

    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Intelligence => "INT",
            Self::Dexterity => "DEX",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" | "str" => Ok(Self::Strength),
            "intelligence" | "int" => Ok(Self::Intelligence),
            "dexterity" | "dex" => Ok(Self::Dexterity),
            _ => Err(()),
        }
    }
}

/// Item rarity, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rarity {
    Common,
    Rare,
    VeryRare,
    Legendary,
    Mythic,
}

impl Rarity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::VeryRare => "very-rare",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
        }
    }

    /// Display colour used when presenting an item of this rarity.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Common => "#9ca3af",
            Self::Rare => "#3b82f6",
            Self::VeryRare => "#a855f7",
            Self::Legendary => "#f59e0b",
            Self::Mythic => "#ef4444",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "common" | "보통" => Ok(Self::Common),
            "rare" | "희귀" => Ok(Self::Rare),
            "very-rare" | "veryrare" | "매우-희귀" => Ok(Self::VeryRare),
            "legendary" | "전설" => Ok(Self::Legendary),
            "mythic" | "신화" => Ok(Self::Mythic),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for Rarity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|()| serde::de::Error::custom(format!("unknown rarity '{raw}'")))
    }
}

/// Equipment slot an item occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Weapon,
    Armor,
    Trinket,
}

impl SlotKind {
    pub const ALL: [Self; 3] = [Self::Weapon, Self::Armor, Self::Trinket];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Trinket => "trinket",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weapon" | "무기" => Ok(Self::Weapon),
            "armor" | "armour" | "방어구" => Ok(Self::Armor),
            "trinket" | "accessory" | "장신구" => Ok(Self::Trinket),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for SlotKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|()| serde::de::Error::custom(format!("unknown slot type '{raw}'")))
    }
}

/// Optional additive bonuses an item grants while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatBonuses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<f64>,
}

impl StatBonuses {
    /// Bonus for one stat; an absent bonus counts as zero.
    #[must_use]
    pub fn get(&self, stat: StatName) -> f64 {
        match stat {
            StatName::Strength => self.strength,
            StatName::Intelligence => self.intelligence,
            StatName::Dexterity => self.dexterity,
        }
        .unwrap_or(0.0)
    }

    /// Drop negative and non-finite bonuses.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let keep = |v: Option<f64>| v.filter(|x| x.is_finite()).map(|x| x.max(0.0));
        Self {
            strength: keep(self.strength),
            intelligence: keep(self.intelligence),
            dexterity: keep(self.dexterity),
        }
    }
}

/// An ownable, equippable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    #[serde(rename = "type")]
    pub slot: SlotKind,
    #[serde(default)]
    pub stat_bonuses: StatBonuses,
    /// Only shop catalog entries carry a price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

impl LootItem {
    /// Copy this item for an inventory, with a fresh id unused by `taken`.
    #[must_use]
    pub fn acquire<R: RandomSource + ?Sized>(&self, rng: &mut R, taken: &[LootItem]) -> Self {
        let mut id = generate_item_id(rng);
        while id == self.id || taken.iter().any(|item| item.id == id) {
            id = generate_item_id(rng);
        }
        Self {
            id,
            price: None,
            ..self.clone()
        }
    }

    /// Bonus for one stat; absent bonuses count as zero.
    #[must_use]
    pub fn bonus(&self, stat: StatName) -> f64 {
        self.stat_bonuses.get(stat)
    }
}

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short base-36 identifier drawn from the random source.
pub fn generate_item_id<R: RandomSource + ?Sized>(rng: &mut R) -> String {
    let mut bits = rng.next_u64();
    let mut id = String::with_capacity(ITEM_ID_LEN);
    for _ in 0..ITEM_ID_LEN {
        let idx = usize::try_from(bits % 36).unwrap_or(0);
        id.push(char::from(ID_ALPHABET[idx]));
        bits /= 36;
    }
    id
}
