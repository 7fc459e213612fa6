//! Stat aggregation and ability modifiers.

use crate::constants::MODIFIER_BASELINE;
use crate::items::StatName;
use crate::numbers::{floor_f64_to_i32, i32_to_f64};
use crate::state::GameState;

/// Effective value of `stat`: class base, companion bonus and equipped item bonuses,
/// floored. Zero while no class is selected.
#[must_use]
pub fn compute_stat(state: &GameState, stat: StatName) -> i32 {
    let Some(class) = state.character_class.as_ref() else {
        return 0;
    };

    let base = i32::try_from(class.stats.get(stat)).unwrap_or(i32::MAX);
    let companion = state
        .companion
        .as_ref()
        .map_or(0, |companion| companion.stat_bonus(stat));
    let items: f64 = state.equipped_items().map(|item| item.bonus(stat)).sum();

    floor_f64_to_i32(i32_to_f64(base.saturating_add(companion)) + items)
}

/// `floor((stat - 10) / 2)`, rounding toward negative infinity.
#[must_use]
pub const fn modifier(stat: i32) -> i32 {
    stat.saturating_sub(MODIFIER_BASELINE).div_euclid(2)
}

/// Modifier for the aggregated value of `stat`.
#[must_use]
pub fn stat_modifier(state: &GameState, stat: StatName) -> i32 {
    modifier(compute_stat(state, stat))
}

/// Aggregated values for every stat, in [`StatName::ALL`] order.
#[must_use]
pub fn stat_sheet(state: &GameState) -> [(StatName, i32); 3] {
    StatName::ALL.map(|stat| (stat, compute_stat(state, stat)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::items::{LootItem, Rarity, SlotKind, StatBonuses};

    fn item(id: &str, slot: SlotKind, bonuses: StatBonuses) -> LootItem {
        LootItem {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            rarity: Rarity::Rare,
            slot,
            stat_bonuses: bonuses,
            price: None,
        }
    }

    #[test]
    fn no_class_means_zero() {
        let mut state = GameState::default();
        state.companion = Catalog::load_default().companion("hound").cloned();
        for stat in StatName::ALL {
            assert_eq!(compute_stat(&state, stat), 0);
        }
    }

    #[test]
    fn modifier_floors_toward_negative_infinity() {
        assert_eq!(modifier(7), -2);
        assert_eq!(modifier(9), -1);
        assert_eq!(modifier(10), 0);
        assert_eq!(modifier(11), 0);
        assert_eq!(modifier(16), 3);
        assert_eq!(modifier(-3), -7);
    }

    #[test]
    fn layers_class_companion_and_equipped_items() {
        let catalog = Catalog::load_default();
        let mut state = GameState::default();
        state.character_class = catalog.class("rogue").cloned();
        state.companion = catalog.companion("cat").cloned();

        let gloves = item(
            "g1",
            SlotKind::Trinket,
            StatBonuses {
                dexterity: Some(1.5),
                ..StatBonuses::default()
            },
        );
        let dagger = item(
            "d1",
            SlotKind::Weapon,
            StatBonuses {
                dexterity: Some(1.5),
                strength: Some(2.0),
                ..StatBonuses::default()
            },
        );
        let unequipped = item(
            "u1",
            SlotKind::Armor,
            StatBonuses {
                dexterity: Some(9.0),
                ..StatBonuses::default()
            },
        );
        state.inventory = vec![gloves, dagger, unequipped];
        state.equipment.trinket = Some("g1".into());
        state.equipment.weapon = Some("d1".into());

        // 15 base + 2 cat + 1.5 + 1.5
        assert_eq!(compute_stat(&state, StatName::Dexterity), 20);
        assert_eq!(compute_stat(&state, StatName::Strength), 11);
        assert_eq!(compute_stat(&state, StatName::Intelligence), 10);
        assert_eq!(stat_modifier(&state, StatName::Dexterity), 5);
    }

    #[test]
    fn fractional_bonuses_floor_after_summing() {
        let catalog = Catalog::load_default();
        let mut state = GameState::default();
        state.character_class = catalog.class("warrior").cloned();
        state.inventory = vec![item(
            "w",
            SlotKind::Weapon,
            StatBonuses {
                strength: Some(0.75),
                ..StatBonuses::default()
            },
        )];
        state.equipment.weapon = Some("w".into());
        assert_eq!(compute_stat(&state, StatName::Strength), 15);

        let sheet = stat_sheet(&state);
        assert_eq!(sheet[0], (StatName::Strength, 15));
        assert_eq!(sheet[1], (StatName::Intelligence, 8));
    }
}
