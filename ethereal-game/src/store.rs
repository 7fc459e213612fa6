//! Shop purchases.
use thiserror::Error;

use crate::catalog::Catalog;
use crate::dice::RandomSource;
use crate::items::LootItem;
use crate::state::GameState;

/// Recoverable purchase rejections. The state is never mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("not enough gold: have {have}, need {need}")]
    InsufficientFunds { have: i64, need: i64 },
    #[error("`{0}` is not sold here")]
    UnknownShopItem(String),
}

/// Whether `state` can pay for `item`. Items without a price cost nothing.
#[must_use]
pub fn can_afford(state: &GameState, item: &LootItem) -> bool {
    state.gold >= item_price(item)
}

fn item_price(item: &LootItem) -> i64 {
    item.price.unwrap_or(0).max(0)
}

/// Buy a copy of `shop_item`: deduct its price and append a freshly-id-stamped copy.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientFunds`] when gold is below the price.
pub fn purchase<R: RandomSource + ?Sized>(
    state: &mut GameState,
    shop_item: &LootItem,
    rng: &mut R,
) -> Result<LootItem, EconomyError> {
    let price = item_price(shop_item);
    if state.gold < price {
        log::debug!("purchase of {} rejected: {} < {}", shop_item.id, state.gold, price);
        return Err(EconomyError::InsufficientFunds {
            have: state.gold,
            need: price,
        });
    }

    let bought = shop_item.acquire(rng, &state.inventory);
    state.gold -= price;
    state.inventory.push(bought.clone());
    log::info!("purchased {} for {} gold ({} left)", bought.name, price, state.gold);
    Ok(bought)
}

/// Look up `shop_item_id` in the catalog shop and buy it.
///
/// # Errors
///
/// Returns [`EconomyError::UnknownShopItem`] for ids the shop does not stock, or
/// [`EconomyError::InsufficientFunds`] when gold is below the price.
pub fn purchase_from_catalog<R: RandomSource + ?Sized>(
    state: &mut GameState,
    catalog: &Catalog,
    shop_item_id: &str,
    rng: &mut R,
) -> Result<LootItem, EconomyError> {
    let item = catalog
        .shop_item(shop_item_id)
        .ok_or_else(|| EconomyError::UnknownShopItem(shop_item_id.to_string()))?;
    purchase(state, item, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::SeededDice;

    #[test]
    fn purchase_requires_full_price() {
        let catalog = Catalog::load_default();
        let armor = catalog.shop_item("shop_1").unwrap();
        let mut rng = SeededDice::from_seed(11);
        let mut state = GameState::default();
        let before = state.clone();

        assert!(!can_afford(&state, armor));
        assert_eq!(
            purchase(&mut state, armor, &mut rng),
            Err(EconomyError::InsufficientFunds { have: 100, need: 150 })
        );
        assert_eq!(state, before);

        state.gold = 150;
        let bought = purchase(&mut state, armor, &mut rng).unwrap();
        assert_eq!(state.gold, 0);
        assert_eq!(state.inventory.len(), 1);
        assert_ne!(bought.id, armor.id);
        assert!(bought.price.is_none());
        assert_eq!(state.inventory[0], bought);
    }

    #[test]
    fn repeated_purchases_are_distinct_entries() {
        let catalog = Catalog::load_default();
        let mut rng = SeededDice::from_seed(12);
        let mut state = GameState::default();
        state.gold = 1_000;

        let a = purchase_from_catalog(&mut state, &catalog, "shop_3", &mut rng).unwrap();
        let b = purchase_from_catalog(&mut state, &catalog, "shop_3", &mut rng).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(state.gold, 640);
    }

    #[test]
    fn unknown_shop_ids_are_rejected() {
        let catalog = Catalog::load_default();
        let mut rng = SeededDice::from_seed(13);
        let mut state = GameState::default();
        assert_eq!(
            purchase_from_catalog(&mut state, &catalog, "shop_99", &mut rng),
            Err(EconomyError::UnknownShopItem("shop_99".into()))
        );
        assert!(state.inventory.is_empty());
    }
}
