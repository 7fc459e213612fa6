//! State checks run after every step of an automated playthrough.

use std::collections::HashSet;

use anyhow::{Result, bail, ensure};
use ethereal_game::{
    EngineConfig, GameSession, GameState, MemorySaveStore, RandomSource, SaveSnapshot, SlotKind,
};

/// Bounds and referential integrity of a state.
pub fn check_state(state: &GameState, config: &EngineConfig) -> Result<()> {
    ensure!(
        (config.karma_min..=config.karma_max).contains(&state.karma),
        "karma {} outside [{}, {}]",
        state.karma,
        config.karma_min,
        config.karma_max
    );
    ensure!(state.gold >= 0, "gold went negative: {}", state.gold);
    ensure!(
        (0..=state.max_hp).contains(&state.hp),
        "hp {} outside [0, {}]",
        state.hp,
        state.max_hp
    );

    let mut seen = HashSet::new();
    for item in &state.inventory {
        ensure!(seen.insert(item.id.as_str()), "duplicate inventory id {}", item.id);
        ensure!(!item.id.is_empty(), "inventory item '{}' has no id", item.name);
    }

    for slot in SlotKind::ALL {
        let Some(id) = state.equipment.slot(slot) else {
            continue;
        };
        let Some(item) = state.item(id) else {
            bail!("{slot} slot holds {id}, which is not in the inventory");
        };
        ensure!(
            item.slot == slot,
            "{slot} slot holds {} which is a {}",
            item.name,
            item.slot
        );
    }
    Ok(())
}

/// History is append-only.
pub fn check_history_growth(before: &GameState, after: &GameState) -> Result<()> {
    ensure!(
        after.history.len() >= before.history.len(),
        "history shrank from {} to {}",
        before.history.len(),
        after.history.len()
    );
    ensure!(
        after.history[..before.history.len()] == before.history[..],
        "earlier history entries were rewritten"
    );
    Ok(())
}

/// A failed generator call may only add the choice line and notifications.
pub fn check_untouched_by_failure(before: &GameState, after: &GameState) -> Result<()> {
    check_history_growth(before, after)?;
    ensure!(
        after.history.len() <= before.history.len() + 1,
        "failed call appended {} history entries",
        after.history.len() - before.history.len()
    );
    let mut rewound = after.clone();
    rewound.history.truncate(before.history.len());
    ensure!(&rewound == before, "failed call changed the game state");
    Ok(())
}

pub fn check_idle<R: RandomSource>(session: &GameSession<R>) -> Result<()> {
    ensure!(
        !session.is_in_flight(),
        "a generator request is still in flight"
    );
    Ok(())
}

/// Saving then loading into a fresh store and session reproduces the snapshot.
pub fn check_save_roundtrip<R: RandomSource>(session: &GameSession<R>) -> Result<SaveSnapshot> {
    let store = MemorySaveStore::new();
    session.save_to(&store)?;
    let mut fresh = GameSession::seeded(0);
    ensure!(fresh.load_from(&store)?, "saved game did not load back");
    let snapshot = session.snapshot();
    ensure!(
        fresh.snapshot() == snapshot,
        "restored snapshot differs from the saved one"
    );
    Ok(snapshot)
}
