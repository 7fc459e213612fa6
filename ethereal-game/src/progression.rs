//! Merges a validated generator outcome into the game state.

use serde::{Deserialize, Serialize};

use crate::constants::EngineConfig;
use crate::dice::RandomSource;
use crate::gateway::OutcomeScene;
use crate::items::LootItem;
use crate::scenario::Scenario;
use crate::state::{GameState, HistoryEntry};

/// What produced the verdict being narrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    /// A dice check; gold comes from the generator.
    Action,
    /// A quiz answer; gold is the fixed bonus on a correct answer.
    Quiz,
}

/// Everything a single merge changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub success: bool,
    pub karma_change: i32,
    pub gold_change: i64,
    pub hp_change: i32,
    pub significant: bool,
    /// The reward as added to the inventory, with its fresh id.
    pub loot: Option<LootItem>,
}

/// Apply `scene` to `state` and hand back the scenario that replaces the current one.
///
/// Never fails: the scene has already been validated at the gateway boundary.
pub fn apply_outcome<R: RandomSource + ?Sized>(
    state: &mut GameState,
    scene: OutcomeScene,
    source: OutcomeSource,
    success: bool,
    config: &EngineConfig,
    rng: &mut R,
) -> (Scenario, ProgressReport) {
    let OutcomeScene {
        scenario,
        karma_delta,
        gold_reward,
        hp_delta,
        is_significant_event,
        loot,
    } = scene;

    state.push_history(HistoryEntry::Narrative {
        text: scenario.narrative.clone(),
        success: Some(success),
    });

    let loot = loot.map(|reward| {
        let item = reward.acquire(&mut *rng, &state.inventory);
        state.inventory.push(item.clone());
        log::info!("loot acquired: {} ({}, {})", item.name, item.rarity, item.slot);
        item
    });

    let karma_before = state.karma;
    state.karma = config.clamp_karma(i64::from(state.karma).saturating_add(karma_delta));

    let gold_before = state.gold;
    let reward = match source {
        OutcomeSource::Action => gold_reward,
        OutcomeSource::Quiz if success => config.quiz_bonus_gold,
        OutcomeSource::Quiz => 0,
    };
    state.add_gold(reward);

    let hp_before = state.hp;
    if let Some(delta) = hp_delta {
        state.adjust_hp(delta);
    }

    let report = ProgressReport {
        success,
        karma_change: state.karma.saturating_sub(karma_before),
        gold_change: state.gold.saturating_sub(gold_before),
        hp_change: state.hp.saturating_sub(hp_before),
        significant: is_significant_event,
        loot,
    };
    log::debug!(
        "outcome merged: success={} karma {} -> {} gold {} -> {}",
        success,
        karma_before,
        state.karma,
        gold_before,
        state.gold
    );
    (scenario, report)
}
