//! Boundary to the external narrative generator.
//!
//! Requests are plain structured context. Responses arrive as loosely-typed
//! JSON text and are validated here into [`OpeningScene`] and [`OutcomeScene`];
//! anything missing a required field is rejected as a [`GatewayError`] before
//! it can reach the game state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::{LootItem, Rarity, SlotKind, StatBonuses, StatName};
use crate::numbers::{ceil_f64_to_i32, floor_f64_to_i32, floor_f64_to_i64};
use crate::scenario::{ActionChoice, ActionList, Scenario, SpecialInteraction};

/// Context for the first scene of an adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRequest {
    pub class_name: String,
    pub starting_items: Vec<String>,
    pub location: String,
    pub karma: i32,
}

/// Context for the scene that follows a resolved action or quiz answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    /// Narrative of the scene the player acted in.
    pub scenario: String,
    pub action: String,
    /// Roll total; quiz answers have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_total: Option<i32>,
    pub success: bool,
    pub karma: i32,
}

/// A pending generator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeRequest {
    Opening(OpeningRequest),
    Outcome(OutcomeRequest),
}

/// Port to the remote narrative generator.
///
/// Implementations return the raw response text; validation happens in the core.
pub trait NarrativeGateway {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Request the opening scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator cannot be reached or rejects the request.
    fn opening_scene(&mut self, request: &OpeningRequest) -> Result<String, Self::Error>;

    /// Request the scene following an outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator cannot be reached or rejects the request.
    fn outcome_scene(&mut self, request: &OutcomeRequest) -> Result<String, Self::Error>;
}

/// Generator failures. Every variant is recoverable.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("generator call failed: {0}")]
    Transport(String),
    #[error("generator returned unparseable data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("generator response is missing `{0}`")]
    MissingField(&'static str),
    #[error("generator response has invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl GatewayError {
    /// Wrap any port error as a transport failure.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// A validated opening scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningScene {
    pub scenario: Scenario,
}

/// A validated outcome scene with its state deltas, already floored to integers.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeScene {
    pub scenario: Scenario,
    pub karma_delta: i64,
    pub gold_reward: i64,
    pub hp_delta: Option<i32>,
    pub is_significant_event: bool,
    /// Reward without an inventory id; one is stamped on acquisition.
    pub loot: Option<LootItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    label: Option<String>,
    stat_required: Option<String>,
    difficulty: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpecial {
    #[serde(rename = "type")]
    kind: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    npc_name: Option<String>,
    npc_personality: Option<String>,
    npc_dialogue: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoot {
    name: Option<String>,
    description: Option<String>,
    rarity: Option<String>,
    #[serde(rename = "type")]
    slot: Option<String>,
    stat_bonuses: Option<StatBonuses>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScene {
    narrative: Option<String>,
    actions: Option<Vec<RawAction>>,
    special_interaction: Option<RawSpecial>,
    karma_delta: Option<f64>,
    gold_reward: Option<f64>,
    hp_delta: Option<f64>,
    is_significant_event: Option<bool>,
    loot: Option<RawLoot>,
}

/// Validate the generator's opening response.
///
/// # Errors
///
/// Returns an error if the text is not JSON or `narrative`/`actions` are missing or invalid.
pub fn decode_opening(raw: &str) -> Result<OpeningScene, GatewayError> {
    let scene: RawScene = serde_json::from_str(raw)?;
    let scenario = build_scenario(scene.narrative, scene.actions, scene.special_interaction)?;
    Ok(OpeningScene { scenario })
}

/// Validate the generator's outcome response.
///
/// # Errors
///
/// Returns an error if the text is not JSON, a required field is missing, or a
/// present field has an unusable value.
pub fn decode_outcome(raw: &str) -> Result<OutcomeScene, GatewayError> {
    let scene: RawScene = serde_json::from_str(raw)?;
    let karma_delta = finite(scene.karma_delta, "karmaDelta")?;
    let gold_reward = finite(scene.gold_reward, "goldReward")?;
    let is_significant_event = scene
        .is_significant_event
        .ok_or(GatewayError::MissingField("isSignificantEvent"))?;
    let hp_delta = match scene.hp_delta {
        Some(delta) if !delta.is_finite() => {
            return Err(GatewayError::invalid("hpDelta", "not a finite number"));
        }
        other => other.map(floor_f64_to_i32),
    };
    let loot = scene.loot.map(build_loot).transpose()?;
    let scenario = build_scenario(scene.narrative, scene.actions, scene.special_interaction)?;

    Ok(OutcomeScene {
        scenario,
        karma_delta: floor_f64_to_i64(karma_delta),
        gold_reward: floor_f64_to_i64(gold_reward),
        hp_delta,
        is_significant_event,
        loot,
    })
}

fn finite(value: Option<f64>, field: &'static str) -> Result<f64, GatewayError> {
    let value = value.ok_or(GatewayError::MissingField(field))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GatewayError::invalid(field, "not a finite number"))
    }
}

fn build_scenario(
    narrative: Option<String>,
    actions: Option<Vec<RawAction>>,
    special: Option<RawSpecial>,
) -> Result<Scenario, GatewayError> {
    let narrative = narrative
        .filter(|text| !text.trim().is_empty())
        .ok_or(GatewayError::MissingField("narrative"))?;
    let actions = actions
        .ok_or(GatewayError::MissingField("actions"))?
        .into_iter()
        .map(build_action)
        .collect::<Result<ActionList, _>>()?;
    let special_interaction = special.map(build_special).transpose()?;

    let is_quiz = matches!(special_interaction, Some(SpecialInteraction::Quiz { .. }));
    if actions.is_empty() && !is_quiz {
        return Err(GatewayError::invalid("actions", "no actions offered"));
    }

    Ok(Scenario {
        narrative,
        actions,
        special_interaction,
    })
}

fn build_action(raw: RawAction) -> Result<ActionChoice, GatewayError> {
    let label = raw
        .label
        .filter(|label| !label.trim().is_empty())
        .ok_or(GatewayError::MissingField("actions[].label"))?;
    let stat = raw
        .stat_required
        .ok_or(GatewayError::MissingField("actions[].statRequired"))?;
    let stat_required = stat
        .parse::<StatName>()
        .map_err(|()| GatewayError::invalid("actions[].statRequired", format!("unknown stat '{stat}'")))?;
    let difficulty = finite(raw.difficulty, "actions[].difficulty")?;

    Ok(ActionChoice {
        label,
        stat_required,
        difficulty: ceil_f64_to_i32(difficulty),
    })
}

fn build_special(raw: RawSpecial) -> Result<SpecialInteraction, GatewayError> {
    let kind = raw
        .kind
        .ok_or(GatewayError::MissingField("specialInteraction.type"))?;
    match kind.trim().to_ascii_lowercase().as_str() {
        "quiz" => Ok(SpecialInteraction::Quiz {
            question: raw
                .question
                .ok_or(GatewayError::MissingField("specialInteraction.question"))?,
            answer: raw
                .answer
                .filter(|answer| !answer.trim().is_empty())
                .ok_or(GatewayError::MissingField("specialInteraction.answer"))?,
        }),
        "dialogue" => Ok(SpecialInteraction::Dialogue {
            npc_name: raw
                .npc_name
                .ok_or(GatewayError::MissingField("specialInteraction.npcName"))?,
            npc_personality: raw.npc_personality.unwrap_or_default(),
            npc_dialogue: raw.npc_dialogue.unwrap_or_default(),
        }),
        other => Err(GatewayError::invalid(
            "specialInteraction.type",
            format!("unknown interaction '{other}'"),
        )),
    }
}

fn build_loot(raw: RawLoot) -> Result<LootItem, GatewayError> {
    let name = raw.name.ok_or(GatewayError::MissingField("loot.name"))?;
    let slot_text = raw.slot.ok_or(GatewayError::MissingField("loot.type"))?;
    let slot = slot_text
        .parse::<SlotKind>()
        .map_err(|()| GatewayError::invalid("loot.type", format!("unknown slot '{slot_text}'")))?;
    let rarity = match raw.rarity {
        None => Rarity::Common,
        Some(text) => text
            .parse::<Rarity>()
            .map_err(|()| GatewayError::invalid("loot.rarity", format!("unknown rarity '{text}'")))?,
    };

    Ok(LootItem {
        id: String::new(),
        name,
        description: raw.description.unwrap_or_default(),
        rarity,
        slot,
        stat_bonuses: raw.stat_bonuses.unwrap_or_default().sanitized(),
        price: None,
    })
}
