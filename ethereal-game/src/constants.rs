//! Centralized tuning constants and the engine configuration.
//!
//! The constants are the defaults a fresh playthrough starts from. Hosts that
//! need different numbers load an [`EngineConfig`] from JSON; every field is
//! optional there and falls back to the value defined here.

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_STARTING_HP: i32 = 20;
pub(crate) const DEFAULT_STARTING_GOLD: i64 = 100;
pub(crate) const DEFAULT_KARMA_MIN: i32 = -100;
pub(crate) const DEFAULT_KARMA_MAX: i32 = 100;
pub(crate) const DEFAULT_MAX_STARTING_ITEMS: usize = 3;
pub(crate) const DEFAULT_QUIZ_BONUS_GOLD: i64 = 50;
pub(crate) const DEFAULT_DIE_SIDES: u32 = 20;
pub(crate) const DEFAULT_SAVE_KEY_BASE: &str = "ethereal_ink.save";

/// Schema version of the persisted save envelope.
pub const SAVE_VERSION: u32 = 1;

/// Ability modifiers are centred on this score.
pub(crate) const MODIFIER_BASELINE: i32 = 10;

/// Length of locally generated item ids.
pub(crate) const ITEM_ID_LEN: usize = 9;

pub(crate) const CHOICE_PREFIX: &str = "Choice: ";
pub(crate) const ANSWER_PREFIX: &str = "Answer: ";

/// Tunables for a playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub starting_hp: i32,
    pub starting_gold: i64,
    pub karma_min: i32,
    pub karma_max: i32,
    pub max_starting_items: usize,
    /// Gold granted for a correct quiz answer. Quizzes ignore generator rewards.
    pub quiz_bonus_gold: i64,
    pub die_sides: u32,
    pub save_key_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_hp: DEFAULT_STARTING_HP,
            starting_gold: DEFAULT_STARTING_GOLD,
            karma_min: DEFAULT_KARMA_MIN,
            karma_max: DEFAULT_KARMA_MAX,
            max_starting_items: DEFAULT_MAX_STARTING_ITEMS,
            quiz_bonus_gold: DEFAULT_QUIZ_BONUS_GOLD,
            die_sides: DEFAULT_DIE_SIDES,
            save_key_base: DEFAULT_SAVE_KEY_BASE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or `karma_min` exceeds `karma_max`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        if config.karma_min > config.karma_max {
            return Err(serde::de::Error::custom(format!(
                "karma_min {} exceeds karma_max {}",
                config.karma_min, config.karma_max
            )));
        }
        Ok(config)
    }

    /// Storage key for the current save schema.
    #[must_use]
    pub fn save_key(&self) -> String {
        format!("{}.v{SAVE_VERSION}", self.save_key_base)
    }

    /// Clamp a karma value into the configured bounds.
    #[must_use]
    ///
    /// Inverted bounds on a hand-built config are read in ascending order.
    pub fn clamp_karma(&self, karma: i64) -> i32 {
        let low = self.karma_min.min(self.karma_max);
        let high = self.karma_min.max(self.karma_max);
        let clamped = karma.clamp(i64::from(low), i64::from(high));
        i32::try_from(clamped).unwrap_or(high)
    }
}
