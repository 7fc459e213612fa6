//! The current narrative beat: text, next actions and an optional special interaction.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::items::StatName;

/// One selectable action and the check it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionChoice {
    pub label: String,
    pub stat_required: StatName,
    /// Threshold the roll total must meet or exceed.
    pub difficulty: i32,
}

/// Actions offered by one scene. Generators usually offer three.
pub type ActionList = SmallVec<[ActionChoice; 3]>;

/// Sub-mode overriding plain action selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecialInteraction {
    Quiz {
        question: String,
        answer: String,
    },
    /// Actions of a dialogue scene are the possible replies.
    #[serde(rename_all = "camelCase")]
    Dialogue {
        npc_name: String,
        #[serde(default)]
        npc_personality: String,
        #[serde(default)]
        npc_dialogue: String,
    },
}

impl SpecialInteraction {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Quiz { .. } => "quiz",
            Self::Dialogue { .. } => "dialogue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub narrative: String,
    #[serde(default)]
    pub actions: ActionList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_interaction: Option<SpecialInteraction>,
}

impl Scenario {
    #[must_use]
    pub fn action(&self, index: usize) -> Option<&ActionChoice> {
        self.actions.get(index)
    }

    /// The stored quiz, when this scene poses one.
    #[must_use]
    pub fn quiz(&self) -> Option<(&str, &str)> {
        match &self.special_interaction {
            Some(SpecialInteraction::Quiz { question, answer }) => {
                Some((question.as_str(), answer.as_str()))
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_dialogue(&self) -> bool {
        matches!(
            self.special_interaction,
            Some(SpecialInteraction::Dialogue { .. })
        )
    }
}

/// Case-insensitive comparison of trimmed answers.
#[must_use]
pub fn answer_matches(expected: &str, submitted: &str) -> bool {
    expected.trim().to_lowercase() == submitted.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn quiz_answers_ignore_case_and_padding() {
        assert!(answer_matches("Excalibur", " excalibur "));
        assert!(answer_matches("  Moon  ", "MOON"));
        assert!(!answer_matches("Excalibur", "Excalibur!"));
        assert!(!answer_matches("sun", ""));
    }

    #[test]
    fn scenario_wire_shape_is_camel_case() {
        let scenario = Scenario {
            narrative: "A bridge of light.".into(),
            actions: smallvec![ActionChoice {
                label: "Cross".into(),
                stat_required: StatName::Dexterity,
                difficulty: 12,
            }],
            special_interaction: Some(SpecialInteraction::Dialogue {
                npc_name: "Ferryman".into(),
                npc_personality: "weary".into(),
                npc_dialogue: "Coin first.".into(),
            }),
        };
        let json = serde_json::to_value(&scenario).unwrap();
        assert_eq!(json["actions"][0]["statRequired"], "dexterity");
        assert_eq!(json["specialInteraction"]["type"], "dialogue");
        assert_eq!(json["specialInteraction"]["npcName"], "Ferryman");
        assert!(scenario.is_dialogue());
        assert!(scenario.quiz().is_none());

        let back: Scenario = serde_json::from_value(json).unwrap();
        assert_eq!(back, scenario);
    }

    #[test]
    fn quiz_accessor_exposes_question_and_answer() {
        let scenario = Scenario {
            narrative: "The sphinx stirs.".into(),
            actions: ActionList::new(),
            special_interaction: Some(SpecialInteraction::Quiz {
                question: "What walks on four legs?".into(),
                answer: "Man".into(),
            }),
        };
        assert_eq!(scenario.quiz(), Some(("What walks on four legs?", "Man")));
        assert_eq!(scenario.special_interaction.as_ref().map(SpecialInteraction::kind), Some("quiz"));
        assert!(scenario.action(0).is_none());
    }
}
