use ethereal_game::{OpeningRequest, OutcomeRequest};

pub const SYSTEM_PROMPT: &str = "You are the dungeon master of the tabletop RPG \"Ethereal Ink\". \
The mood is dark medieval, poetic and mysterious. You answer with a single JSON object and nothing else.";

const ACTION_SHAPE: &str = r#"each action is {"label": string, "statRequired": "strength" | "intelligence" | "dexterity", "difficulty": number}"#;

const OUTCOME_RULES: &str = "Rules:
1. If the player meets a character they can talk to, set \"specialInteraction\" to {\"type\": \"dialogue\", \"npcName\", \"npcPersonality\", \"npcDialogue\"}; the actions become fitting replies or deeds.
2. If the scene calls for a riddle (an ancient chest, a sphinx), set \"specialInteraction\" to {\"type\": \"quiz\", \"question\", \"answer\"} with a one- or two-word answer.
3. Karma shapes the world: characters cooperate with a good player and turn hostile or fearful toward an evil one.
4. Gold reward: 10 to 100 gold when the action succeeds, 0 when it fails.
5. Karma change: positive for good deeds, negative for evil ones.
6. Only when something truly remarkable is found, add \"loot\": {\"name\", \"description\", \"rarity\": \"common\" | \"rare\" | \"very-rare\" | \"legendary\" | \"mythic\", \"type\": \"weapon\" | \"armor\" | \"trinket\", \"statBonuses\": {\"strength\"?, \"intelligence\"?, \"dexterity\"?}} and set \"isSignificantEvent\" to true.";

/// Prompt wording shared by both requests.
#[derive(Debug, Clone)]
pub struct PromptStyle {
    pub language: String,
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
        }
    }
}

fn karma_line(karma: i32) -> String {
    format!("Current karma: {karma} (0 is neutral, positive is good, negative is evil; range -100 to 100)")
}

#[must_use]
pub fn opening_prompt(request: &OpeningRequest, style: &PromptStyle) -> String {
    format!(
        "Write in {language}.\n\
         Character: {class}\n\
         Carried items: {items}\n\
         Location: {location}\n\
         {karma}\n\n\
         Describe the scene that opens at this location in one paragraph of atmosphere, \
         then offer exactly three actions the player could take. \
         The first reactions of the people around should depend on the player's karma.\n\n\
         Respond with JSON: {{\"narrative\": string, \"actions\": [...]}}, where {ACTION_SHAPE}.",
        language = style.language,
        class = request.class_name,
        items = request.starting_items.join(", "),
        location = request.location,
        karma = karma_line(request.karma),
    )
}

#[must_use]
pub fn outcome_prompt(request: &OutcomeRequest, style: &PromptStyle) -> String {
    let roll = request.roll_total.map_or_else(
        || "no roll (answer to a riddle)".to_string(),
        |total| total.to_string(),
    );
    let verdict = if request.success { "success" } else { "failure" };
    format!(
        "Continue the story as the dungeon master. Write in {language}.\n\
         Current situation: {scenario}\n\
         Player action: {action}\n\
         Dice result: {roll} ({verdict})\n\
         {karma}\n\n\
         Advance the story according to the result and offer three new actions.\n\n\
         {OUTCOME_RULES}\n\n\
         Respond with JSON: {{\"narrative\": string, \"actions\": [...], \"karmaDelta\": number, \
         \"goldReward\": number, \"isSignificantEvent\": boolean, \"specialInteraction\": object | null, \
         \"loot\": object | null}}, where {ACTION_SHAPE}.",
        language = style.language,
        scenario = request.scenario,
        action = request.action,
        karma = karma_line(request.karma),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_prompt_carries_the_selection() {
        let prompt = opening_prompt(
            &OpeningRequest {
                class_name: "Forest Warden".into(),
                starting_items: vec!["Silk Rope".into(), "Mist Cloak".into()],
                location: "Whispering Forest".into(),
                karma: -15,
            },
            &PromptStyle::default(),
        );
        assert!(prompt.contains("Character: Forest Warden"));
        assert!(prompt.contains("Silk Rope, Mist Cloak"));
        assert!(prompt.contains("Current karma: -15"));
        assert!(prompt.contains("\"statRequired\""));
    }

    #[test]
    fn outcome_prompt_describes_roll_or_riddle() {
        let mut request = OutcomeRequest {
            scenario: "A sphinx waits.".into(),
            action: "Answer: River".into(),
            roll_total: None,
            success: true,
            karma: 30,
        };
        let style = PromptStyle {
            language: "Korean".into(),
        };
        let prompt = outcome_prompt(&request, &style);
        assert!(prompt.contains("Write in Korean"));
        assert!(prompt.contains("no roll (answer to a riddle) (success)"));
        assert!(prompt.contains("10 to 100 gold"));

        request.roll_total = Some(7);
        request.success = false;
        assert!(outcome_prompt(&request, &style).contains("Dice result: 7 (failure)"));
    }
}
