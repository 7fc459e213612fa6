//! Deterministic stand-in for the remote narrative generator.
//!
//! Responses are built from small word tables with a seeded RNG, so a seed
//! always reproduces the same adventure. A profile controls how often the
//! generator hands out loot, quizzes and dialogues, and how often it misbehaves
//! (transport outages and malformed payloads).

use ethereal_game::{NarrativeGateway, OpeningRequest, OutcomeRequest};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};
use thiserror::Error;

const PLACES: &[&str] = &[
    "a collapsed reliquary",
    "a bridge of braided roots",
    "a hall of weeping statues",
    "a frozen stair",
    "an ink-black pool",
    "a watchtower lit by foxfire",
];

const VERBS: &[(&str, &str)] = &[
    ("Shoulder through", "strength"),
    ("Haul aside", "strength"),
    ("Study", "intelligence"),
    ("Recall the lore of", "intelligence"),
    ("Slip past", "dexterity"),
    ("Leap across", "dexterity"),
];

const RIDDLES: &[(&str, &str)] = &[
    ("What grows when fed but dies when watered?", "Fire"),
    ("What has roots nobody sees and is taller than trees?", "Mountain"),
    ("What can run but never walks?", "River"),
    ("The more you take, the more you leave behind. What are they?", "Footsteps"),
];

const NPCS: &[(&str, &str)] = &[
    ("Maelis the Ferrywoman", "weary and exacting"),
    ("Brother Ashgrove", "pious, quick to judge"),
    ("Quill", "a nervous thief with a good heart"),
];

const LOOT_NAMES: &[&str] = &[
    "Lantern of Vows",
    "Gloomsteel Gauntlet",
    "Cinder Circlet",
    "Wyrmbone Buckler",
    "Saltglass Dagger",
];

const RARITIES: &[&str] = &["common", "rare", "very-rare", "Very Rare", "legendary", "mythic", "희귀"];
const SLOTS: &[&str] = &["weapon", "armor", "trinket", "무기"];

/// Knobs for the scripted generator, each a probability in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorProfile {
    pub failure_rate: f64,
    pub loot_rate: f64,
    pub quiz_rate: f64,
    pub dialogue_rate: f64,
}

impl Default for GeneratorProfile {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            loot_rate: 0.25,
            quiz_rate: 0.1,
            dialogue_rate: 0.15,
        }
    }
}

#[derive(Debug, Error)]
#[error("scripted generator outage on call {call}")]
pub struct GeneratorOutage {
    pub call: usize,
}

/// Counters kept across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    pub calls: usize,
    pub outages: usize,
    pub malformed: usize,
}

pub struct ScriptedGenerator {
    rng: ChaCha20Rng,
    profile: GeneratorProfile,
    stats: GeneratorStats,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new(seed: u64, profile: GeneratorProfile) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            profile,
            stats: GeneratorStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> GeneratorStats {
        self.stats
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.gen_range(0..items.len())]
    }

    /// Decide up front whether this call misbehaves.
    fn misbehave(&mut self) -> Result<Option<String>, GeneratorOutage> {
        self.stats.calls += 1;
        if !self.chance(self.profile.failure_rate) {
            return Ok(None);
        }
        if self.rng.gen_bool(0.5) {
            self.stats.outages += 1;
            return Err(GeneratorOutage {
                call: self.stats.calls,
            });
        }
        self.stats.malformed += 1;
        let broken = match self.rng.gen_range(0..3) {
            0 => r#"{"narrative": "The ink runs and the page tears"#.to_string(),
            1 => json!({ "narrative": "Only silence answers." }).to_string(),
            _ => json!({
                "narrative": "A voice hums in a tongue you do not know.",
                "actions": [{ "label": "Hum back", "statRequired": "charisma", "difficulty": 10 }],
                "karmaDelta": 0,
                "goldReward": 0,
                "isSignificantEvent": false
            })
            .to_string(),
        };
        Ok(Some(broken))
    }

    fn actions(&mut self, count: usize) -> Vec<Value> {
        (0..count)
            .map(|_| {
                let (verb, stat) = *self.pick(VERBS);
                let place = *self.pick(PLACES);
                let base: f64 = f64::from(self.rng.gen_range(6..=17_i32));
                let difficulty = if self.rng.gen_bool(0.2) { base + 0.5 } else { base };
                json!({
                    "label": format!("{verb} {place}"),
                    "statRequired": stat,
                    "difficulty": difficulty,
                })
            })
            .collect()
    }

    fn special(&mut self) -> Value {
        if self.chance(self.profile.quiz_rate) {
            let (question, answer) = *self.pick(RIDDLES);
            return json!({ "type": "quiz", "question": question, "answer": answer });
        }
        if self.chance(self.profile.dialogue_rate) {
            let (name, personality) = *self.pick(NPCS);
            return json!({
                "type": "dialogue",
                "npcName": name,
                "npcPersonality": personality,
                "npcDialogue": "State your business, traveller.",
            });
        }
        Value::Null
    }

    fn loot(&mut self) -> Value {
        if !self.chance(self.profile.loot_rate) {
            return Value::Null;
        }
        let stat = self.pick(&["strength", "intelligence", "dexterity"]).to_string();
        let bonus = f64::from(self.rng.gen_range(1..=4_i32)) + if self.rng.gen_bool(0.3) { 0.5 } else { 0.0 };
        let mut bonuses = serde_json::Map::new();
        bonuses.insert(stat, json!(bonus));
        json!({
            "name": *self.pick(LOOT_NAMES),
            "description": "It hums faintly when held.",
            "rarity": *self.pick(RARITIES),
            "type": *self.pick(SLOTS),
            "statBonuses": Value::Object(bonuses),
        })
    }
}

impl NarrativeGateway for ScriptedGenerator {
    type Error = GeneratorOutage;

    fn opening_scene(&mut self, request: &OpeningRequest) -> Result<String, Self::Error> {
        if let Some(broken) = self.misbehave()? {
            return Ok(broken);
        }
        let mood = if request.karma >= 0 { "hopeful" } else { "wary" };
        let actions = self.actions(3);
        Ok(json!({
            "narrative": format!(
                "{} arrives at {} carrying {}. The air feels {mood}.",
                request.class_name,
                request.location,
                request.starting_items.join(", ")
            ),
            "actions": actions,
        })
        .to_string())
    }

    fn outcome_scene(&mut self, request: &OutcomeRequest) -> Result<String, Self::Error> {
        if let Some(broken) = self.misbehave()? {
            return Ok(broken);
        }
        let special = self.special();
        let action_count = if special.get("type").and_then(Value::as_str) == Some("quiz") {
            self.rng.gen_range(0..=1)
        } else {
            3
        };
        let actions = self.actions(action_count);
        let karma_delta = f64::from(self.rng.gen_range(-8..=8_i32)) + if self.rng.gen_bool(0.25) { 0.5 } else { 0.0 };
        let gold_reward = if request.success {
            self.rng.gen_range(10..=100_i64)
        } else {
            0
        };
        let hp_delta: Value = match (request.success, self.rng.gen_range(0..4)) {
            (false, 0 | 1) => json!(-f64::from(self.rng.gen_range(1..=6_i32))),
            (true, 0) => json!(2),
            _ => Value::Null,
        };
        let loot = if request.success { self.loot() } else { Value::Null };
        let verdict = if request.success { "succeeds" } else { "falters" };

        Ok(json!({
            "narrative": format!("The attempt to {} {verdict}.", request.action.to_lowercase()),
            "actions": actions,
            "karmaDelta": karma_delta,
            "goldReward": gold_reward,
            "hpDelta": hp_delta,
            "isSignificantEvent": !loot.is_null(),
            "specialInteraction": special,
            "loot": loot,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereal_game::{decode_opening, decode_outcome};

    fn outcome_request(success: bool) -> OutcomeRequest {
        OutcomeRequest {
            scenario: "A bridge sways.".into(),
            action: "Cross it".into(),
            roll_total: Some(14),
            success,
            karma: 0,
        }
    }

    #[test]
    fn well_behaved_generator_always_decodes() {
        let profile = GeneratorProfile {
            loot_rate: 1.0,
            quiz_rate: 0.3,
            dialogue_rate: 0.3,
            ..GeneratorProfile::default()
        };
        let mut generator = ScriptedGenerator::new(9, profile);
        let opening = generator
            .opening_scene(&OpeningRequest {
                class_name: "Soul Minstrel".into(),
                starting_items: vec!["Silk Rope".into()],
                location: "Ironfang Range".into(),
                karma: 0,
            })
            .unwrap();
        assert_eq!(decode_opening(&opening).unwrap().scenario.actions.len(), 3);

        for i in 0..200 {
            let raw = generator.outcome_scene(&outcome_request(i % 3 != 0)).unwrap();
            let scene = decode_outcome(&raw).unwrap();
            if i % 3 == 0 {
                assert_eq!(scene.gold_reward, 0);
                assert!(scene.loot.is_none());
            } else {
                assert!(scene.loot.is_some());
            }
        }
        assert_eq!(generator.stats().calls, 201);
    }

    #[test]
    fn same_seed_same_story() {
        let mut a = ScriptedGenerator::new(77, GeneratorProfile::default());
        let mut b = ScriptedGenerator::new(77, GeneratorProfile::default());
        for _ in 0..20 {
            assert_eq!(
                a.outcome_scene(&outcome_request(true)).unwrap(),
                b.outcome_scene(&outcome_request(true)).unwrap()
            );
        }
    }

    #[test]
    fn failing_generator_misbehaves_every_call() {
        let profile = GeneratorProfile {
            failure_rate: 1.0,
            ..GeneratorProfile::default()
        };
        let mut generator = ScriptedGenerator::new(5, profile);
        for _ in 0..30 {
            match generator.outcome_scene(&outcome_request(true)) {
                Ok(raw) => assert!(decode_outcome(&raw).is_err()),
                Err(outage) => assert!(outage.call > 0),
            }
        }
        let stats = generator.stats();
        assert_eq!(stats.outages + stats.malformed, 30);
    }
}
