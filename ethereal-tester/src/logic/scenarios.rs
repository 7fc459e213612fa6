use anyhow::ensure;

use super::policy::{ActionPolicy, PurchasePolicy, QuizPolicy};
use super::scripted::GeneratorProfile;
use super::simulation::{AdventurePlan, RunSummary};

/// A named logic scenario.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: AdventurePlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: AdventurePlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: &[(&str, &str)] = &[
    ("smoke", "Warrior with a hound plays a short, well-behaved adventure"),
    ("shopping", "Rogue buys and wears shop gear between turns"),
    ("quiz-master", "Mage faces a riddle-heavy generator and answers by coin flip"),
    ("flaky-generator", "Paladin plays through outages and malformed responses"),
    ("save-roundtrip", "Bard saves and reloads into a fresh session after every turn"),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

#[must_use]
pub fn scenario_names() -> Vec<String> {
    SCENARIOS.iter().map(|(name, _)| (*name).to_string()).collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let plan = match name {
        "smoke" => smoke_plan(),
        "shopping" => shopping_plan(),
        "quiz-master" => quiz_master_plan(),
        "flaky-generator" => flaky_generator_plan(),
        "save-roundtrip" => save_roundtrip_plan(),
        _ => return None,
    };
    Some(TestScenario::new(name, plan))
}

fn smoke_plan() -> AdventurePlan {
    AdventurePlan::new("warrior", "hound")
        .with_turns(8)
        .with_expectation(|summary: &RunSummary| {
            ensure!(summary.turns_played == 8, "played {} of 8 turns", summary.turns_played);
            ensure!(
                summary.dice_notifications == summary.actions_taken,
                "{} actions produced {} roll notifications",
                summary.actions_taken,
                summary.dice_notifications
            );
            Ok(())
        })
}

fn shopping_plan() -> AdventurePlan {
    AdventurePlan::new("rogue", "cat")
        .with_items(&["key", "cloak"])
        .at("forest")
        .with_turns(12)
        .with_policies(
            ActionPolicy::BestOdds,
            QuizPolicy::Oracle,
            PurchasePolicy::FillEmptySlots,
        )
        .with_generator(GeneratorProfile {
            loot_rate: 0.4,
            ..GeneratorProfile::default()
        })
        .with_expectation(|summary: &RunSummary| {
            let equipped = summary.final_state.equipment.iter().count();
            ensure!(
                summary.purchases == 0 || equipped > 0,
                "bought {} items but wears none",
                summary.purchases
            );
            Ok(())
        })
}

fn quiz_master_plan() -> AdventurePlan {
    AdventurePlan::new("mage", "owl")
        .with_items(&["herb", "compass", "lamp"])
        .at("mountains")
        .with_turns(15)
        .with_policies(ActionPolicy::BestOdds, QuizPolicy::Coin, PurchasePolicy::Never)
        .with_generator(GeneratorProfile {
            quiz_rate: 0.6,
            ..GeneratorProfile::default()
        })
        .with_expectation(|summary: &RunSummary| {
            ensure!(
                summary.quizzes_correct <= summary.quizzes_answered,
                "more correct answers than quizzes"
            );
            Ok(())
        })
}

fn flaky_generator_plan() -> AdventurePlan {
    AdventurePlan::new("paladin", "dragon")
        .with_items(&["vial"])
        .at("citadel")
        .with_turns(20)
        .with_policies(ActionPolicy::SeededRandom, QuizPolicy::Coin, PurchasePolicy::Never)
        .with_generator(GeneratorProfile {
            failure_rate: 0.35,
            ..GeneratorProfile::default()
        })
        .with_expectation(|summary: &RunSummary| {
            let stats = summary.generator;
            ensure!(
                summary.generator_failures == stats.outages + stats.malformed,
                "session saw {} failures, generator caused {}",
                summary.generator_failures,
                stats.outages + stats.malformed
            );
            Ok(())
        })
}

fn save_roundtrip_plan() -> AdventurePlan {
    AdventurePlan::new("bard", "owl")
        .with_items(&["compass", "dagger"])
        .with_turns(10)
        .with_policies(ActionPolicy::SeededRandom, QuizPolicy::Oracle, PurchasePolicy::FillEmptySlots)
        .with_save_roundtrips()
        .with_expectation(|summary: &RunSummary| {
            ensure!(
                summary.save_roundtrips == summary.turns_played,
                "{} roundtrips over {} turns",
                summary.save_roundtrips,
                summary.turns_played
            );
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (name, description) in list_scenarios() {
            let scenario = get_scenario(name).unwrap();
            assert_eq!(scenario.name, name);
            assert!(!description.is_empty());
            assert!(!scenario.plan.expectations.is_empty());
        }
        assert!(get_scenario("speedrun").is_none());
    }

    #[test]
    fn names_match_listing() {
        assert_eq!(scenario_names().len(), list_scenarios().len());
        assert_eq!(scenario_names()[0], "smoke");
    }
}
