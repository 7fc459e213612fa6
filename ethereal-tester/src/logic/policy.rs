use std::fmt;

use ethereal_game::{GameSession, GameState, RandomSource, Scenario, SlotKind, stat_modifier};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// How the automated player picks among offered actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionPolicy {
    /// Always the first action.
    FirstChoice,
    /// The action with the best modifier against its difficulty.
    BestOdds,
    /// Uniformly random, seeded per run.
    SeededRandom,
}

impl ActionPolicy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstChoice => "First Choice",
            Self::BestOdds => "Best Odds",
            Self::SeededRandom => "Seeded Random",
        }
    }
}

impl fmt::Display for ActionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the automated player answers quizzes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuizPolicy {
    /// Reads the expected answer off the scenario, shouting it in odd case.
    Oracle,
    /// Always wrong.
    Fool,
    /// Right about half the time.
    Coin,
}

/// Whether the automated player shops between turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PurchasePolicy {
    Never,
    /// Buy the cheapest affordable shop item for an empty slot and wear it.
    FillEmptySlots,
}

/// Decision-making for one automated run.
pub struct Player {
    pub action: ActionPolicy,
    pub quiz: QuizPolicy,
    pub purchase: PurchasePolicy,
    rng: ChaCha20Rng,
}

impl Player {
    #[must_use]
    pub fn new(action: ActionPolicy, quiz: QuizPolicy, purchase: PurchasePolicy, seed: u64) -> Self {
        Self {
            action,
            quiz,
            purchase,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Index of the action to take, or `None` when nothing is offered.
    pub fn pick_action(&mut self, state: &GameState, scenario: &Scenario) -> Option<usize> {
        if scenario.actions.is_empty() {
            return None;
        }
        let index = match self.action {
            ActionPolicy::FirstChoice => 0,
            ActionPolicy::SeededRandom => self.rng.gen_range(0..scenario.actions.len()),
            ActionPolicy::BestOdds => scenario
                .actions
                .iter()
                .enumerate()
                .max_by_key(|(index, action)| {
                    // Ties go to the earliest action.
                    (
                        stat_modifier(state, action.stat_required) - action.difficulty,
                        std::cmp::Reverse(*index),
                    )
                })
                .map_or(0, |(index, _)| index),
        };
        Some(index)
    }

    /// Answer text for the scenario's quiz, if it poses one.
    pub fn answer(&mut self, scenario: &Scenario) -> Option<String> {
        let (_, expected) = scenario.quiz()?;
        let correct = match self.quiz {
            QuizPolicy::Oracle => true,
            QuizPolicy::Fool => false,
            QuizPolicy::Coin => self.rng.gen_bool(0.5),
        };
        Some(if correct {
            format!("  {}  ", expected.to_uppercase())
        } else {
            format!("not {expected}")
        })
    }

    /// Shop ids to buy right now, cheapest first, one per empty slot.
    #[must_use]
    pub fn shopping_list<R: RandomSource>(&self, session: &GameSession<R>) -> Vec<String> {
        if self.purchase == PurchasePolicy::Never {
            return Vec::new();
        }
        let state = session.state();
        let mut budget = state.gold;
        let mut list = Vec::new();
        for slot in SlotKind::ALL {
            if state.equipment.slot(slot).is_some() {
                continue;
            }
            let cheapest = session
                .catalog()
                .shop
                .iter()
                .filter(|item| item.slot == slot)
                .filter_map(|item| item.price.map(|price| (price, item)))
                .filter(|(price, _)| *price <= budget)
                .min_by_key(|(price, _)| *price);
            if let Some((price, item)) = cheapest {
                budget -= price;
                list.push(item.id.clone());
            }
        }
        list
    }
}
