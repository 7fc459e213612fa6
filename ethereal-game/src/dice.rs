//! Random sources and the outcome resolver.
//!
//! All randomness enters the engine through [`RandomSource`] so that a seeded
//! or scripted source can stand in for entropy during tests and replays.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::DEFAULT_DIE_SIDES;
use crate::items::StatName;
use crate::scenario::ActionChoice;
use crate::state::GameState;
use crate::stats::{compute_stat, modifier};

/// Port for uniform integer draws.
pub trait RandomSource {
    /// Roll a die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Raw 64 bits, used for id generation.
    fn next_u64(&mut self) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }

    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// Deterministic ChaCha20-backed source.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha20Rng,
}

impl SeededDice {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Seed from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

/// Replays a fixed sequence of rolls; falls back to a seeded source when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    fallback: SeededDice,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: SeededDice::from_seed(0),
        }
    }

    /// Queue another roll.
    pub fn push(&mut self, roll: u32) {
        self.rolls.push_back(roll);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        match self.rolls.pop_front() {
            Some(roll) => roll.clamp(1, sides.max(1)),
            None => self.fallback.roll_die(sides),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.fallback.next_u64()
    }
}

/// The fixed numeric verdict of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
    pub stat: StatName,
    pub roll: u32,
    pub modifier: i32,
    pub total: i32,
    pub difficulty: i32,
    pub success: bool,
}

/// Roll for `action` against its difficulty using a d20.
pub fn resolve_action<R: RandomSource + ?Sized>(
    state: &GameState,
    action: &ActionChoice,
    rng: &mut R,
) -> RollOutcome {
    resolve_action_with_die(state, action, DEFAULT_DIE_SIDES, rng)
}

/// Roll for `action` with a die of `sides` faces. A single roll, no retries.
pub fn resolve_action_with_die<R: RandomSource + ?Sized>(
    state: &GameState,
    action: &ActionChoice,
    sides: u32,
    rng: &mut R,
) -> RollOutcome {
    let roll = rng.roll_die(sides);
    evaluate_roll(state, action, roll)
}

/// Verdict for an already-drawn roll.
#[must_use]
pub fn evaluate_roll(state: &GameState, action: &ActionChoice, roll: u32) -> RollOutcome {
    let modifier = modifier(compute_stat(state, action.stat_required));
    let total = i32::try_from(roll).unwrap_or(i32::MAX).saturating_add(modifier);
    RollOutcome {
        stat: action.stat_required,
        roll,
        modifier,
        total,
        difficulty: action.difficulty,
        success: total >= action.difficulty,
    }
}
