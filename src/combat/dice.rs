//! Random source for combat rolls
//!
//! Every random draw the engine makes (starting stats, item pick, hit
//! magnitude, level-up growth) goes through a [`Dice`] so tests can swap
//! in a fixed sequence.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform integer draws
pub trait Dice: Send {
    /// Uniform draw in `0..bound`. A zero bound always yields 0.
    fn below(&mut self, bound: u32) -> u32;

    /// `base` plus a uniform draw in `0..spread`
    fn offset(&mut self, base: u32, spread: u32) -> u32 {
        base.saturating_add(self.below(spread))
    }
}

/// Dice backed by a real RNG
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    /// Seed from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible dice for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice for RandomDice {
    fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.rng.random_range(0..bound)
    }
}

/// Dice that replay a fixed list of rolls
///
/// Each roll is clamped into `0..bound`. Once the list runs out every
/// draw is 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    /// Rolls not consumed yet
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn below(&mut self, bound: u32) -> u32 {
        let roll = self.rolls.pop_front().unwrap_or(0);
        if bound == 0 {
            0
        } else {
            roll.min(bound - 1)
        }
    }
}
