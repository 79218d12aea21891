//! Combat system module
//!
//! Implements the arena's combat and progression rules:
//! - Bounded AP/HP properties
//! - Items that boost a single swing
//! - Armor-then-health damage absorption
//! - Level-scaled experience and level-up growth
//! - Injectable dice for every random draw

mod dice;
mod item;
mod player;
mod property;

pub use dice::{Dice, RandomDice, ScriptedDice};
pub use item::{Item, ItemPool};
pub use player::{AttackOutcome, AttackReport, Player, XpGain};
pub use property::Property;
