//! Items and the shared item pool

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::dice::Dice;

/// An attack-power modifier, fixed once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    prefix: String,
    attack_bonus: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, attack_bonus: u32) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            attack_bonus,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Article used when describing the item in combat ("a", "the", ...)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn attack_bonus(&self) -> u32 {
        self.attack_bonus
    }

    /// Long form with the prefix, e.g. "a sword +2"
    pub fn described(&self) -> String {
        format!("{} {} +{}", self.prefix, self.name, self.attack_bonus)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} +{}", self.name, self.attack_bonus)
    }
}

/// Handle to an ordered sequence of shared items
///
/// Clones alias the same sequence: an item pushed through one handle is
/// visible through every other. Use [`ItemPool::new`] for an independent
/// pool.
#[derive(Debug, Clone, Default)]
pub struct ItemPool {
    items: Arc<RwLock<Vec<Arc<Item>>>>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: Arc<Item>) {
        self.items.write().push(item);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Current contents in insertion order
    pub fn snapshot(&self) -> Vec<Arc<Item>> {
        self.items.read().clone()
    }

    /// Pick one item uniformly, if there are any
    pub fn pick(&self, dice: &mut dyn Dice) -> Option<Arc<Item>> {
        let items = self.items.read();
        if items.is_empty() {
            return None;
        }
        let index = dice.below(items.len() as u32) as usize;
        items.get(index).cloned()
    }

    /// Check whether both handles point at the same sequence
    pub fn shares(&self, other: &ItemPool) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}
