//! Bounded numeric resources (action points, health points)

use std::fmt;

/// A current/max pair that never leaves `0..=max`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    current: u32,
    max: u32,
}

impl Property {
    /// Create a full property
    pub fn new(name: impl Into<String>, max: u32) -> Self {
        Self {
            name: name.into(),
            current: max,
            max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Check if nothing is left
    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Take `amount` away, stopping at zero
    pub fn reduce(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Grow the maximum and refill to it
    pub fn raise_max(&mut self, by: u32) {
        self.max = self.max.saturating_add(by);
        self.current = self.max;
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{}", self.name, self.current, self.max)
    }
}
