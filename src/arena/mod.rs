//! The arena: player registry, shared item pool and command dispatch
//!
//! Every inbound chat line goes through [`Arena::parse`], which returns the
//! reply to post back to the room. Nothing here fails: refusals are
//! ordinary replies and leave state untouched.

mod command;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::combat::{Dice, Item, ItemPool, Player, RandomDice};
use crate::config::ItemSeed;

pub use command::Command;

/// Starting AP/HP are drawn from `BASE_POINTS..BASE_POINTS + POINTS_SPREAD`
const BASE_POINTS: u32 = 5;
const POINTS_SPREAD: u32 = 5;

/// Starting attack is drawn from `BASE_ATTACK..BASE_ATTACK + ATTACK_SPREAD`
const BASE_ATTACK: u32 = 2;
const ATTACK_SPREAD: u32 = 3;

/// Rolled seed-item bonus is drawn from `1..=3`
const ITEM_BONUS_BASE: u32 = 1;
const ITEM_BONUS_SPREAD: u32 = 3;

/// Shared state of one arena
pub struct Arena {
    players: HashMap<String, Player>,
    items: ItemPool,
    dice: Box<dyn Dice>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Create an empty arena with OS-seeded dice
    pub fn new() -> Self {
        Self::with_dice(RandomDice::new())
    }

    /// Create an empty arena with reproducible dice
    pub fn seeded(seed: u64) -> Self {
        Self::with_dice(RandomDice::seeded(seed))
    }

    /// Create an empty arena drawing from `dice`
    pub fn with_dice(dice: impl Dice + 'static) -> Self {
        Self {
            players: HashMap::new(),
            items: ItemPool::new(),
            dice: Box::new(dice),
        }
    }

    /// Register a player unless the name is taken
    pub fn add_player(&mut self, player: Player) -> String {
        if self.players.contains_key(player.name()) {
            return format!("player {} already on the arena", player.name());
        }
        let reply = format!("player {} joins the arena", player.name());
        info!("{}", player);
        self.players.insert(player.name().to_string(), player);
        reply
    }

    /// Append an item to the shared pool
    pub fn add_item(&mut self, item: Item) -> String {
        let reply = format!("item {} added to the arena", item.name());
        debug!("added item {}", item.described());
        self.items.push(Arc::new(item));
        reply
    }

    /// Add a configured item, rolling its bonus if none is fixed
    pub fn add_seed_item(&mut self, seed: &ItemSeed) -> String {
        let bonus = match seed.attack_bonus {
            Some(bonus) => bonus,
            None => self.dice.offset(ITEM_BONUS_BASE, ITEM_BONUS_SPREAD),
        };
        self.add_item(Item::new(&seed.name, &seed.prefix, bonus))
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The shared pool every joining player aliases
    pub fn items(&self) -> &ItemPool {
        &self.items
    }

    /// Handle one command line from `author` and return the reply
    pub fn parse(&mut self, author: &str, text: &str) -> String {
        let command = Command::parse(text);
        debug!("{} -> {:?}", author, command);

        match command {
            Command::Join => self.join(author),
            Command::Attack { target } => self.attack(author, target),
            Command::Status => self.status(author),
            Command::Unknown(verb) => verb.to_string(),
        }
    }

    /// Create a player with rolled stats holding the shared item pool
    pub fn join(&mut self, author: &str) -> String {
        let ap = self.dice.offset(BASE_POINTS, POINTS_SPREAD);
        let hp = self.dice.offset(BASE_POINTS, POINTS_SPREAD);
        let attack = self.dice.offset(BASE_ATTACK, ATTACK_SPREAD);
        let player = Player::new(author, ap, hp, attack).with_items(self.items.clone());
        self.add_player(player)
    }

    /// `author` attacks `target`
    pub fn attack(&mut self, author: &str, target: Option<&str>) -> String {
        if !self.players.contains_key(author) {
            return not_joined(author);
        }
        let Some(target) = target else {
            return format!("{} needs a target: attack <name>", author);
        };

        if target == author {
            return match self.players.get_mut(author) {
                Some(player) => player.attack_self(self.dice.as_mut()).to_string(),
                None => not_joined(author),
            };
        }

        // Take the attacker out so both players can be borrowed mutably
        let Some(mut attacker) = self.players.remove(author) else {
            return not_joined(author);
        };
        let reply = match self.players.get_mut(target) {
            Some(defender) => attacker.attack(defender, self.dice.as_mut()).to_string(),
            // Reports the author, not the missing target
            None => format!("{} not in arena", author),
        };
        self.players.insert(author.to_string(), attacker);
        reply
    }

    /// Status line for `author`
    pub fn status(&self, author: &str) -> String {
        match self.players.get(author) {
            Some(player) => player.to_string(),
            None => not_joined(author),
        }
    }
}

fn not_joined(author: &str) -> String {
    format!("{} not in arena, please use the JOIN command first", author)
}
