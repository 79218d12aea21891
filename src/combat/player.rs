//! Players: damage absorption, experience and attacks

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::dice::Dice;
use super::item::{Item, ItemPool};
use super::property::Property;

/// Experience needed per level
const XP_PER_LEVEL: f64 = 10.0;

/// Level-up growth is drawn from `0..GROWTH_PER_LEVEL * new_level`
const GROWTH_PER_LEVEL: u32 = 5;

/// Result of [`Player::increase_xp`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpGain {
    /// Experience actually added after level scaling
    pub gained: f64,
    /// Whether a new level was reached
    pub leveled_up: bool,
}

/// A blow that landed
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub attacker: String,
    pub target: String,
    /// Raw hit rolled against the target
    pub hit: u32,
    /// Item that modified the swing, if any
    pub item: Option<Arc<Item>>,
    pub xp: XpGain,
}

/// What happened when one player attacked another
#[derive(Debug, Clone)]
pub enum AttackOutcome {
    /// Attacker has no HP left
    AttackerDown { attacker: String },
    /// Target has no HP left
    TargetDown { target: String },
    /// Target is too far above the attacker's level
    ExperienceGap { attacker: String, target: String },
    /// The attack went through
    Landed(AttackReport),
}

impl AttackOutcome {
    /// Whether any state changed
    pub fn landed(&self) -> bool {
        matches!(self, AttackOutcome::Landed(_))
    }
}

impl fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackOutcome::AttackerDown { attacker } => {
                write!(f, "{} has no HP, cannot attack", attacker)
            }
            AttackOutcome::TargetDown { target } => {
                write!(f, "{} has no HP, cannot be attacked", target)
            }
            AttackOutcome::ExperienceGap { attacker, target } => {
                write!(f, "{} cannot attack {}: big experience gap", attacker, target)
            }
            AttackOutcome::Landed(report) => {
                write!(
                    f,
                    "[Attack] {} hits {} for {} points ",
                    report.attacker, report.target, report.hit
                )?;
                if let Some(item) = &report.item {
                    write!(f, "with {} ", item.described())?;
                }
                write!(f, "earns {:.3}XP", report.xp.gained)?;
                if report.xp.leveled_up {
                    write!(f, " Level Up!!!")?;
                }
                Ok(())
            }
        }
    }
}

/// Item pick and hit roll for one swing, before anything is applied
struct Swing {
    item: Option<Arc<Item>>,
    hit: u32,
}

/// A combatant in the arena
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    ap: Property,
    hp: Property,
    base_attack: u32,
    level: u32,
    xp: f64,
    items: ItemPool,
}

impl Player {
    /// Create a level 1 player with full AP/HP and a private empty item pool
    pub fn new(name: impl Into<String>, ap: u32, hp: u32, base_attack: u32) -> Self {
        Self {
            name: name.into(),
            ap: Property::new("AP", ap),
            hp: Property::new("HP", hp),
            base_attack,
            level: 1,
            xp: 0.0,
            items: ItemPool::new(),
        }
    }

    /// Use `items` as this player's item collection (aliased, not copied)
    pub fn with_items(mut self, items: ItemPool) -> Self {
        self.items = items;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ap(&self) -> &Property {
        &self.ap
    }

    pub fn hp(&self) -> &Property {
        &self.hp
    }

    pub fn base_attack(&self) -> u32 {
        self.base_attack
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> f64 {
        self.xp
    }

    pub fn items(&self) -> &ItemPool {
        &self.items
    }

    /// Check if the player is out of HP
    pub fn is_down(&self) -> bool {
        self.hp.is_depleted()
    }

    /// Absorb a hit: AP soaks first, the overflow goes to HP.
    ///
    /// Returns `amount` unchanged, not the damage absorbed.
    pub fn hit(&mut self, amount: u32) -> u32 {
        let overflow = amount.saturating_sub(self.ap.current());
        self.ap.reduce(amount);
        self.hp.reduce(overflow);
        amount
    }

    /// Append an item to this player's collection.
    ///
    /// The collection may be shared (see [`Player::with_items`]), in which
    /// case every holder of the pool sees the new item.
    pub fn add_item(&mut self, item: Arc<Item>) {
        self.items.push(item);
    }

    /// Award experience for `raw` points dealt.
    ///
    /// The award shrinks by a factor of ten per level. Crossing into a new
    /// level grows both AP and HP maxima by a roll in `0..5 * new_level`
    /// and refills them.
    pub fn increase_xp(&mut self, raw: u32, dice: &mut dyn Dice) -> XpGain {
        let gained = f64::from(raw) * 10f64.powi(-(self.level as i32));
        self.xp += gained;

        let next_level = ((self.xp / XP_PER_LEVEL).floor() as u32 + 1).max(1);
        let leveled_up = next_level > self.level;
        if leveled_up {
            let bound = GROWTH_PER_LEVEL.saturating_mul(next_level);
            let hp_growth = dice.below(bound);
            self.hp.raise_max(hp_growth);
            let ap_growth = dice.below(bound);
            self.ap.raise_max(ap_growth);
            info!(
                "{} reached level {} (+{} HP, +{} AP)",
                self.name, next_level, hp_growth, ap_growth
            );
        }
        self.level = next_level;

        XpGain { gained, leveled_up }
    }

    /// Attack another player
    pub fn attack(&mut self, target: &mut Player, dice: &mut dyn Dice) -> AttackOutcome {
        if let Some(refused) = self.refusal(target) {
            return refused;
        }
        let swing = self.swing(dice);
        let dealt = target.hit(swing.hit);
        let xp = self.increase_xp(dealt, dice);
        self.report(target.name.clone(), swing, dealt, xp)
    }

    /// Attack yourself. Same rules as [`Player::attack`] with one player
    /// on both sides: damage lands before experience is awarded.
    pub fn attack_self(&mut self, dice: &mut dyn Dice) -> AttackOutcome {
        if let Some(refused) = self.refusal(self) {
            return refused;
        }
        let swing = self.swing(dice);
        let dealt = self.hit(swing.hit);
        let xp = self.increase_xp(dealt, dice);
        self.report(self.name.clone(), swing, dealt, xp)
    }

    /// Guard checks, in order: attacker down, target down, level gap
    fn refusal(&self, target: &Player) -> Option<AttackOutcome> {
        if self.is_down() {
            return Some(AttackOutcome::AttackerDown {
                attacker: self.name.clone(),
            });
        }
        if target.is_down() {
            return Some(AttackOutcome::TargetDown {
                target: target.name.clone(),
            });
        }
        // Only blocks targets more than twice the attacker's level
        let gap = i64::from(self.level) - i64::from(target.level);
        if gap < -i64::from(self.level) {
            return Some(AttackOutcome::ExperienceGap {
                attacker: self.name.clone(),
                target: target.name.clone(),
            });
        }
        None
    }

    fn swing(&self, dice: &mut dyn Dice) -> Swing {
        let item = self.items.pick(dice);
        let modifier = item.as_ref().map_or(0, |i| i.attack_bonus());
        let hit = dice.below(self.base_attack.saturating_add(modifier));
        Swing { item, hit }
    }

    fn report(&self, target: String, swing: Swing, dealt: u32, xp: XpGain) -> AttackOutcome {
        debug!(
            "{} hit {} for {} (item: {:?}, xp: {:.3})",
            self.name,
            target,
            dealt,
            swing.item.as_ref().map(|i| i.name()),
            xp.gained
        );
        AttackOutcome::Landed(AttackReport {
            attacker: self.name.clone(),
            target,
            hit: dealt,
            item: swing.item,
            xp,
        })
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Level {}) [{}] [{}] [XP:{:.1}]",
            self.name, self.level, self.ap, self.hp, self.xp
        )?;
        for item in self.items.snapshot() {
            write!(f, " {}", item)?;
        }
        Ok(())
    }
}
