//! Component definitions shared by players and monsters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::EntityId;

/// Shortest attack or move cooldown any combatant can have, in seconds.
pub const MIN_COOLDOWN: f32 = 0.4;

/// Derive an action cooldown (seconds) from a speed attribute.
///
/// Speed 10 gives a one second cooldown; faster combatants bottom out at
/// [`MIN_COOLDOWN`].
pub fn cooldown_for_speed(speed: i32) -> f32 {
    (1.5 - speed as f32 * 0.05).max(MIN_COOLDOWN)
}

/// Combat stats for players and monsters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantStats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    /// Probability (0.0 - 1.0) that an attack is a critical hit.
    pub crit_chance: f32,
    /// Probability (0.0 - 1.0) that an incoming attack misses.
    pub dodge_chance: f32,
    pub speed: i32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self::new(100, 10, 5, 10)
    }
}

impl CombatantStats {
    /// Create stats with full hp and a cooldown derived from `speed`.
    pub fn new(max_hp: i32, attack: i32, defense: i32, speed: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            attack,
            defense,
            crit_chance: 0.1,
            dodge_chance: 0.0,
            speed,
            attack_cooldown: cooldown_for_speed(speed),
        }
    }

    /// Set the critical hit chance.
    pub fn with_crit_chance(mut self, chance: f32) -> Self {
        self.crit_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the dodge chance.
    pub fn with_dodge_chance(mut self, chance: f32) -> Self {
        self.dodge_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtract `amount` hp, never going below zero. Returns hp actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).max(0);
        before - self.hp
    }

    /// Restore hp up to `max_hp`. Returns hp actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    /// Change speed and re-derive the attack cooldown.
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed;
        self.attack_cooldown = cooldown_for_speed(speed);
    }
}

/// The capability surface the combat clock needs from either side of a fight.
pub trait Combatant {
    fn id(&self) -> EntityId;
    fn display_name(&self) -> String;
    fn stats(&self) -> &CombatantStats;
    fn stats_mut(&mut self) -> &mut CombatantStats;

    fn effective_attack(&self) -> i32 {
        self.stats().attack.max(1)
    }

    fn effective_defense(&self) -> i32 {
        self.stats().defense.max(0)
    }

    fn is_alive(&self) -> bool {
        self.stats().is_alive()
    }
}

/// Item counters keyed by item name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Inventory {
    items: HashMap<String, u32>,
}

impl Inventory {
    pub fn add(&mut self, item: impl Into<String>, quantity: u32) {
        *self.items.entry(item.into()).or_default() += quantity;
    }

    /// Remove `quantity` of an item. Fails without changes if not enough are held.
    pub fn remove(&mut self, item: &str, quantity: u32) -> bool {
        match self.items.get_mut(item) {
            Some(held) if *held >= quantity => {
                *held -= quantity;
                if *held == 0 {
                    self.items.remove(item);
                }
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: &str, quantity: u32) -> bool {
        self.count(item) >= quantity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
