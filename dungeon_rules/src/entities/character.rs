//! Player character definitions.

use serde::{Deserialize, Serialize};

use super::{Combatant, CombatantStats, EntityId, Inventory};
use crate::graph::VertexId;

/// Experience needed for the first level-up.
const FIRST_LEVEL_EXPERIENCE: u32 = 100;

/// A player exploring the dungeon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub name: String,
    /// Vertex the player currently stands on.
    pub vertex: VertexId,

    pub stats: CombatantStats,
    pub stamina: u32,
    pub max_stamina: u32,

    // Progression
    pub level: u32,
    pub experience: u32,
    pub experience_to_next_level: u32,

    pub gold: u32,
    pub inventory: Inventory,

    // Statistics
    pub monsters_killed: u32,
    pub distance_traveled: u32,
}

impl Player {
    /// Create a level 1 player standing on `vertex`.
    pub fn new(name: impl Into<String>, vertex: VertexId) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            vertex,
            stats: CombatantStats::new(100, 10, 5, 10).with_dodge_chance(0.1),
            stamina: 100,
            max_stamina: 100,
            level: 1,
            experience: 0,
            experience_to_next_level: FIRST_LEVEL_EXPERIENCE,
            gold: 0,
            inventory: Inventory::default(),
            monsters_killed: 0,
            distance_traveled: 0,
        }
    }

    /// Replace the combat stats.
    pub fn with_stats(mut self, stats: CombatantStats) -> Self {
        self.stats = stats;
        self
    }

    /// Add experience, levelling up as many times as it allows.
    ///
    /// Returns the levels reached, in order.
    pub fn gain_experience(&mut self, amount: u32) -> Vec<u32> {
        let mut reached = Vec::new();
        self.experience += amount;
        while self.experience >= self.experience_to_next_level {
            self.level_up();
            reached.push(self.level);
        }
        reached
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.experience -= self.experience_to_next_level;
        self.experience_to_next_level = self.experience_to_next_level * 3 / 2;

        // Full heal on level up
        self.stats.max_hp += 10;
        self.stats.hp = self.stats.max_hp;
        self.stats.attack += 2;
        self.stats.defense += 1;
        self.max_stamina += 10;
        self.stamina = self.max_stamina;
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold += amount;
    }

    /// Spend gold if enough is held.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.gold >= amount {
            self.gold -= amount;
            true
        } else {
            false
        }
    }

    /// Spend stamina if enough is held.
    pub fn consume_stamina(&mut self, amount: u32) -> bool {
        if self.stamina >= amount {
            self.stamina -= amount;
            true
        } else {
            false
        }
    }

    pub fn restore_stamina(&mut self, amount: u32) -> u32 {
        let before = self.stamina;
        self.stamina = (self.stamina + amount).min(self.max_stamina);
        self.stamina - before
    }
}

impl Combatant for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn stats(&self) -> &CombatantStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatantStats {
        &mut self.stats
    }
}
