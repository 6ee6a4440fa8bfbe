//! A single two-party fight and its timers.

use dungeon_rules::{cooldown_for_speed, EntityId, Monster, Player, VertexId, MIN_COOLDOWN};
use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;

/// Identifier of an encounter, assigned sequentially by the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EncounterId(pub u32);

impl std::fmt::Display for EncounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "encounter#{}", self.0)
    }
}

/// How an encounter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterOutcome {
    PlayerWon,
    MonsterWon,
    /// Both sides fell on the same tick. Nobody wins.
    MutualKill,
    /// The exchange budget ran out.
    Draw,
    /// The player escaped.
    Fled,
    /// A participant was already dead or gone when the tick began.
    Abandoned,
}

impl EncounterOutcome {
    pub fn monster_died(&self) -> bool {
        matches!(self, Self::PlayerWon | Self::MutualKill)
    }

    pub fn player_died(&self) -> bool {
        matches!(self, Self::MonsterWon | Self::MutualKill)
    }
}

/// Loot granted to the player for a win.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u32,
    pub gold: u32,
    pub items: Vec<String>,
    /// Levels reached through the experience, in order.
    pub levels_gained: Vec<u32>,
}

/// An ongoing or finished fight between one player and one monster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEncounter {
    pub id: EncounterId,
    pub player: EntityId,
    pub monster: EntityId,
    pub vertex: VertexId,

    player_cooldown: f32,
    monster_cooldown: f32,
    player_timer: f32,
    monster_timer: f32,

    exchanges: u32,
    elapsed: f32,
    outcome: Option<EncounterOutcome>,
    rewards_granted: bool,
}

impl CombatEncounter {
    pub fn new(id: EncounterId, player: &Player, monster: &Monster, vertex: VertexId, config: &CombatConfig) -> Self {
        let player_cooldown = player.stats.attack_cooldown.max(MIN_COOLDOWN);
        let monster_cooldown = cooldown_for_speed(monster.stats.speed);
        Self {
            id,
            player: player.id,
            monster: monster.id,
            vertex,
            player_cooldown,
            monster_cooldown,
            player_timer: player_cooldown * config.player_initial_charge.clamp(0.0, 1.0),
            monster_timer: monster_cooldown * config.monster_initial_charge.clamp(0.0, 1.0),
            exchanges: 0,
            elapsed: 0.0,
            outcome: None,
            rewards_granted: false,
        }
    }

    pub fn involves(&self, entity: EntityId) -> bool {
        self.player == entity || self.monster == entity
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    /// The winner's id. `None` while running and for mutual kills, draws and escapes.
    pub fn winner(&self) -> Option<EntityId> {
        match self.outcome? {
            EncounterOutcome::PlayerWon => Some(self.player),
            EncounterOutcome::MonsterWon => Some(self.monster),
            _ => None,
        }
    }

    /// Ticks on which at least one side attacked.
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Seconds of fighting so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn rewards_granted(&self) -> bool {
        self.rewards_granted
    }

    pub fn player_cooldown(&self) -> f32 {
        self.player_cooldown
    }

    pub fn monster_cooldown(&self) -> f32 {
        self.monster_cooldown
    }

    /// Fill the monster's timer so it strikes on the next tick.
    pub(crate) fn charge_monster(&mut self) {
        self.monster_timer = self.monster_cooldown;
    }

    /// Advance both timers. Returns which sides are ready to strike; a ready
    /// side's timer is reset.
    pub(crate) fn advance(&mut self, dt: f32) -> (bool, bool) {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.player_timer += dt;
        self.monster_timer += dt;

        let player_ready = self.player_timer >= self.player_cooldown;
        let monster_ready = self.monster_timer >= self.monster_cooldown;
        if player_ready {
            self.player_timer = 0.0;
        }
        if monster_ready {
            self.monster_timer = 0.0;
        }
        if player_ready || monster_ready {
            self.exchanges += 1;
        }
        (player_ready, monster_ready)
    }

    /// Record the outcome. The first outcome sticks.
    pub(crate) fn finish(&mut self, outcome: EncounterOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }

    /// Claim the one-time reward grant. `true` only on the first call after a
    /// player victory.
    pub(crate) fn claim_rewards(&mut self) -> bool {
        if self.rewards_granted || self.outcome != Some(EncounterOutcome::PlayerWon) {
            return false;
        }
        self.rewards_granted = true;
        true
    }
}
