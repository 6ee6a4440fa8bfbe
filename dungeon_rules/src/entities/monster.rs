//! Monster species and their stat tables.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Combatant, CombatantStats, EntityId};
use crate::error::RulesError;

/// Every monster species the dungeon can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Goblin,
    Orc,
    CaveSpirit,
    StoneGolem,
    GiantBat,
    Slime,
}

/// Level 1 numbers for a species.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesProfile {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub surprise_attack_chance: f32,
    pub gold_reward: (u32, u32),
    pub exp_reward: u32,
    pub possible_drops: &'static [&'static str],
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 6] = [
        MonsterKind::Goblin,
        MonsterKind::Orc,
        MonsterKind::CaveSpirit,
        MonsterKind::StoneGolem,
        MonsterKind::GiantBat,
        MonsterKind::Slime,
    ];

    /// Snake-case tag used in map data.
    pub fn tag(&self) -> &'static str {
        match self {
            MonsterKind::Goblin => "goblin",
            MonsterKind::Orc => "orc",
            MonsterKind::CaveSpirit => "cave_spirit",
            MonsterKind::StoneGolem => "stone_golem",
            MonsterKind::GiantBat => "giant_bat",
            MonsterKind::Slime => "slime",
        }
    }

    /// Human-readable species name.
    pub fn title(&self) -> &'static str {
        match self {
            MonsterKind::Goblin => "Goblin",
            MonsterKind::Orc => "Orc",
            MonsterKind::CaveSpirit => "Cave Spirit",
            MonsterKind::StoneGolem => "Stone Golem",
            MonsterKind::GiantBat => "Giant Bat",
            MonsterKind::Slime => "Slime",
        }
    }

    pub fn profile(&self) -> SpeciesProfile {
        const COMMON_DROPS: &[&str] = &["potion", "key"];
        match self {
            MonsterKind::Goblin => SpeciesProfile {
                max_hp: 25,
                attack: 6,
                defense: 1,
                speed: 8,
                surprise_attack_chance: 0.25,
                gold_reward: (5, 15),
                exp_reward: 15,
                possible_drops: COMMON_DROPS,
            },
            MonsterKind::Orc => SpeciesProfile {
                max_hp: 50,
                attack: 12,
                defense: 5,
                speed: 3,
                surprise_attack_chance: 0.05,
                gold_reward: (20, 40),
                exp_reward: 35,
                possible_drops: COMMON_DROPS,
            },
            MonsterKind::CaveSpirit => SpeciesProfile {
                max_hp: 30,
                attack: 8,
                defense: 0,
                speed: 10,
                surprise_attack_chance: 0.3,
                gold_reward: (10, 25),
                exp_reward: 25,
                possible_drops: &["gem", "rune"],
            },
            MonsterKind::StoneGolem => SpeciesProfile {
                max_hp: 80,
                attack: 10,
                defense: 10,
                speed: 1,
                surprise_attack_chance: 0.0,
                gold_reward: (30, 60),
                exp_reward: 50,
                possible_drops: &["gem", "key", "armor_shard"],
            },
            MonsterKind::GiantBat => SpeciesProfile {
                max_hp: 20,
                attack: 7,
                defense: 1,
                speed: 12,
                surprise_attack_chance: 0.35,
                gold_reward: (5, 10),
                exp_reward: 12,
                possible_drops: COMMON_DROPS,
            },
            MonsterKind::Slime => SpeciesProfile {
                max_hp: 40,
                attack: 4,
                defense: 3,
                speed: 2,
                surprise_attack_chance: 0.0,
                gold_reward: (8, 20),
                exp_reward: 18,
                possible_drops: &["potion", "slime_core"],
            },
        }
    }
}

impl FromStr for MonsterKind {
    type Err = RulesError;

    /// Accepts the snake-case tag or the title, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let compact = normalized.replace('_', "");
        MonsterKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized || kind.tag().replace('_', "") == compact)
            .ok_or_else(|| RulesError::UnknownMonsterKind(s.to_string()))
    }
}

impl std::fmt::Display for MonsterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// A live monster instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub level: u32,
    pub stats: CombatantStats,
    pub surprise_attack_chance: f32,
    /// Inclusive gold range paid out on defeat.
    pub gold_reward: (u32, u32),
    pub exp_reward: u32,
    pub item_drop_chance: f32,
    pub possible_drops: Vec<String>,
}

impl Monster {
    /// Build a monster of `kind`, scaling stats and rewards by 30% per level above 1.
    pub fn new(kind: MonsterKind, level: u32) -> Self {
        let level = level.max(1);
        let profile = kind.profile();
        let multiplier = 1.0 + (level - 1) as f32 * 0.3;
        let scale_i = |v: i32| (v as f32 * multiplier) as i32;
        let scale_u = |v: u32| (v as f32 * multiplier) as u32;

        let stats = CombatantStats::new(
            scale_i(profile.max_hp),
            scale_i(profile.attack),
            scale_i(profile.defense),
            profile.speed,
        );

        Self {
            id: EntityId::new(),
            kind,
            level,
            stats,
            surprise_attack_chance: profile.surprise_attack_chance,
            gold_reward: (scale_u(profile.gold_reward.0), scale_u(profile.gold_reward.1)),
            exp_reward: scale_u(profile.exp_reward),
            item_drop_chance: 0.3,
            possible_drops: profile.possible_drops.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the combat stats.
    pub fn with_stats(mut self, stats: CombatantStats) -> Self {
        self.stats = stats;
        self
    }

    /// Roll the gold paid out on defeat.
    pub fn roll_gold<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let (low, high) = self.gold_reward;
        if high <= low {
            return low;
        }
        rng.gen_range(low..=high)
    }

    /// Roll item drops: at most one item from the drop list.
    pub fn roll_items<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        if self.possible_drops.is_empty() || rng.gen::<f32>() >= self.item_drop_chance {
            return Vec::new();
        }
        let pick = rng.gen_range(0..self.possible_drops.len());
        vec![self.possible_drops[pick].clone()]
    }
}

impl Combatant for Monster {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        format!("{} Lv{}", self.kind.title(), self.level)
    }

    fn stats(&self) -> &CombatantStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatantStats {
        &mut self.stats
    }
}
