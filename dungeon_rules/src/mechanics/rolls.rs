//! Random rolls used by combat and traversal.

use rand::Rng;

/// Result of one attack roll, before it is applied to anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    pub damage: i32,
    pub critical: bool,
    pub dodged: bool,
}

/// True with probability `chance` (clamped to 0.0 - 1.0).
pub fn roll_chance<R: Rng + ?Sized>(chance: f32, rng: &mut R) -> bool {
    rng.gen::<f32>() < chance.clamp(0.0, 1.0)
}

/// Damage dealt by `attack` against `defense`.
///
/// `max(1, attack - defense)` with a uniform +/-20% variance, doubled on a
/// critical hit. Never less than 1.
pub fn roll_damage<R: Rng + ?Sized>(attack: i32, defense: i32, critical: bool, rng: &mut R) -> i32 {
    let base = attack.saturating_sub(defense).max(1);
    let variance: f32 = rng.gen_range(0.8..=1.2);
    let mut damage = (base as f32 * variance) as i32;
    if critical {
        damage = damage.saturating_mul(2);
    }
    damage.max(1)
}

/// Roll a full attack: dodge first, then crit, then damage.
pub fn roll_attack<R: Rng + ?Sized>(
    attack: i32,
    defense: i32,
    crit_chance: f32,
    dodge_chance: f32,
    rng: &mut R,
) -> AttackRoll {
    if roll_chance(dodge_chance, rng) {
        return AttackRoll {
            damage: 0,
            critical: false,
            dodged: true,
        };
    }
    let critical = roll_chance(crit_chance, rng);
    AttackRoll {
        damage: roll_damage(attack, defense, critical, rng),
        critical,
        dodged: false,
    }
}

/// Probability of escaping a fight, from the speed ratio. Between 10% and 90%.
pub fn flee_chance(runner_speed: i32, chaser_speed: i32) -> f32 {
    let ratio = runner_speed.max(0) as f32 / chaser_speed.max(1) as f32;
    (0.5 * ratio).clamp(0.1, 0.9)
}
