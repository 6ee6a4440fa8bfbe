//! Combat Clock - advances every running encounter by elapsed time.
//!
//! Each tick works as follows:
//! 1. **Guard**: an encounter whose participant is already dead or gone is abandoned
//! 2. **Charge**: both cooldown timers advance by `dt`
//! 3. **Roll**: every side whose timer filled rolls its damage right away
//! 4. **Apply**: pending damage lands on both sides at once
//! 5. **Judge**: deaths are checked after both hits, so a mutual kill is possible
//! 6. **Prune**: finished encounters pay out rewards once and are removed
//!
//! Attack order inside a tick never matters: both rolls are made against the
//! state at the top of the tick.

mod encounter;

pub use encounter::*;

use dungeon_rules::mechanics::{flee_chance, roll_attack, roll_chance, AttackRoll};
use dungeon_rules::{Combatant, DungeonState, EntityId, EntityKind, Monster, Player, VertexId};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CombatConfig;
use crate::events::{EventSink, SimEvent};

/// What the clock hands back for each encounter it pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterReport {
    pub id: EncounterId,
    pub player: EntityId,
    pub monster: EntityId,
    pub vertex: VertexId,
    pub outcome: EncounterOutcome,
    pub exchanges: u32,
    /// Present only for the player's victory.
    pub rewards: Option<Rewards>,
}

/// Result of a flee attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FleeAttempt {
    pub escaped: bool,
    /// The probability that was rolled against.
    pub chance: f32,
    /// The monster's parting blow when the escape failed.
    pub free_hit: Option<AttackRoll>,
    /// Set when the attempt ended the encounter, either way.
    pub report: Option<EncounterReport>,
}

/// Owns every encounter and advances them in id order.
#[derive(Debug, Clone, Default)]
pub struct CombatClock {
    config: CombatConfig,
    encounters: BTreeMap<EncounterId, CombatEncounter>,
    next_id: u32,
}

impl CombatClock {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            encounters: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Start a fight between `player` and `monster`.
    ///
    /// A player already fighting gets their running encounter back. Returns
    /// `None` when either side is unknown or dead, or the monster is busy with
    /// someone else.
    pub fn start<R, S>(
        &mut self,
        state: &DungeonState,
        player: EntityId,
        monster: EntityId,
        vertex: VertexId,
        rng: &mut R,
        sink: &mut S,
    ) -> Option<EncounterId>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        if let Some(active) = self.active_for(player) {
            return Some(active.id);
        }
        let p = state.player(player)?;
        let m = state.monster(monster)?;
        if !p.is_alive() || !m.is_alive() || self.is_fighting(monster) {
            return None;
        }

        let id = EncounterId(self.next_id);
        self.next_id += 1;
        let mut encounter = CombatEncounter::new(id, p, m, vertex, &self.config);

        sink.emit(SimEvent::EncounterStarted {
            encounter: id,
            player,
            monster,
            vertex,
        });
        if roll_chance(m.surprise_attack_chance, rng) {
            encounter.charge_monster();
            sink.narrate(format!("{} ambushes {}!", m.display_name(), p.name));
        } else {
            sink.narrate(format!("{} confronts {}.", p.name, m.display_name()));
        }
        debug!("{id} started at {vertex}: {} vs {}", p.name, m.display_name());

        self.encounters.insert(id, encounter);
        Some(id)
    }

    /// The player's running encounter, if any.
    pub fn active_for(&self, player: EntityId) -> Option<&CombatEncounter> {
        self.encounters
            .values()
            .find(|e| e.player == player && !e.is_terminal())
    }

    /// Whether `entity` takes part in a running encounter.
    pub fn is_fighting(&self, entity: EntityId) -> bool {
        self.encounters
            .values()
            .any(|e| e.involves(entity) && !e.is_terminal())
    }

    pub fn encounter(&self, id: EncounterId) -> Option<&CombatEncounter> {
        self.encounters.get(&id)
    }

    pub fn encounters(&self) -> impl Iterator<Item = &CombatEncounter> {
        self.encounters.values()
    }

    pub fn len(&self) -> usize {
        self.encounters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encounters.is_empty()
    }

    /// Advance every encounter by `dt` seconds.
    ///
    /// Returns a report for each encounter that finished during this call;
    /// those encounters are no longer held by the clock.
    pub fn tick<R, S>(&mut self, dt: f32, state: &mut DungeonState, rng: &mut R, sink: &mut S) -> Vec<EncounterReport>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        let max_exchanges = self.config.max_exchanges;
        for encounter in self.encounters.values_mut() {
            if encounter.is_terminal() {
                continue;
            }
            let Some((player, monster)) = state.pair_mut(encounter.player, encounter.monster) else {
                encounter.finish(EncounterOutcome::Abandoned);
                continue;
            };
            if !player.is_alive() || !monster.is_alive() {
                encounter.finish(EncounterOutcome::Abandoned);
                continue;
            }

            let (player_ready, monster_ready) = encounter.advance(dt);
            let player_roll = player_ready.then(|| strike(&*player, &*monster, &mut *rng));
            let monster_roll = monster_ready.then(|| strike(&*monster, &*player, &mut *rng));

            // Both hits land before anyone is checked for death.
            if let Some(roll) = player_roll {
                monster.stats.take_damage(roll.damage);
                report_roll(sink, encounter.id, player.id, monster.id, roll);
            }
            if let Some(roll) = monster_roll {
                player.stats.take_damage(roll.damage);
                report_roll(sink, encounter.id, monster.id, player.id, roll);
            }

            let outcome = match (player.is_alive(), monster.is_alive()) {
                (false, false) => Some(EncounterOutcome::MutualKill),
                (true, false) => Some(EncounterOutcome::PlayerWon),
                (false, true) => Some(EncounterOutcome::MonsterWon),
                (true, true) if encounter.exchanges() >= max_exchanges => Some(EncounterOutcome::Draw),
                (true, true) => None,
            };
            if let Some(outcome) = outcome {
                encounter.finish(outcome);
            }
        }

        let finished: Vec<EncounterId> = self
            .encounters
            .values()
            .filter(|e| e.is_terminal())
            .map(|e| e.id)
            .collect();
        let mut reports = Vec::with_capacity(finished.len());
        for id in finished {
            reports.extend(self.conclude(id, state, rng, sink));
        }
        reports
    }

    /// Try to run from the player's current fight.
    ///
    /// Success ends the encounter as [`EncounterOutcome::Fled`]; failure gives
    /// the monster a free hit, which may kill the player. `None` when the
    /// player is not fighting.
    pub fn attempt_flee<R, S>(
        &mut self,
        player: EntityId,
        state: &mut DungeonState,
        rng: &mut R,
        sink: &mut S,
    ) -> Option<FleeAttempt>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        let id = self.active_for(player)?.id;
        let (chance, escaped, free_hit) = {
            let encounter = self.encounters.get_mut(&id)?;
            let (p, m) = state.pair_mut(encounter.player, encounter.monster)?;
            let chance = flee_chance(p.stats.speed, m.stats.speed);
            if roll_chance(chance, rng) {
                sink.narrate(format!("{} escapes from {}.", p.name, m.display_name()));
                encounter.finish(EncounterOutcome::Fled);
                (chance, true, None)
            } else {
                let roll = strike(&*m, &*p, rng);
                p.stats.take_damage(roll.damage);
                sink.narrate(format!("{} fails to escape.", p.name));
                report_roll(sink, id, m.id, p.id, roll);
                if !p.is_alive() {
                    encounter.finish(EncounterOutcome::MonsterWon);
                }
                (chance, false, Some(roll))
            }
        };

        let finished = self.encounters.get(&id).is_some_and(CombatEncounter::is_terminal);
        let report = if finished {
            self.conclude(id, state, rng, sink)
        } else {
            None
        };
        Some(FleeAttempt {
            escaped,
            chance,
            free_hit,
            report,
        })
    }

    /// Remove a finished encounter, pay out rewards once and report it.
    fn conclude<R, S>(&mut self, id: EncounterId, state: &mut DungeonState, rng: &mut R, sink: &mut S) -> Option<EncounterReport>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        let mut encounter = self.encounters.remove(&id)?;
        let outcome = encounter.outcome()?;

        let mut rewards = None;
        if encounter.claim_rewards() {
            if let Some((player, monster)) = state.pair_mut(encounter.player, encounter.monster) {
                let granted = grant_rewards(player, monster, rng);
                sink.narrate(format!(
                    "{} defeats {} and gains {} experience and {} gold.",
                    player.name,
                    monster.display_name(),
                    granted.experience,
                    granted.gold
                ));
                for level in &granted.levels_gained {
                    sink.emit(SimEvent::LevelUp {
                        player: player.id,
                        level: *level,
                    });
                }
                rewards = Some(granted);
            }
        }

        if outcome.player_died() {
            sink.emit(SimEvent::Death {
                who: encounter.player,
                kind: EntityKind::Player,
            });
        }
        if outcome.monster_died() {
            sink.emit(SimEvent::Death {
                who: encounter.monster,
                kind: EntityKind::Monster,
            });
        }
        if outcome == EncounterOutcome::MutualKill {
            sink.narrate("Both combatants fall at the same moment.");
        }
        sink.emit(SimEvent::EncounterEnded {
            encounter: id,
            outcome,
        });
        debug!("{id} ended: {outcome:?} after {} exchanges", encounter.exchanges());

        Some(EncounterReport {
            id,
            player: encounter.player,
            monster: encounter.monster,
            vertex: encounter.vertex,
            outcome,
            exchanges: encounter.exchanges(),
            rewards,
        })
    }
}

fn strike<R: Rng + ?Sized>(attacker: &dyn Combatant, defender: &dyn Combatant, rng: &mut R) -> AttackRoll {
    roll_attack(
        attacker.effective_attack(),
        defender.effective_defense(),
        attacker.stats().crit_chance,
        defender.stats().dodge_chance,
        rng,
    )
}

fn report_roll<S: EventSink>(sink: &mut S, encounter: EncounterId, attacker: EntityId, defender: EntityId, roll: AttackRoll) {
    if roll.dodged {
        sink.emit(SimEvent::Dodged {
            encounter,
            attacker,
            defender,
        });
    } else {
        sink.emit(SimEvent::DamageDealt {
            encounter,
            source: attacker,
            target: defender,
            amount: roll.damage,
            critical: roll.critical,
        });
    }
}

fn grant_rewards<R: Rng + ?Sized>(player: &mut Player, monster: &Monster, rng: &mut R) -> Rewards {
    let gold = monster.roll_gold(rng);
    let items = monster.roll_items(rng);
    player.add_gold(gold);
    for item in &items {
        player.inventory.add(item.clone(), 1);
    }
    player.monsters_killed += 1;
    let levels_gained = player.gain_experience(monster.exp_reward);
    Rewards {
        experience: monster.exp_reward,
        gold,
        items,
        levels_gained,
    }
}
