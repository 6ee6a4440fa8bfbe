//! The simulation context: one owner for the dungeon and every engine over it.

use std::collections::HashMap;

use dungeon_rules::pathfinding::{a_star, Route};
use dungeon_rules::{Combatant, DungeonGraph, DungeonState, EdgeId, EntityId, EntityKind, Player, TunnelKind, VertexId};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::behavior::BehaviorController;
use crate::combat::{CombatClock, EncounterId, EncounterReport, FleeAttempt};
use crate::config::SimConfig;
use crate::dispatcher::EncounterDispatcher;
use crate::events::{EventSink, NullSink, SimEvent};

/// Why a move was refused. A refused move changes nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("unknown player {0}")]
    UnknownPlayer(EntityId),

    #[error("player {0} is dead")]
    PlayerDead(EntityId),

    #[error("player is fighting ({0})")]
    InCombat(EncounterId),

    #[error("unknown tunnel {0}")]
    UnknownEdge(EdgeId),

    #[error("tunnel {edge} does not lead out of {vertex}")]
    NotAdjacent { edge: EdgeId, vertex: VertexId },

    #[error("tunnel {0} is blocked")]
    Blocked(EdgeId),

    #[error("tunnel {0} has not been discovered")]
    Undiscovered(EdgeId),

    #[error("not enough stamina: need {needed}, have {available}")]
    Exhausted { needed: u32, available: u32 },
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The player arrived; `encounter` is set when a fight started (or was
    /// already running) in the new chamber.
    Moved {
        from: VertexId,
        to: VertexId,
        encounter: Option<EncounterId>,
    },
    /// The tunnel caved in on the player, who stays put.
    Collapsed { edge: EdgeId, damage: i32 },
}

/// What one [`Simulation::tick`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// Encounters started because a chasing monster caught its target.
    pub started: Vec<EncounterId>,
    /// Encounters that finished and were pruned.
    pub finished: Vec<EncounterReport>,
}

/// Owns the dungeon state, the engines and the random source, and routes
/// every event to the sink.
#[derive(Debug)]
pub struct Simulation<S: EventSink = NullSink> {
    config: SimConfig,
    state: DungeonState,
    controller: BehaviorController,
    clock: CombatClock,
    dispatcher: EncounterDispatcher,
    rng: StdRng,
    sink: S,
}

impl Simulation<NullSink> {
    /// A simulation that discards its events.
    pub fn headless(graph: DungeonGraph, config: SimConfig) -> Self {
        Self::new(graph, config, NullSink)
    }
}

impl<S: EventSink> Simulation<S> {
    /// Build a simulation over `graph`. Monster markers already in the graph
    /// become tracked monsters.
    pub fn new(graph: DungeonGraph, config: SimConfig, sink: S) -> Self {
        Self::from_state(DungeonState::new(graph), config, sink)
    }

    pub fn from_state(state: DungeonState, config: SimConfig, sink: S) -> Self {
        let mut simulation = Self {
            controller: BehaviorController::new(config.behavior.clone()),
            clock: CombatClock::new(config.combat.clone()),
            dispatcher: EncounterDispatcher::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            state,
            sink,
        };
        simulation.spawn_tracked_monsters();
        simulation
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &DungeonState {
        &self.state
    }

    pub fn graph(&self) -> &DungeonGraph {
        &self.state.graph
    }

    /// Direct graph access for rule-layer mutations.
    pub fn graph_mut(&mut self) -> &mut DungeonGraph {
        &mut self.state.graph
    }

    pub fn controller(&self) -> &BehaviorController {
        &self.controller
    }

    pub fn clock(&self) -> &CombatClock {
        &self.clock
    }

    pub fn dispatcher(&self) -> &EncounterDispatcher {
        &self.dispatcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.state.player(id)
    }

    /// Track any monster markers added to the graph since the last call.
    pub fn spawn_tracked_monsters(&mut self) -> Vec<EntityId> {
        self.controller.spawn_from_graph(&mut self.state)
    }

    /// Scatter monsters and resources over unexplored chambers, price the
    /// tunnels and start tracking the new monsters.
    pub fn populate(&mut self, monster_probability: f32, resource_probability: f32) -> Vec<EntityId> {
        self.state
            .graph
            .spawn_random_monsters(monster_probability, &[], &mut self.rng);
        self.state
            .graph
            .add_random_resources(resource_probability, &mut self.rng);
        let levels: HashMap<VertexId, u32> = self
            .state
            .graph
            .vertices()
            .filter_map(|v| v.occupant.map(|o| (v.id, o.level)))
            .collect();
        self.state.graph.configure_stamina_costs(&levels);
        self.spawn_tracked_monsters()
    }

    /// Place a new player on `vertex` (marked explored). `None` for an unknown vertex.
    pub fn add_player(&mut self, name: impl Into<String>, vertex: VertexId) -> Option<EntityId> {
        let chamber = self.state.graph.vertex_mut(vertex)?;
        chamber.explored = true;
        let id = self.state.add_player(Player::new(name, vertex));
        debug!("player {id} entered at {vertex}");
        Some(id)
    }

    /// Walk a player through `edge`.
    ///
    /// The tunnel must lead out of the player's chamber and be open. Walking
    /// costs stamina per point of weight and rolls the tunnel's collapse
    /// chance; a collapse hurts the player and cancels the move. On arrival the
    /// chamber is explored, its resources are picked up and any monster there
    /// is engaged.
    pub fn move_player(&mut self, player: EntityId, edge: EdgeId) -> Result<MoveOutcome, MoveError> {
        let walker = self.state.player(player).ok_or(MoveError::UnknownPlayer(player))?;
        if !walker.is_alive() {
            return Err(MoveError::PlayerDead(player));
        }
        if let Some(active) = self.clock.active_for(player) {
            return Err(MoveError::InCombat(active.id));
        }
        let from = walker.vertex;
        let available = walker.stamina;

        let tunnel = self.state.graph.edge(edge).ok_or(MoveError::UnknownEdge(edge))?;
        let to = tunnel
            .other(from)
            .ok_or(MoveError::NotAdjacent { edge, vertex: from })?;
        if tunnel.blocked {
            return Err(MoveError::Blocked(edge));
        }
        if !tunnel.discovered {
            return Err(MoveError::Undiscovered(edge));
        }
        let weight = tunnel.weight();
        let needed = weight.saturating_mul(self.config.traversal.stamina_per_weight);
        if available < needed {
            return Err(MoveError::Exhausted { needed, available });
        }

        if let Some(walker) = self.state.player_mut(player) {
            walker.consume_stamina(needed);
        }

        if self.state.graph.attempt_collapse(edge, &mut self.rng) {
            let (low, high) = self.config.traversal.collapse_damage;
            let damage = self.rng.gen_range(low..=high.max(low));
            self.sink.emit(SimEvent::EdgeCollapsed { edge });
            if let Some(walker) = self.state.player_mut(player) {
                walker.stats.take_damage(damage);
                self.sink
                    .narrate(format!("The tunnel caves in on {} for {damage} damage!", walker.name));
                if !walker.is_alive() {
                    self.sink.emit(SimEvent::Death {
                        who: player,
                        kind: EntityKind::Player,
                    });
                }
            }
            return Ok(MoveOutcome::Collapsed { edge, damage });
        }

        let loot = match self.state.graph.vertex_mut(to) {
            Some(chamber) => {
                chamber.explored = true;
                let mut loot: Vec<(String, u32)> = chamber.resources.drain().collect();
                loot.sort();
                loot
            }
            None => Vec::new(),
        };
        if let Some(walker) = self.state.player_mut(player) {
            walker.vertex = to;
            walker.distance_traveled += weight;
            for (resource, amount) in loot {
                self.sink.narrate(format!("{} picks up {amount} {resource}.", walker.name));
                if resource == "gold" {
                    walker.add_gold(amount);
                } else {
                    walker.inventory.add(resource, amount);
                }
            }
        }
        self.sink.emit(SimEvent::PlayerMoved { player, from, to });

        let encounter = self.dispatcher.on_player_entered_vertex(
            player,
            to,
            &mut self.state,
            &mut self.controller,
            &mut self.clock,
            &mut self.rng,
            &mut self.sink,
        );
        Ok(MoveOutcome::Moved { from, to, encounter })
    }

    /// Reveal undiscovered secret passages leading out of the player's chamber.
    pub fn search_for_passages(&mut self, player: EntityId) -> Vec<EdgeId> {
        let Some(vertex) = self.state.player(player).map(|p| p.vertex) else {
            return Vec::new();
        };
        let hidden: Vec<EdgeId> = self
            .state
            .graph
            .edges_of(vertex)
            .into_iter()
            .filter(|e| e.kind() == TunnelKind::Secret && !e.discovered)
            .map(|e| e.id)
            .collect();
        for id in &hidden {
            if let Some(edge) = self.state.graph.edge_mut(*id) {
                edge.discovered = true;
            }
        }
        if !hidden.is_empty() {
            self.sink.narrate("A hidden passage is revealed.");
        }
        hidden
    }

    /// Advance the world by `dt` seconds: monsters act, caught players are
    /// pulled into fights, every fight advances, and the dead are cleared.
    pub fn tick(&mut self, dt: f32) -> TickSummary {
        let mut summary = TickSummary::default();

        let requests = self.controller.tick(dt, &mut self.state, &mut self.sink);
        for request in requests {
            let started = self.dispatcher.on_request(
                request,
                &mut self.state,
                &mut self.controller,
                &mut self.clock,
                &mut self.rng,
                &mut self.sink,
            );
            if let Some(id) = started.filter(|id| !summary.started.contains(id)) {
                summary.started.push(id);
            }
        }

        summary.finished = self
            .clock
            .tick(dt, &mut self.state, &mut self.rng, &mut self.sink);
        self.clear_fallen(&summary.finished);
        summary
    }

    /// Try to run from the player's current fight.
    pub fn attempt_flee(&mut self, player: EntityId) -> Option<FleeAttempt> {
        let attempt = self
            .clock
            .attempt_flee(player, &mut self.state, &mut self.rng, &mut self.sink)?;
        if let Some(report) = &attempt.report {
            self.clear_fallen(std::slice::from_ref(report));
        }
        Some(attempt)
    }

    /// Roll one tunnel's collapse chance.
    pub fn attempt_collapse(&mut self, edge: EdgeId) -> bool {
        let collapsed = self.state.graph.attempt_collapse(edge, &mut self.rng);
        if collapsed {
            self.sink.emit(SimEvent::EdgeCollapsed { edge });
        }
        collapsed
    }

    /// Independently collapse each open unstable tunnel with `probability`.
    pub fn trigger_random_collapse(&mut self, probability: f32) -> Vec<EdgeId> {
        let collapsed = self
            .state
            .graph
            .trigger_random_collapse(probability, &mut self.rng);
        for edge in &collapsed {
            self.sink.emit(SimEvent::EdgeCollapsed { edge: *edge });
        }
        if !collapsed.is_empty() {
            self.sink.narrate("The ground shakes and tunnels cave in.");
        }
        collapsed
    }

    /// Cheapest open route between two chambers.
    pub fn route(&self, from: VertexId, to: VertexId) -> Route {
        a_star(&self.state.graph, from, to)
    }

    /// Remove monsters that did not survive their encounter.
    fn clear_fallen(&mut self, reports: &[EncounterReport]) {
        for report in reports {
            let fallen = self
                .state
                .monster(report.monster)
                .is_some_and(|m| !m.is_alive());
            if fallen {
                self.controller
                    .on_monster_death(report.monster, &mut self.state, &mut self.sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use dungeon_rules::MonsterKind;

    fn sample() -> Simulation<RecordingSink> {
        Simulation::new(DungeonGraph::sample(), SimConfig::default(), RecordingSink::new())
    }

    #[test]
    fn test_move_collects_resources() {
        let mut sim = sample();
        let hero = sim.add_player("Hero", VertexId(0)).unwrap();

        let outcome = sim.move_player(hero, EdgeId(0)).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: VertexId(0),
                to: VertexId(1),
                encounter: None
            }
        );
        let player = sim.player(hero).unwrap();
        assert_eq!(player.vertex, VertexId(1));
        assert_eq!(player.gold, 10);
        assert_eq!(player.stamina, 100 - 3 * 2);
        assert_eq!(player.distance_traveled, 3);

        let chamber = sim.graph().vertex(VertexId(1)).unwrap();
        assert!(chamber.explored);
        assert!(chamber.resources.is_empty());
        assert!(sim.sink().events().contains(&SimEvent::PlayerMoved {
            player: hero,
            from: VertexId(0),
            to: VertexId(1)
        }));
    }

    #[test]
    fn test_refused_moves() {
        let mut sim = sample();
        let hero = sim.add_player("Hero", VertexId(0)).unwrap();
        let stranger = EntityId::new();

        assert_eq!(sim.move_player(stranger, EdgeId(0)), Err(MoveError::UnknownPlayer(stranger)));
        assert_eq!(sim.move_player(hero, EdgeId(99)), Err(MoveError::UnknownEdge(EdgeId(99))));
        assert_eq!(
            sim.move_player(hero, EdgeId(2)),
            Err(MoveError::NotAdjacent {
                edge: EdgeId(2),
                vertex: VertexId(0)
            })
        );

        sim.graph_mut().block_edge(EdgeId(0));
        assert_eq!(sim.move_player(hero, EdgeId(0)), Err(MoveError::Blocked(EdgeId(0))));

        sim.state.player_mut(hero).unwrap().stamina = 7;
        assert_eq!(
            sim.move_player(hero, EdgeId(1)),
            Err(MoveError::Exhausted { needed: 8, available: 7 })
        );

        sim.state.player_mut(hero).unwrap().stats.hp = 0;
        assert_eq!(sim.move_player(hero, EdgeId(1)), Err(MoveError::PlayerDead(hero)));

        // nothing changed along the way
        let player = sim.player(hero).unwrap();
        assert_eq!(player.vertex, VertexId(0));
        assert_eq!(player.stamina, 7);
        assert!(sim.sink().is_empty());
    }

    #[test]
    fn test_secret_passage_must_be_found() {
        let mut sim = sample();
        let hero = sim.add_player("Hero", VertexId(3)).unwrap();

        assert_eq!(sim.move_player(hero, EdgeId(6)), Err(MoveError::Undiscovered(EdgeId(6))));
        assert_eq!(sim.search_for_passages(hero), vec![EdgeId(6)]);
        assert!(sim.search_for_passages(hero).is_empty());

        let outcome = sim.move_player(hero, EdgeId(6)).unwrap();
        assert!(matches!(outcome, MoveOutcome::Moved { to: VertexId(6), .. }));
    }

    #[test]
    fn test_entering_a_lair_starts_a_fight() {
        let mut graph = DungeonGraph::sample();
        graph.place_monster(VertexId(2), MonsterKind::Slime, 1);
        let mut sim = Simulation::new(graph, SimConfig::default(), RecordingSink::new());
        assert_eq!(sim.controller().len(), 1);
        let hero = sim.add_player("Hero", VertexId(0)).unwrap();

        let encounter = match sim.move_player(hero, EdgeId(1)).unwrap() {
            MoveOutcome::Moved { encounter, .. } => encounter.unwrap(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(sim.clock().active_for(hero).map(|e| e.id), Some(encounter));
        assert_eq!(sim.move_player(hero, EdgeId(1)), Err(MoveError::InCombat(encounter)));
    }

    #[test]
    fn test_traversal_collapse_hurts_and_blocks() {
        // Weakened unstable tunnel: 0.55 per traversal.
        let collapsed = (0..64).find_map(|seed| {
            let config = SimConfig {
                seed,
                ..SimConfig::default()
            };
            let mut sim = Simulation::new(DungeonGraph::sample(), config, RecordingSink::new());
            sim.graph_mut().damage_stability(EdgeId(2), 100);
            sim.graph_mut().add_fissures(EdgeId(2));
            let hero = sim.add_player("Hero", VertexId(1))?;
            match sim.move_player(hero, EdgeId(2)) {
                Ok(MoveOutcome::Collapsed { damage, .. }) => Some((sim, hero, damage)),
                _ => None,
            }
        });
        let (sim, hero, damage) = collapsed.expect("some seed collapses the tunnel");

        assert!((15..=30).contains(&damage));
        let player = sim.player(hero).unwrap();
        assert_eq!(player.vertex, VertexId(1));
        assert_eq!(player.stats.hp, 100 - damage);
        let edge = sim.graph().edge(EdgeId(2)).unwrap();
        assert!(edge.blocked);
        assert_eq!(edge.kind(), TunnelKind::Collapsed);
        assert!(sim.sink().events().contains(&SimEvent::EdgeCollapsed { edge: EdgeId(2) }));
    }

    #[test]
    fn test_random_collapse_reports_edges() {
        let mut sim = sample();
        let collapsed = sim.trigger_random_collapse(1.0);
        assert_eq!(collapsed, vec![EdgeId(2), EdgeId(8)]);
        let reported = sim
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::EdgeCollapsed { .. }))
            .count();
        assert_eq!(reported, 2);
        assert!(sim.route(VertexId(1), VertexId(3)).is_reachable());
        assert_eq!(sim.route(VertexId(1), VertexId(3)).cost, 8.0);
    }

    #[test]
    fn test_populate_tracks_new_monsters() {
        let mut sim = sample();
        let spawned = sim.populate(1.0, 0.0);
        // every chamber except the two entrances
        assert_eq!(spawned.len(), 5);
        assert_eq!(sim.controller().len(), 5);
        assert_eq!(sim.state().monsters.len(), 5);
        assert!(sim.populate(1.0, 0.0).is_empty());
    }

    #[test]
    fn test_monster_victory_keeps_the_monster_engaged() {
        let mut state = DungeonState::new(DungeonGraph::sample());
        state.graph.place_monster(VertexId(2), MonsterKind::Orc, 1);
        let mut orc = dungeon_rules::Monster::new(MonsterKind::Orc, 1)
            .with_stats(dungeon_rules::CombatantStats::new(100, 60, 0, 10).with_crit_chance(0.0));
        orc.surprise_attack_chance = 0.0;
        let orc = state.add_monster(orc);
        if let Some(marker) = state.graph.vertex_mut(VertexId(2)).and_then(|v| v.occupant.as_mut()) {
            marker.monster = Some(orc);
        }
        let hero = state.add_player(Player::new("Hero", VertexId(0)).with_stats(dungeon_rules::CombatantStats::new(5, 1, 0, 10)));
        let mut sim = Simulation::from_state(state, SimConfig::default(), RecordingSink::new());

        assert!(matches!(
            sim.move_player(hero, EdgeId(1)),
            Ok(MoveOutcome::Moved { encounter: Some(_), .. })
        ));
        let mut finished = Vec::new();
        for _ in 0..10 {
            finished.extend(sim.tick(0.5).finished);
            if !finished.is_empty() {
                break;
            }
        }
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].outcome, crate::combat::EncounterOutcome::MonsterWon);
        assert!(finished[0].rewards.is_none());

        let behavior = sim.controller().state(orc).unwrap();
        assert_eq!(behavior.mode(), crate::behavior::BehaviorMode::Engage);
        assert_eq!(sim.state().monster_at(VertexId(2)).map(|m| m.id), Some(orc));
        let player_deaths = sim
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::Death { kind: EntityKind::Player, .. }))
            .count();
        assert_eq!(player_deaths, 1);

        // latched: later ticks neither move it nor start anything
        let summary = sim.tick(5.0);
        assert!(summary.started.is_empty());
        assert_eq!(sim.controller().state(orc).unwrap().vertex, VertexId(2));
    }
}
