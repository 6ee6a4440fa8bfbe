//! Monster Behavior Controller - patrols, notices players, chases, engages.
//!
//! Every tick, per tracked monster:
//! 1. **Cleanup**: dead or vanished monsters are dropped
//! 2. **Notice**: an idle or patrolling monster starts chasing the nearest
//!    live player within vision range (weighted graph distance)
//! 3. **Retarget**: a chase whose target died picks another visible player,
//!    or holds position
//! 4. **Move**: once the move cooldown has elapsed, step one tunnel toward the
//!    chase target or the next patrol waypoint
//! 5. **Engage**: a chaser sharing a chamber with its target latches into
//!    engage and asks for an encounter, exactly once

mod state;

pub use state::*;

use dungeon_rules::pathfinding::dijkstra;
use dungeon_rules::{cooldown_for_speed, Combatant, DungeonGraph, DungeonState, EntityId, Monster, VertexId};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::BehaviorConfig;
use crate::events::{EventSink, SimEvent};

/// A chaser reached its target; the dispatcher should start a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRequest {
    pub monster: EntityId,
    pub player: EntityId,
    pub vertex: VertexId,
}

/// Owns the behavior state of every tracked monster.
#[derive(Debug, Clone, Default)]
pub struct BehaviorController {
    config: BehaviorConfig,
    tracked: Vec<MonsterBehaviorState>,
}

impl BehaviorController {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            tracked: Vec::new(),
        }
    }

    /// Turn every monster marker in the graph into a tracked monster.
    ///
    /// Markers without a live instance get a fresh [`Monster`] of their kind
    /// and level. Calling this again only picks up markers added since.
    /// Returns the newly tracked monsters.
    pub fn spawn_from_graph(&mut self, state: &mut DungeonState) -> Vec<EntityId> {
        let mut spawned = Vec::new();
        for vertex in state.graph.vertex_ids() {
            let Some(occupant) = state.graph.vertex(vertex).and_then(|v| v.occupant) else {
                continue;
            };
            let bound = occupant.monster.filter(|id| state.monsters.contains_key(id));
            let id = match bound {
                Some(id) if self.state(id).is_some() => continue,
                Some(id) => id,
                None => {
                    let id = state.add_monster(Monster::new(occupant.kind, occupant.level));
                    if let Some(marker) = state.graph.vertex_mut(vertex).and_then(|v| v.occupant.as_mut()) {
                        marker.monster = Some(id);
                    }
                    id
                }
            };
            if self.track(id, vertex, state) {
                spawned.push(id);
            }
        }
        debug!("tracking {} new monsters", spawned.len());
        spawned
    }

    /// Start tracking a rostered monster standing on `vertex`.
    ///
    /// Its patrol runs between `vertex` and its first open neighbor.
    pub fn track(&mut self, monster: EntityId, vertex: VertexId, state: &DungeonState) -> bool {
        if self.state(monster).is_some() {
            return false;
        }
        let Some(instance) = state.monster(monster) else {
            return false;
        };
        let mut waypoints = vec![vertex];
        if let Some((first, _)) = state.graph.neighbors(vertex, false).first() {
            waypoints.push(*first);
        }
        self.tracked.push(MonsterBehaviorState::new(
            monster,
            vertex,
            waypoints,
            self.config.vision_range,
            cooldown_for_speed(instance.stats.speed),
        ));
        true
    }

    pub fn state(&self, monster: EntityId) -> Option<&MonsterBehaviorState> {
        self.tracked.iter().find(|b| b.monster == monster)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &MonsterBehaviorState> {
        self.tracked.iter()
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// The tracked monster standing on `vertex`, if any.
    pub fn tracked_at(&self, vertex: VertexId) -> Option<EntityId> {
        self.tracked
            .iter()
            .find(|b| b.vertex == vertex)
            .map(|b| b.monster)
    }

    /// Latch a monster into engage against `player`, from any living mode.
    pub fn latch_engage<S: EventSink>(&mut self, monster: EntityId, player: EntityId, sink: &mut S) -> bool {
        let Some(behavior) = self.tracked.iter_mut().find(|b| b.monster == monster) else {
            return false;
        };
        transition(behavior, sink, |b| b.engage(player))
    }

    /// Forget a dead monster: back to idle, marker cleared, roster entry dropped.
    pub fn on_monster_death<S: EventSink>(&mut self, monster: EntityId, state: &mut DungeonState, sink: &mut S) -> bool {
        let vertex = match self.tracked.iter().position(|b| b.monster == monster) {
            Some(index) => {
                let mut behavior = self.tracked.remove(index);
                let from = behavior.mode();
                behavior.die();
                if from != BehaviorMode::Idle {
                    sink.emit(SimEvent::MonsterModeChanged {
                        monster,
                        from,
                        to: BehaviorMode::Idle,
                    });
                }
                Some(behavior.vertex)
            }
            None => state.vertex_of_monster(monster),
        };
        debug!("monster {monster} removed");
        state.remove_monster(monster, vertex).is_some()
    }

    /// Advance every tracked monster by `dt` seconds.
    ///
    /// Returns one request per monster that engaged a player this tick.
    pub fn tick<S: EventSink>(&mut self, dt: f32, state: &mut DungeonState, sink: &mut S) -> Vec<EncounterRequest> {
        let mut requests = Vec::new();
        let mut dead = Vec::new();
        for behavior in self.tracked.iter_mut() {
            let alive = state.monster(behavior.monster).is_some_and(|m| m.is_alive());
            if !alive {
                dead.push(behavior.monster);
                continue;
            }
            requests.extend(update(behavior, dt, state, sink));
        }
        for monster in dead {
            self.on_monster_death(monster, state, sink);
        }
        requests
    }
}

fn update<S: EventSink>(
    behavior: &mut MonsterBehaviorState,
    dt: f32,
    state: &mut DungeonState,
    sink: &mut S,
) -> Option<EncounterRequest> {
    match behavior.mode() {
        BehaviorMode::Engage => return None,
        BehaviorMode::Idle | BehaviorMode::Patrol => {
            if let Some(target) = nearest_visible_player(behavior, state) {
                transition(behavior, sink, |b| b.begin_chase(target));
            }
        }
        BehaviorMode::Chase => {
            let target_alive = behavior
                .target()
                .and_then(|t| state.player(t))
                .is_some_and(|p| p.is_alive());
            if !target_alive {
                let replacement = nearest_visible_player(behavior, state);
                if replacement.is_none() {
                    debug!("monster {} lost its target, holding at {}", behavior.monster, behavior.vertex);
                }
                behavior.retarget(replacement);
            }
        }
    }

    match behavior.mode() {
        BehaviorMode::Chase => {
            if let Some(request) = try_engage(behavior, state, sink) {
                return Some(request);
            }
            if !behavior.ready_to_move(dt) {
                return None;
            }
            let goal = behavior.target().and_then(|t| state.player(t)).map(|p| p.vertex)?;
            step_toward(behavior, goal, state, sink);
            try_engage(behavior, state, sink)
        }
        BehaviorMode::Patrol => {
            if behavior.ready_to_move(dt) {
                if let Some(destination) = behavior.patrol_destination() {
                    step_toward(behavior, destination, state, sink);
                }
            }
            None
        }
        BehaviorMode::Idle | BehaviorMode::Engage => None,
    }
}

/// Apply a state change and report it when the mode actually moved.
fn transition<S: EventSink>(
    behavior: &mut MonsterBehaviorState,
    sink: &mut S,
    change: impl FnOnce(&mut MonsterBehaviorState) -> bool,
) -> bool {
    let from = behavior.mode();
    if !change(behavior) {
        return false;
    }
    debug!("monster {} {:?} -> {:?}", behavior.monster, from, behavior.mode());
    sink.emit(SimEvent::MonsterModeChanged {
        monster: behavior.monster,
        from,
        to: behavior.mode(),
    });
    true
}

/// Closest live player within vision range, by weighted distance.
fn nearest_visible_player(behavior: &MonsterBehaviorState, state: &DungeonState) -> Option<EntityId> {
    let (distances, _) = dijkstra(&state.graph, behavior.vertex, None);
    state
        .living_players()
        .into_iter()
        .filter_map(|p| distances.get(&p.vertex).map(|d| (*d, p.id)))
        .filter(|(distance, _)| *distance <= behavior.vision_range)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, id)| id)
}

fn try_engage<S: EventSink>(
    behavior: &mut MonsterBehaviorState,
    state: &DungeonState,
    sink: &mut S,
) -> Option<EncounterRequest> {
    let target = behavior.target()?;
    let player = state.player(target)?;
    if player.vertex != behavior.vertex || !player.is_alive() {
        return None;
    }
    transition(behavior, sink, |b| b.engage(target)).then_some(EncounterRequest {
        monster: behavior.monster,
        player: target,
        vertex: behavior.vertex,
    })
}

/// Move one tunnel toward `goal`, carrying the graph marker along.
fn step_toward<S: EventSink>(behavior: &mut MonsterBehaviorState, goal: VertexId, state: &mut DungeonState, sink: &mut S) {
    let from = behavior.vertex;
    let Some(next) = next_step(&state.graph, from, goal) else {
        return;
    };
    if state.graph.move_occupant(from, next) {
        behavior.vertex = next;
        sink.emit(SimEvent::MonsterMoved {
            monster: behavior.monster,
            from,
            to: next,
        });
    }
}

/// The open neighbor of `from` that minimizes tunnel weight plus remaining
/// distance to `goal`. Chambers holding another monster are skipped; ties go
/// to the lower vertex id.
pub fn next_step(graph: &DungeonGraph, from: VertexId, goal: VertexId) -> Option<VertexId> {
    if from == goal {
        return None;
    }
    let (remaining, _) = dijkstra(graph, goal, None);
    graph
        .neighbors(from, false)
        .into_iter()
        .filter(|(next, _)| graph.vertex(*next).is_some_and(|v| !v.has_monster()))
        .filter_map(|(next, edge)| remaining.get(&next).map(|d| (edge.weight().saturating_add(*d), next)))
        .min()
        .map(|(_, next)| next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use dungeon_rules::{MonsterKind, Player, Position, TunnelKind};

    /// c0 - c1 - c2 - c3, unit weights.
    fn corridor() -> (DungeonState, [VertexId; 4]) {
        let mut graph = DungeonGraph::new();
        let ids: Vec<_> = (0..4)
            .map(|i| graph.add_vertex(format!("C{i}"), Position::new(i as f32, 0.0)))
            .collect();
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1], 1, TunnelKind::Normal);
        }
        (DungeonState::new(graph), [ids[0], ids[1], ids[2], ids[3]])
    }

    #[test]
    fn test_spawn_from_graph_is_idempotent() {
        let mut state = DungeonState::new(DungeonGraph::sample());
        state.graph.place_monster(VertexId(3), MonsterKind::Orc, 2);
        state.graph.place_monster(VertexId(5), MonsterKind::Slime, 1);
        let mut controller = BehaviorController::new(BehaviorConfig::default());

        let first = controller.spawn_from_graph(&mut state);
        assert_eq!(first.len(), 2);
        assert!(controller.spawn_from_graph(&mut state).is_empty());
        assert_eq!(state.monsters.len(), 2);

        let orc = state.monster_at(VertexId(3)).unwrap();
        assert_eq!(orc.level, 2);
        assert_eq!(controller.tracked_at(VertexId(3)), Some(orc.id));
        let patrol = controller.state(orc.id).unwrap();
        assert_eq!(patrol.mode(), BehaviorMode::Patrol);
        assert_eq!(patrol.waypoints()[0], VertexId(3));
        assert_eq!(patrol.waypoints().len(), 2);
    }

    #[test]
    fn test_chase_steps_toward_player() {
        let (mut state, [c0, c1, c2, c3]) = corridor();
        state.graph.place_monster(c3, MonsterKind::Goblin, 1);
        let hero = state.add_player(Player::new("Hero", c0));
        let mut controller = BehaviorController::new(BehaviorConfig::default());
        let monster = controller.spawn_from_graph(&mut state)[0];
        let mut sink = RecordingSink::new();

        assert!(controller.tick(2.0, &mut state, &mut sink).is_empty());
        assert_eq!(controller.state(monster).unwrap().mode(), BehaviorMode::Chase);
        assert_eq!(controller.tracked_at(c2), Some(monster));
        assert!(state.graph.vertex(c2).unwrap().has_monster());
        assert!(!state.graph.vertex(c3).unwrap().has_monster());

        assert!(controller.tick(2.0, &mut state, &mut sink).is_empty());
        assert_eq!(controller.tracked_at(c1), Some(monster));

        let requests = controller.tick(2.0, &mut state, &mut sink);
        assert_eq!(
            requests,
            vec![EncounterRequest {
                monster,
                player: hero,
                vertex: c0
            }]
        );
        assert_eq!(controller.state(monster).unwrap().mode(), BehaviorMode::Engage);
    }

    #[test]
    fn test_engage_is_latched() {
        let (mut state, [c0, c1, _, c3]) = corridor();
        state.graph.place_monster(c1, MonsterKind::Goblin, 1);
        let hero = state.add_player(Player::new("Hero", c0));
        let mut controller = BehaviorController::new(BehaviorConfig::default());
        let monster = controller.spawn_from_graph(&mut state)[0];
        let mut sink = RecordingSink::new();

        let mut requests = Vec::new();
        for _ in 0..3 {
            requests.extend(controller.tick(2.0, &mut state, &mut sink));
        }
        assert_eq!(requests.len(), 1);

        // The player walks off; the monster neither chases nor asks again.
        state.player_mut(hero).unwrap().vertex = c3;
        for _ in 0..5 {
            assert!(controller.tick(2.0, &mut state, &mut sink).is_empty());
            assert_eq!(controller.state(monster).unwrap().mode(), BehaviorMode::Engage);
        }

        let climbs: Vec<_> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::MonsterModeChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(climbs, vec![BehaviorMode::Chase, BehaviorMode::Engage]);
    }

    #[test]
    fn test_out_of_range_keeps_patrolling() {
        let (mut state, [c0, _, c2, c3]) = corridor();
        state.graph.place_monster(c3, MonsterKind::Goblin, 1);
        state.add_player(Player::new("Hero", c0));
        let mut controller = BehaviorController::new(BehaviorConfig { vision_range: 2 });
        let monster = controller.spawn_from_graph(&mut state)[0];
        let mut sink = RecordingSink::new();

        controller.tick(2.0, &mut state, &mut sink);
        // patrol c3 -> c2, which brings the hero at c0 into view
        assert_eq!(controller.tracked_at(c2), Some(monster));
        assert_eq!(controller.state(monster).unwrap().mode(), BehaviorMode::Patrol);
        controller.tick(2.0, &mut state, &mut sink);
        assert_eq!(controller.state(monster).unwrap().mode(), BehaviorMode::Chase);
    }

    #[test]
    fn test_dead_target_retargets_or_holds() {
        let (mut state, [c0, c1, c2, c3]) = corridor();
        state.graph.place_monster(c3, MonsterKind::Goblin, 1);
        let near = state.add_player(Player::new("Near", c2));
        let mut controller = BehaviorController::new(BehaviorConfig::default());
        let monster = controller.spawn_from_graph(&mut state)[0];
        let mut sink = RecordingSink::new();

        // First tick only notices: the move timer restarts on the chase.
        controller.tick(0.1, &mut state, &mut sink);
        assert_eq!(controller.state(monster).unwrap().target(), Some(near));

        state.player_mut(near).unwrap().stats.hp = 0;
        let far = state.add_player(Player::new("Far", c0));
        controller.tick(0.1, &mut state, &mut sink);
        assert_eq!(controller.state(monster).unwrap().target(), Some(far));

        state.player_mut(far).unwrap().stats.hp = 0;
        for _ in 0..3 {
            controller.tick(2.0, &mut state, &mut sink);
        }
        let held = controller.state(monster).unwrap();
        assert_eq!(held.mode(), BehaviorMode::Chase);
        assert!(held.target().is_none());
        assert_eq!(held.vertex, c3);
        assert!(controller.tracked_at(c1).is_none());
    }

    #[test]
    fn test_death_cleanup() {
        let (mut state, [c0, c1, ..]) = corridor();
        state.graph.place_monster(c1, MonsterKind::Goblin, 1);
        state.add_player(Player::new("Hero", c0));
        let mut controller = BehaviorController::new(BehaviorConfig::default());
        let monster = controller.spawn_from_graph(&mut state)[0];
        let mut sink = RecordingSink::new();
        controller.tick(0.1, &mut state, &mut sink);

        state.monster_mut(monster).unwrap().stats.hp = 0;
        controller.tick(0.1, &mut state, &mut sink);
        assert!(controller.is_empty());
        assert!(state.monster(monster).is_none());
        assert!(!state.graph.vertex(c1).unwrap().has_monster());
        assert!(matches!(
            sink.events().last(),
            Some(SimEvent::MonsterModeChanged {
                to: BehaviorMode::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_next_step_avoids_blocked_and_occupied() {
        let mut graph = DungeonGraph::new();
        let a = graph.add_vertex("A", Position::default());
        let b = graph.add_vertex("B", Position::default());
        let c = graph.add_vertex("C", Position::default());
        let d = graph.add_vertex("D", Position::default());
        let ab = graph.add_edge(a, b, 1, TunnelKind::Normal).unwrap();
        graph.add_edge(b, d, 1, TunnelKind::Normal);
        graph.add_edge(a, c, 2, TunnelKind::Normal);
        graph.add_edge(c, d, 2, TunnelKind::Normal);

        assert_eq!(next_step(&graph, a, d), Some(b));
        graph.place_monster(b, MonsterKind::Slime, 1);
        assert_eq!(next_step(&graph, a, d), Some(c));
        graph.clear_occupant(b);
        graph.block_edge(ab);
        assert_eq!(next_step(&graph, a, d), Some(c));
        assert_eq!(next_step(&graph, a, a), None);

        let island = graph.add_vertex("Island", Position::default());
        assert_eq!(next_step(&graph, a, island), None);
    }
}
