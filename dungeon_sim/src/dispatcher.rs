//! Encounter Dispatcher - turns "a player met a monster" into a fight.

use dungeon_rules::{Combatant, DungeonState, EntityId, Monster, VertexId};
use log::debug;
use rand::Rng;

use crate::behavior::{BehaviorController, EncounterRequest};
use crate::combat::{CombatClock, EncounterId};
use crate::events::EventSink;

/// Starts encounters and suppresses duplicates.
///
/// A player with a running encounter always gets that encounter back, so a
/// player never fights two monsters at once.
#[derive(Debug, Clone, Default)]
pub struct EncounterDispatcher {
    started: u32,
    suppressed: u32,
}

impl EncounterDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encounters this dispatcher started.
    pub fn started(&self) -> u32 {
        self.started
    }

    /// Start requests answered with an already running encounter.
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    /// A player stepped into `vertex`.
    ///
    /// Returns the player's running encounter unchanged if there is one.
    /// Otherwise the chamber's monster is resolved (the tracked instance, then
    /// an instance already bound to the marker, then a fresh monster of the
    /// marker's kind at the player's level) and a fight starts. `None` when the
    /// chamber is empty, the player is unknown or dead, or the monster is busy.
    #[allow(clippy::too_many_arguments)]
    pub fn on_player_entered_vertex<R, S>(
        &mut self,
        player: EntityId,
        vertex: VertexId,
        state: &mut DungeonState,
        controller: &mut BehaviorController,
        clock: &mut CombatClock,
        rng: &mut R,
        sink: &mut S,
    ) -> Option<EncounterId>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        if let Some(active) = clock.active_for(player) {
            self.suppressed += 1;
            return Some(active.id);
        }
        let level = state.player(player).filter(|p| p.is_alive())?.level;
        let occupant = state.graph.vertex(vertex)?.occupant?;

        let monster = match resolve_monster(vertex, state, controller) {
            Some(id) => id,
            None => {
                let id = state.add_monster(Monster::new(occupant.kind, level));
                if let Some(marker) = state.graph.vertex_mut(vertex).and_then(|v| v.occupant.as_mut()) {
                    marker.monster = Some(id);
                }
                debug!("spawned a level {level} {} at {vertex}", occupant.kind.tag());
                id
            }
        };
        self.begin(player, monster, vertex, state, controller, clock, rng, sink)
    }

    /// Honor a chaser's request.
    #[allow(clippy::too_many_arguments)]
    pub fn on_request<R, S>(
        &mut self,
        request: EncounterRequest,
        state: &mut DungeonState,
        controller: &mut BehaviorController,
        clock: &mut CombatClock,
        rng: &mut R,
        sink: &mut S,
    ) -> Option<EncounterId>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        if let Some(active) = clock.active_for(request.player) {
            self.suppressed += 1;
            return Some(active.id);
        }
        self.begin(request.player, request.monster, request.vertex, state, controller, clock, rng, sink)
    }

    #[allow(clippy::too_many_arguments)]
    fn begin<R, S>(
        &mut self,
        player: EntityId,
        monster: EntityId,
        vertex: VertexId,
        state: &mut DungeonState,
        controller: &mut BehaviorController,
        clock: &mut CombatClock,
        rng: &mut R,
        sink: &mut S,
    ) -> Option<EncounterId>
    where
        R: Rng + ?Sized,
        S: EventSink,
    {
        if clock.is_fighting(monster) {
            debug!("monster {monster} is busy");
            return None;
        }
        let id = clock.start(state, player, monster, vertex, rng, sink)?;
        self.started += 1;
        controller.latch_engage(monster, player, sink);
        Some(id)
    }
}

/// The live monster for a chamber: tracked first, then whatever the marker is bound to.
fn resolve_monster(vertex: VertexId, state: &DungeonState, controller: &BehaviorController) -> Option<EntityId> {
    let alive = |id: &EntityId| state.monster(*id).is_some_and(|m| m.is_alive());
    controller
        .tracked_at(vertex)
        .filter(alive)
        .or_else(|| state.monster_at(vertex).map(|m| m.id).filter(alive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorMode;
    use crate::config::{BehaviorConfig, CombatConfig};
    use crate::events::RecordingSink;
    use dungeon_rules::{DungeonGraph, MonsterKind, Player};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        state: DungeonState,
        controller: BehaviorController,
        clock: CombatClock,
        dispatcher: EncounterDispatcher,
        rng: StdRng,
        sink: RecordingSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state: DungeonState::new(DungeonGraph::sample()),
                controller: BehaviorController::new(BehaviorConfig::default()),
                clock: CombatClock::new(CombatConfig::default()),
                dispatcher: EncounterDispatcher::new(),
                rng: StdRng::seed_from_u64(9),
                sink: RecordingSink::new(),
            }
        }

        fn enter(&mut self, player: EntityId, vertex: VertexId) -> Option<EncounterId> {
            self.dispatcher.on_player_entered_vertex(
                player,
                vertex,
                &mut self.state,
                &mut self.controller,
                &mut self.clock,
                &mut self.rng,
                &mut self.sink,
            )
        }
    }

    #[test]
    fn test_empty_chamber() {
        let mut f = Fixture::new();
        let hero = f.state.add_player(Player::new("Hero", VertexId(2)));
        assert!(f.enter(hero, VertexId(2)).is_none());
        assert!(f.enter(EntityId::new(), VertexId(2)).is_none());
    }

    #[test]
    fn test_tracked_monster_is_engaged() {
        let mut f = Fixture::new();
        f.state.graph.place_monster(VertexId(4), MonsterKind::Orc, 1);
        let orc = f.controller.spawn_from_graph(&mut f.state)[0];
        let hero = f.state.add_player(Player::new("Hero", VertexId(4)));

        let id = f.enter(hero, VertexId(4)).unwrap();
        let encounter = f.clock.encounter(id).unwrap();
        assert_eq!(encounter.monster, orc);
        assert_eq!(f.controller.state(orc).unwrap().mode(), BehaviorMode::Engage);
        assert_eq!(f.dispatcher.started(), 1);
    }

    #[test]
    fn test_no_duplicate_encounters() {
        let mut f = Fixture::new();
        f.state.graph.place_monster(VertexId(4), MonsterKind::Orc, 1);
        f.controller.spawn_from_graph(&mut f.state);
        let hero = f.state.add_player(Player::new("Hero", VertexId(4)));

        let first = f.enter(hero, VertexId(4)).unwrap();
        let second = f.enter(hero, VertexId(4)).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.clock.len(), 1);
        assert_eq!(f.dispatcher.suppressed(), 1);

        // A second player finds the orc busy.
        let rival = f.state.add_player(Player::new("Rival", VertexId(4)));
        assert!(f.enter(rival, VertexId(4)).is_none());
    }

    #[test]
    fn test_fallback_builds_monster_at_player_level() {
        let mut f = Fixture::new();
        f.state.graph.place_monster(VertexId(5), MonsterKind::Slime, 1);
        let mut hero = Player::new("Hero", VertexId(5));
        hero.level = 3;
        let hero = f.state.add_player(hero);

        let id = f.enter(hero, VertexId(5)).unwrap();
        let monster = f.clock.encounter(id).unwrap().monster;
        let slime = f.state.monster(monster).unwrap();
        assert_eq!(slime.kind, MonsterKind::Slime);
        assert_eq!(slime.level, 3);
        assert_eq!(f.state.monster_at(VertexId(5)).map(|m| m.id), Some(monster));
        assert_eq!(f.state.monsters.len(), 1);
    }

    #[test]
    fn test_request_honored_once() {
        let mut f = Fixture::new();
        f.state.graph.place_monster(VertexId(4), MonsterKind::Goblin, 1);
        let goblin = f.controller.spawn_from_graph(&mut f.state)[0];
        let hero = f.state.add_player(Player::new("Hero", VertexId(4)));
        let request = EncounterRequest {
            monster: goblin,
            player: hero,
            vertex: VertexId(4),
        };

        let id = f
            .dispatcher
            .on_request(request, &mut f.state, &mut f.controller, &mut f.clock, &mut f.rng, &mut f.sink)
            .unwrap();
        // the player then walks in: same fight
        assert_eq!(f.enter(hero, VertexId(4)), Some(id));
        assert_eq!(f.clock.len(), 1);
    }
}
