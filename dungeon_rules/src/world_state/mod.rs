//! Dungeon state - the graph plus everyone standing in it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{Combatant, EntityId, EntityKind, Monster, Player};
use crate::graph::{DungeonGraph, VertexId};

/// The complete state of a dungeon at any point in time.
///
/// Monsters are located through the vertex occupancy markers of the graph;
/// players carry their own vertex.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DungeonState {
    pub graph: DungeonGraph,

    /// All players in the dungeon.
    pub players: HashMap<EntityId, Player>,

    /// Every live monster instance, tracked or not.
    pub monsters: HashMap<EntityId, Monster>,
}

impl DungeonState {
    /// Create an empty state over `graph`.
    pub fn new(graph: DungeonGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    /// Add a player to the dungeon.
    pub fn add_player(&mut self, player: Player) -> EntityId {
        let id = player.id;
        self.players.insert(id, player);
        id
    }

    /// Add a monster to the roster.
    pub fn add_monster(&mut self, monster: Monster) -> EntityId {
        let id = monster.id;
        self.monsters.insert(id, monster);
        id
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn monster(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    pub fn monster_mut(&mut self, id: EntityId) -> Option<&mut Monster> {
        self.monsters.get_mut(&id)
    }

    /// Which roster an id belongs to.
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.players.contains_key(&id) {
            Some(EntityKind::Player)
        } else if self.monsters.contains_key(&id) {
            Some(EntityKind::Monster)
        } else {
            None
        }
    }

    /// Borrow any combatant by id.
    pub fn combatant(&self, id: EntityId) -> Option<&dyn Combatant> {
        match self.players.get(&id) {
            Some(player) => Some(player as &dyn Combatant),
            None => self.monsters.get(&id).map(|m| m as &dyn Combatant),
        }
    }

    /// Mutably borrow a player and a monster at once.
    pub fn pair_mut(&mut self, player: EntityId, monster: EntityId) -> Option<(&mut Player, &mut Monster)> {
        let p = self.players.get_mut(&player)?;
        let m = self.monsters.get_mut(&monster)?;
        Some((p, m))
    }

    /// Ids of players standing on `vertex`, sorted.
    pub fn players_at(&self, vertex: VertexId) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .players
            .values()
            .filter(|p| p.vertex == vertex)
            .map(|p| p.id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    /// Live players, sorted by id.
    pub fn living_players(&self) -> Vec<&Player> {
        let mut alive: Vec<_> = self.players.values().filter(|p| p.is_alive()).collect();
        alive.sort_by_key(|p| p.id.0);
        alive
    }

    /// The live monster instance bound to a vertex's occupancy marker.
    pub fn monster_at(&self, vertex: VertexId) -> Option<&Monster> {
        let id = self.graph.vertex(vertex)?.occupant?.monster?;
        self.monsters.get(&id)
    }

    /// The chamber whose marker is bound to `monster`.
    pub fn vertex_of_monster(&self, monster: EntityId) -> Option<VertexId> {
        self.graph
            .vertices()
            .find(|v| v.occupant.is_some_and(|o| o.monster == Some(monster)))
            .map(|v| v.id)
    }

    /// Drop a monster from the roster and clear any marker bound to it.
    pub fn remove_monster(&mut self, id: EntityId, vertex: Option<VertexId>) -> Option<Monster> {
        if let Some(v) = vertex {
            let bound = self
                .graph
                .vertex(v)
                .and_then(|vx| vx.occupant)
                .is_some_and(|o| o.monster.is_none() || o.monster == Some(id));
            if bound {
                self.graph.clear_occupant(v);
            }
        }
        self.monsters.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MonsterKind;

    #[test]
    fn test_add_player() {
        let mut state = DungeonState::new(DungeonGraph::sample());
        let id = state.add_player(Player::new("Test Hero", VertexId(0)));

        assert_eq!(state.player(id).unwrap().name, "Test Hero");
        assert_eq!(state.kind_of(id), Some(EntityKind::Player));
        assert_eq!(state.players_at(VertexId(0)), vec![id]);
        assert!(state.players_at(VertexId(1)).is_empty());
    }

    #[test]
    fn test_monster_at_follows_marker() {
        let mut state = DungeonState::new(DungeonGraph::sample());
        let monster = Monster::new(MonsterKind::Goblin, 1);
        let id = state.add_monster(monster);
        assert!(state.monster_at(VertexId(3)).is_none());

        state.graph.place_monster(VertexId(3), MonsterKind::Goblin, 1);
        // unbound marker
        assert!(state.monster_at(VertexId(3)).is_none());

        if let Some(o) = state.graph.vertex_mut(VertexId(3)).and_then(|v| v.occupant.as_mut()) {
            o.monster = Some(id);
        }
        assert_eq!(state.monster_at(VertexId(3)).map(|m| m.id), Some(id));
        assert_eq!(state.vertex_of_monster(id), Some(VertexId(3)));
        assert_eq!(state.kind_of(id), Some(EntityKind::Monster));
        assert_eq!(state.combatant(id).map(|c| c.display_name()), Some("Goblin Lv1".to_string()));

        assert!(state.remove_monster(id, Some(VertexId(3))).is_some());
        assert!(!state.graph.vertex(VertexId(3)).unwrap().has_monster());
        assert!(state.kind_of(id).is_none());
    }

    #[test]
    fn test_living_players() {
        let mut state = DungeonState::default();
        let a = state.add_player(Player::new("A", VertexId(0)));
        let b = state.add_player(Player::new("B", VertexId(0)));
        state.player_mut(b).unwrap().stats.hp = 0;
        let alive: Vec<_> = state.living_players().iter().map(|p| p.id).collect();
        assert_eq!(alive, vec![a]);
    }
}
