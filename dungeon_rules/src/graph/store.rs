//! Dungeon Graph - vertices, edges and the adjacency index that ties them.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Edge, EdgeId, Occupant, Position, Vertex, VertexId, DEFAULT_STAMINA_COST};
use crate::entities::MonsterKind;
use crate::error::RulesError;
use crate::mechanics::{BiomeType, HazardType, TunnelKind};

/// Species rolled by [`DungeonGraph::spawn_random_monsters`] when none are given.
static DEFAULT_SPAWN_KINDS: [MonsterKind; 4] = [
    MonsterKind::Goblin,
    MonsterKind::Orc,
    MonsterKind::CaveSpirit,
    MonsterKind::StoneGolem,
];

/// The main dungeon graph structure.
///
/// Ids are handed out sequentially and never reused. Every lookup by an
/// unknown id answers `None`, `false` or an empty list instead of panicking.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DungeonGraph {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, Edge>,

    /// Index: vertex -> incident edges.
    adjacency: HashMap<VertexId, Vec<EdgeId>>,

    next_vertex: u32,
    next_edge: u32,
}

impl DungeonGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chamber and return its id.
    pub fn add_vertex(&mut self, name: impl Into<String>, position: Position) -> VertexId {
        let id = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(id, Vertex::new(id, name.into(), position));
        self.adjacency.insert(id, Vec::new());
        id
    }

    /// Add a chamber with a biome and hazards.
    pub fn add_vertex_in(
        &mut self,
        name: impl Into<String>,
        position: Position,
        biome: BiomeType,
        hazards: &[HazardType],
    ) -> VertexId {
        let id = self.add_vertex(name, position);
        if let Some(vertex) = self.vertices.get_mut(&id) {
            vertex.biome = biome;
            for hazard in hazards {
                vertex.add_hazard(*hazard);
            }
        }
        id
    }

    /// Remove a chamber together with every tunnel touching it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<Vertex> {
        let incident = self.adjacency.get(&id).cloned().unwrap_or_default();
        for edge_id in incident {
            self.remove_edge(edge_id);
        }
        self.adjacency.remove(&id);
        self.vertices.remove(&id)
    }

    /// Connect two chambers. Returns `None` when either endpoint is unknown.
    ///
    /// The weight is clamped to at least 1.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId, weight: u32, kind: TunnelKind) -> Option<EdgeId> {
        if !self.vertices.contains_key(&a) || !self.vertices.contains_key(&b) {
            return None;
        }
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge::new(id, a, b, weight, kind));
        self.adjacency.entry(a).or_default().push(id);
        if a != b {
            self.adjacency.entry(b).or_default().push(id);
        }
        Some(id)
    }

    /// Connect two chambers with a tunnel named by a map-data tag such as `"unstable"`.
    pub fn add_edge_tag(&mut self, a: VertexId, b: VertexId, weight: u32, tag: &str) -> Result<EdgeId, RulesError> {
        let kind: TunnelKind = tag.parse()?;
        self.add_edge(a, b, weight, kind).ok_or_else(|| {
            let missing = if self.contains_vertex(a) { b } else { a };
            RulesError::UnknownVertex(missing.0)
        })
    }

    /// Permanently remove a tunnel from the graph and both adjacency lists.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        let (a, b) = edge.endpoints;
        for endpoint in [a, b] {
            if let Some(list) = self.adjacency.get_mut(&endpoint) {
                list.retain(|e| *e != id);
            }
        }
        Some(edge)
    }

    /// Block a tunnel (can be unblocked later).
    pub fn block_edge(&mut self, id: EdgeId) -> bool {
        self.set_blocked(id, true)
    }

    /// Unblock a previously blocked tunnel.
    pub fn unblock_edge(&mut self, id: EdgeId) -> bool {
        self.set_blocked(id, false)
    }

    fn set_blocked(&mut self, id: EdgeId, blocked: bool) -> bool {
        match self.edges.get_mut(&id) {
            Some(edge) => {
                edge.blocked = blocked;
                true
            }
            None => false,
        }
    }

    /// Neighbors of a chamber as `(neighbor, edge)` pairs.
    ///
    /// Blocked tunnels are skipped unless `include_blocked` is set.
    pub fn neighbors(&self, id: VertexId, include_blocked: bool) -> Vec<(VertexId, &Edge)> {
        self.adjacency
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|e| self.edges.get(e))
                    .filter(|edge| include_blocked || !edge.blocked)
                    .filter_map(|edge| edge.other(id).map(|other| (other, edge)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The tunnel joining two chambers, if any (blocked or not).
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&Edge> {
        self.adjacency
            .get(&a)?
            .iter()
            .filter_map(|e| self.edges.get(e))
            .find(|edge| edge.connects(a, b))
    }

    /// Every tunnel touching a chamber.
    pub fn edges_of(&self, id: VertexId) -> Vec<&Edge> {
        self.adjacency
            .get(&id)
            .map(|ids| ids.iter().filter_map(|e| self.edges.get(e)).collect())
            .unwrap_or_default()
    }

    /// Reduce a tunnel's stability.
    pub fn damage_stability(&mut self, id: EdgeId, amount: u8) -> bool {
        self.with_edge(id, |edge| edge.damage_stability(amount))
    }

    /// Reinforce a tunnel.
    pub fn reinforce(&mut self, id: EdgeId) -> bool {
        self.with_edge(id, Edge::reinforce)
    }

    /// Crack a tunnel, raising its collapse chance.
    pub fn add_fissures(&mut self, id: EdgeId) -> bool {
        self.with_edge(id, Edge::add_fissures)
    }

    fn with_edge(&mut self, id: EdgeId, f: impl FnOnce(&mut Edge)) -> bool {
        match self.edges.get_mut(&id) {
            Some(edge) => {
                f(edge);
                true
            }
            None => false,
        }
    }

    /// Roll a tunnel's collapse chance. `false` for unknown ids.
    pub fn attempt_collapse<R: Rng + ?Sized>(&mut self, id: EdgeId, rng: &mut R) -> bool {
        let collapsed = self
            .edges
            .get_mut(&id)
            .map(|edge| edge.attempt_collapse(rng))
            .unwrap_or(false);
        if collapsed {
            debug!("tunnel {id} collapsed");
        }
        collapsed
    }

    /// Independently roll every open unstable tunnel against `probability`.
    ///
    /// Returns the tunnels that collapsed, in id order.
    pub fn trigger_random_collapse<R: Rng + ?Sized>(&mut self, probability: f32, rng: &mut R) -> Vec<EdgeId> {
        let mut candidates: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| !e.blocked && e.kind() == TunnelKind::Unstable)
            .map(|e| e.id)
            .collect();
        // Stable roll order for seeded runs.
        candidates.sort();

        let mut collapsed = Vec::new();
        for id in candidates {
            if rng.gen::<f32>() < probability {
                if let Some(edge) = self.edges.get_mut(&id) {
                    edge.collapse();
                    collapsed.push(id);
                }
            }
        }
        if !collapsed.is_empty() {
            debug!("random collapse closed {} tunnels", collapsed.len());
        }
        collapsed
    }

    /// Mark a chamber as holding a monster of `kind`.
    pub fn place_monster(&mut self, id: VertexId, kind: MonsterKind, level: u32) -> bool {
        match self.vertices.get_mut(&id) {
            Some(vertex) => {
                vertex.occupant = Some(Occupant {
                    kind,
                    level: level.max(1),
                    monster: None,
                });
                true
            }
            None => false,
        }
    }

    /// Place a monster from a map-data tag such as `"stone_golem"`.
    pub fn place_monster_tag(&mut self, id: VertexId, tag: &str, level: u32) -> Result<(), RulesError> {
        let kind: MonsterKind = tag.parse()?;
        if self.place_monster(id, kind, level) {
            Ok(())
        } else {
            Err(RulesError::UnknownVertex(id.0))
        }
    }

    /// Remove a chamber's monster marker, returning it.
    pub fn clear_occupant(&mut self, id: VertexId) -> Option<Occupant> {
        self.vertices.get_mut(&id)?.occupant.take()
    }

    /// Move a monster marker to a neighboring chamber.
    ///
    /// Fails when `from` holds no monster or `to` is unknown or occupied.
    pub fn move_occupant(&mut self, from: VertexId, to: VertexId) -> bool {
        let destination_free = self.vertices.get(&to).is_some_and(|v| !v.has_monster());
        if from == to || !destination_free {
            return false;
        }
        let Some(occupant) = self.clear_occupant(from) else {
            return false;
        };
        if let Some(vertex) = self.vertices.get_mut(&to) {
            vertex.occupant = Some(occupant);
        }
        true
    }

    /// Randomly place monsters in unexplored, empty chambers.
    ///
    /// The two starting chambers (`v0` and `v1`) never receive one. Returns the
    /// chambers that received a monster, in id order.
    pub fn spawn_random_monsters<R: Rng + ?Sized>(
        &mut self,
        probability: f32,
        kinds: &[MonsterKind],
        rng: &mut R,
    ) -> Vec<VertexId> {
        let kinds = if kinds.is_empty() { &DEFAULT_SPAWN_KINDS[..] } else { kinds };
        let mut spawned = Vec::new();
        for id in self.vertex_ids() {
            if id.0 < 2 {
                continue;
            }
            let Some(vertex) = self.vertices.get_mut(&id) else {
                continue;
            };
            if vertex.has_monster() || vertex.explored {
                continue;
            }
            if rng.gen::<f32>() < probability {
                if let Some(kind) = kinds.choose(rng) {
                    vertex.occupant = Some(Occupant {
                        kind: *kind,
                        level: 1,
                        monster: None,
                    });
                    spawned.push(id);
                }
            }
        }
        spawned
    }

    /// Randomly drop resource piles into unexplored chambers.
    pub fn add_random_resources<R: Rng + ?Sized>(&mut self, probability: f32, rng: &mut R) -> Vec<VertexId> {
        const RESOURCES: [&str; 4] = ["gold", "gems", "keys", "potions"];
        let mut added = Vec::new();
        for id in self.vertex_ids() {
            let Some(vertex) = self.vertices.get_mut(&id) else {
                continue;
            };
            if vertex.explored || rng.gen::<f32>() >= probability {
                continue;
            }
            let resource = RESOURCES[rng.gen_range(0..RESOURCES.len())];
            vertex.add_resource(resource, rng.gen_range(5..=20));
            added.push(id);
        }
        added
    }

    /// Price tunnels by the strongest monster at either end.
    ///
    /// Tunnels towards stronger monsters are cheaper (`max(1, 6 - level)`);
    /// tunnels with no monster at either end cost the default.
    pub fn configure_stamina_costs(&mut self, monster_levels: &HashMap<VertexId, u32>) {
        for edge in self.edges.values_mut() {
            let (a, b) = edge.endpoints;
            let level = monster_levels
                .get(&a)
                .copied()
                .unwrap_or(0)
                .max(monster_levels.get(&b).copied().unwrap_or(0));
            if level == 0 {
                edge.stamina_cost = DEFAULT_STAMINA_COST;
                edge.monster_level_hint = 0;
            } else {
                edge.stamina_cost = 6u32.saturating_sub(level).max(1);
                edge.monster_level_hint = level;
            }
        }
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// All vertex ids, sorted.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<_> = self.vertices.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All edge ids, sorted.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<_> = self.edges.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The seven-chamber demo cave, entrance `v0`, treasure chamber `v6`.
    pub fn sample() -> Self {
        let mut g = Self::new();

        let v0 = g.add_vertex_in("Entrance", Position::new(100.0, 300.0), BiomeType::Cave, &[]);
        let v1 = g.add_vertex_in("Blue Cavern", Position::new(300.0, 150.0), BiomeType::CrystalCavern, &[]);
        let v2 = g.add_vertex_in("Hall of Echoes", Position::new(300.0, 450.0), BiomeType::Cave, &[]);
        let v3 = g.add_vertex_in(
            "Dark Tunnel",
            Position::new(500.0, 100.0),
            BiomeType::Cave,
            &[HazardType::Darkness],
        );
        let v4 = g.add_vertex_in("Stone Bridge", Position::new(500.0, 300.0), BiomeType::Cave, &[]);
        let v5 = g.add_vertex_in(
            "Underground Lake",
            Position::new(500.0, 500.0),
            BiomeType::UndergroundLake,
            &[],
        );
        let v6 = g.add_vertex_in(
            "Treasure Chamber",
            Position::new(700.0, 300.0),
            BiomeType::AncientRuins,
            &[],
        );

        let tunnels = [
            (v0, v1, 3, TunnelKind::Normal),
            (v0, v2, 4, TunnelKind::Normal),
            (v1, v3, 2, TunnelKind::Unstable),
            (v1, v4, 5, TunnelKind::Normal),
            (v2, v4, 3, TunnelKind::Normal),
            (v2, v5, 4, TunnelKind::Underwater),
            (v3, v6, 6, TunnelKind::Secret),
            (v4, v6, 2, TunnelKind::Normal),
            (v5, v6, 5, TunnelKind::Unstable),
            (v1, v2, 2, TunnelKind::Narrow),
            (v3, v4, 3, TunnelKind::Normal),
            (v4, v5, 2, TunnelKind::Normal),
        ];
        for (a, b, weight, kind) in tunnels {
            g.add_edge(a, b, weight, kind);
        }

        if let Some(v) = g.vertex_mut(v1) {
            v.add_resource("gold", 10);
        }
        if let Some(v) = g.vertex_mut(v3) {
            v.add_resource("gems", 5);
        }
        if let Some(v) = g.vertex_mut(v5) {
            v.add_resource("potions", 2);
        }
        if let Some(v) = g.vertex_mut(v6) {
            v.has_treasure = true;
        }
        g
    }
}
