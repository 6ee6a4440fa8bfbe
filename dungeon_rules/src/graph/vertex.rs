//! Vertex definitions - chambers of the dungeon.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::VertexId;
use crate::entities::{EntityId, MonsterKind};
use crate::mechanics::{BiomeType, HazardType};

/// Position of a chamber on the map plane. Only used as a search heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The monster marker a chamber carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub kind: MonsterKind,
    pub level: u32,
    /// Live monster instance, once one has been spawned for the marker.
    pub monster: Option<EntityId>,
}

/// A chamber in the cave system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub name: String,
    pub position: Position,
    pub biome: BiomeType,
    pub hazards: Vec<HazardType>,

    pub explored: bool,
    pub has_treasure: bool,
    pub occupant: Option<Occupant>,
    /// Resource name -> amount lying in the chamber.
    pub resources: HashMap<String, u32>,
}

impl Vertex {
    pub(crate) fn new(id: VertexId, name: String, position: Position) -> Self {
        Self {
            id,
            name,
            position,
            biome: BiomeType::default(),
            hazards: Vec::new(),
            explored: false,
            has_treasure: false,
            occupant: None,
            resources: HashMap::new(),
        }
    }

    pub fn has_monster(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn add_hazard(&mut self, hazard: HazardType) {
        if !self.hazards.contains(&hazard) {
            self.hazards.push(hazard);
        }
    }

    pub fn remove_hazard(&mut self, hazard: HazardType) {
        self.hazards.retain(|h| *h != hazard);
    }

    pub fn add_resource(&mut self, resource: impl Into<String>, amount: u32) {
        *self.resources.entry(resource.into()).or_default() += amount;
    }

    /// Take up to `amount` of a resource. Returns the amount actually taken.
    pub fn take_resource(&mut self, resource: &str, amount: u32) -> u32 {
        let Some(available) = self.resources.get_mut(resource) else {
            return 0;
        };
        let taken = amount.min(*available);
        *available -= taken;
        if *available == 0 {
            self.resources.remove(resource);
        }
        taken
    }
}
