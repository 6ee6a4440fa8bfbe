//! Edge definitions - tunnels and their collapse model.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EdgeId, VertexId};
use crate::mechanics::TunnelKind;

/// Stability of a freshly dug tunnel.
pub const MAX_STABILITY: u8 = 100;
/// Stability restored by one reinforcement.
pub const REINFORCE_STABILITY: u8 = 30;
/// Stamina cost of a tunnel with no monster nearby.
pub const DEFAULT_STAMINA_COST: u32 = 3;

/// An undirected tunnel between two chambers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub endpoints: (VertexId, VertexId),
    weight: u32,
    kind: TunnelKind,
    pub blocked: bool,

    stability: u8,
    reinforced: bool,
    has_fissures: bool,
    collapse_chance: f32,

    /// Whether a secret passage has been found.
    pub discovered: bool,
    pub stamina_cost: u32,
    /// Level of the strongest monster at either end (0 = none).
    pub monster_level_hint: u32,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, a: VertexId, b: VertexId, weight: u32, kind: TunnelKind) -> Self {
        let mut edge = Self {
            id,
            endpoints: (a, b),
            weight: weight.max(1),
            kind,
            blocked: kind == TunnelKind::Collapsed,
            stability: MAX_STABILITY,
            reinforced: false,
            has_fissures: false,
            collapse_chance: 0.0,
            discovered: kind != TunnelKind::Secret,
            stamina_cost: DEFAULT_STAMINA_COST,
            monster_level_hint: 0,
        };
        edge.update_collapse_chance();
        edge
    }

    /// Traversal cost, always at least 1.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn kind(&self) -> TunnelKind {
        self.kind
    }

    pub fn stability(&self) -> u8 {
        self.stability
    }

    pub fn is_reinforced(&self) -> bool {
        self.reinforced
    }

    pub fn has_fissures(&self) -> bool {
        self.has_fissures
    }

    /// Probability (0.0 - 1.0) that a traversal collapses the tunnel.
    pub fn collapse_chance(&self) -> f32 {
        self.collapse_chance
    }

    /// The endpoint opposite `from`, or `None` if `from` is not an endpoint.
    pub fn other(&self, from: VertexId) -> Option<VertexId> {
        match self.endpoints {
            (a, b) if a == from => Some(b),
            (a, b) if b == from => Some(a),
            _ => None,
        }
    }

    /// Whether this edge joins `a` and `b`, in either direction.
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        self.endpoints == (a, b) || self.endpoints == (b, a)
    }

    fn update_collapse_chance(&mut self) {
        let weakness = (MAX_STABILITY - self.stability) as f32 / MAX_STABILITY as f32;
        let mut chance = (self.kind.base_collapse_chance() + weakness * 0.3).min(1.0);
        if self.has_fissures {
            chance += 0.1;
        }
        if self.reinforced {
            chance *= 0.3;
        }
        self.collapse_chance = chance.clamp(0.0, 1.0);
    }

    /// Reduce stability (explosions, earthquakes) and recompute the chance.
    pub fn damage_stability(&mut self, amount: u8) {
        self.stability = self.stability.saturating_sub(amount);
        self.update_collapse_chance();
    }

    /// Shore the tunnel up: more stability, a much lower collapse chance.
    pub fn reinforce(&mut self) {
        self.reinforced = true;
        self.stability = self.stability.saturating_add(REINFORCE_STABILITY).min(MAX_STABILITY);
        self.update_collapse_chance();
    }

    pub fn add_fissures(&mut self) {
        self.has_fissures = true;
        self.update_collapse_chance();
    }

    /// Block the tunnel for good and retag it as collapsed.
    pub(crate) fn collapse(&mut self) {
        self.blocked = true;
        self.kind = TunnelKind::Collapsed;
        self.update_collapse_chance();
    }

    /// Roll against the collapse chance; on a hit the tunnel collapses.
    pub fn attempt_collapse<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if rng.gen::<f32>() < self.collapse_chance {
            self.collapse();
            true
        } else {
            false
        }
    }
}
