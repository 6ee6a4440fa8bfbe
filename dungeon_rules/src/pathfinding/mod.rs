//! Pathfinding Library - read-only searches over a [`DungeonGraph`].
//!
//! The searches work as follows:
//! 1. **bfs**: hop counts from a start chamber, optionally depth limited
//! 2. **dijkstra**: weighted distances plus predecessors, optional early exit
//! 3. **a_star**: a single route guided by straight-line distance
//! 4. **analysis**: reachability, critical tunnels, path enumeration and costs
//!
//! Blocked tunnels are never traversed. Unknown ids behave like isolated
//! chambers: the maps come back empty and routes come back unreachable.
//!
//! Equal-priority frontier entries pop in insertion order. That order is an
//! implementation detail; callers must not depend on which of several
//! equal-cost paths is returned.
//!
//! [`DungeonGraph`]: crate::graph::DungeonGraph

mod analysis;
mod search;

pub use analysis::*;
pub use search::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::VertexId;

/// Vertex -> hop count or accumulated weight. Unreachable vertices are absent.
pub type DistanceMap = HashMap<VertexId, u32>;

/// Vertex -> previous vertex on a shortest path from the search start.
pub type PredecessorMap = HashMap<VertexId, VertexId>;

/// A path and its total weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Vertices from start to goal, both included. Empty when unreachable.
    pub path: Vec<VertexId>,
    /// Sum of tunnel weights; `f64::INFINITY` when unreachable.
    pub cost: f64,
}

impl Route {
    pub fn unreachable() -> Self {
        Self {
            path: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !self.path.is_empty()
    }

    /// The vertex after the start, if the route has one.
    pub fn next_step(&self) -> Option<VertexId> {
        self.path.get(1).copied()
    }
}
