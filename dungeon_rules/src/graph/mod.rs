//! Graph Store - the dungeon topology and its mutable structural state.
//!
//! The graph consists of:
//! - **Vertices**: chambers with a 2D position, biome, hazards and occupancy
//! - **Edges**: undirected tunnels with a weight, a kind and a collapse model
//! - **Adjacency index**: vertex -> incident edge ids, kept in step with edges

mod edge;
mod store;
mod vertex;

pub use edge::*;
pub use store::*;
pub use vertex::*;

use serde::{Deserialize, Serialize};

/// Identifier of a chamber, assigned sequentially by [`DungeonGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Identifier of a tunnel, assigned sequentially by [`DungeonGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}
