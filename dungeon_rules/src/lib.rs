//! # Dungeon Rules
//!
//! The rules half of the simulation - the dungeon graph, the players and
//! monsters standing in it, and the searches run over it.
//! This crate holds state and pure algorithms only; nothing here advances time.

pub mod entities;
pub mod error;
pub mod graph;
pub mod mechanics;
pub mod pathfinding;
pub mod world_state;

pub use entities::*;
pub use error::RulesError;
pub use graph::*;
pub use mechanics::*;
pub use pathfinding::*;
pub use world_state::*;
