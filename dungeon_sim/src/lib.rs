//! # Dungeon Sim
//!
//! The time-driven half of the dungeon: monsters that patrol and hunt, fights
//! that resolve on a shared clock, and the dispatcher that joins the two. The
//! static world (graph, entities, searches) lives in `dungeon_rules`.
//!
//! ## Core Components
//!
//! - **behavior**: per-monster mode ladder and the controller that drives it
//! - **combat**: the combat clock and its encounters
//! - **dispatcher**: turns meetings into encounters, one per player
//! - **simulation**: owns everything and advances it with `tick`
//! - **events**: what the engines report to the host
//!
//! ## Design Philosophy
//!
//! - **Host-driven**: nothing runs on its own; the host calls `tick(dt)` and `move_player`
//! - **Seeded**: every random roll comes from one seeded source, so runs replay exactly
//! - **Observable**: state changes are reported through an [`EventSink`]

pub mod behavior;
pub mod combat;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod simulation;

pub use behavior::*;
pub use combat::*;
pub use config::*;
pub use dispatcher::*;
pub use events::*;
pub use simulation::*;
