//! Per-monster behavior state and its one-way mode ladder.

use dungeon_rules::{EntityId, VertexId};
use serde::{Deserialize, Serialize};

/// What a monster is currently doing.
///
/// Modes only climb `Idle -> Patrol -> Chase -> Engage`; the single way back
/// down is death, which resets to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BehaviorMode {
    Idle,
    Patrol,
    Chase,
    Engage,
}

/// Behavior bookkeeping for one tracked monster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterBehaviorState {
    pub monster: EntityId,
    /// Vertex the monster currently occupies.
    pub vertex: VertexId,
    pub vision_range: u32,

    mode: BehaviorMode,
    target: Option<EntityId>,

    move_cooldown: f32,
    move_timer: f32,

    waypoints: Vec<VertexId>,
    cursor: usize,
    forward: bool,
}

impl MonsterBehaviorState {
    /// Start patrolling when there are at least two waypoints, idle otherwise.
    pub fn new(monster: EntityId, vertex: VertexId, waypoints: Vec<VertexId>, vision_range: u32, move_cooldown: f32) -> Self {
        let mode = if waypoints.len() >= 2 {
            BehaviorMode::Patrol
        } else {
            BehaviorMode::Idle
        };
        Self {
            monster,
            vertex,
            vision_range,
            mode,
            target: None,
            move_cooldown,
            move_timer: 0.0,
            waypoints,
            cursor: 0,
            forward: true,
        }
    }

    pub fn mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn waypoints(&self) -> &[VertexId] {
        &self.waypoints
    }

    pub fn move_cooldown(&self) -> f32 {
        self.move_cooldown
    }

    /// Climb to `to`. Refused (returns `false`) for same-mode and downward moves.
    fn climb(&mut self, to: BehaviorMode) -> bool {
        if to <= self.mode {
            return false;
        }
        self.mode = to;
        true
    }

    /// Idle or patrol -> chase after `target`.
    pub fn begin_chase(&mut self, target: EntityId) -> bool {
        if !self.climb(BehaviorMode::Chase) {
            return false;
        }
        self.target = Some(target);
        self.move_timer = 0.0;
        true
    }

    /// Swap the chase target without changing mode.
    pub fn retarget(&mut self, target: Option<EntityId>) -> bool {
        if self.mode != BehaviorMode::Chase {
            return false;
        }
        self.target = target;
        true
    }

    /// Latch into engage against `target`. Once engaged the state never
    /// leaves it except through [`die`](Self::die).
    pub fn engage(&mut self, target: EntityId) -> bool {
        if !self.climb(BehaviorMode::Engage) {
            return false;
        }
        self.target = Some(target);
        true
    }

    /// The only downward transition.
    pub fn die(&mut self) {
        self.mode = BehaviorMode::Idle;
        self.target = None;
    }

    /// Advance the move timer; `true` (and a reset timer) when a step is due.
    pub(crate) fn ready_to_move(&mut self, dt: f32) -> bool {
        self.move_timer += dt.max(0.0);
        if self.move_timer >= self.move_cooldown {
            self.move_timer = 0.0;
            true
        } else {
            false
        }
    }

    /// The waypoint the patrol is heading to, advancing past the current
    /// vertex. Ping-pongs between the ends of the list.
    pub fn patrol_destination(&mut self) -> Option<VertexId> {
        if self.waypoints.len() < 2 {
            return None;
        }
        if self.waypoints.get(self.cursor) == Some(&self.vertex) {
            self.advance_cursor();
        }
        self.waypoints.get(self.cursor).copied()
    }

    fn advance_cursor(&mut self) {
        let last = self.waypoints.len() - 1;
        if self.forward && self.cursor == last {
            self.forward = false;
        } else if !self.forward && self.cursor == 0 {
            self.forward = true;
        }
        if self.forward {
            self.cursor += 1;
        } else {
            self.cursor -= 1;
        }
    }
}
