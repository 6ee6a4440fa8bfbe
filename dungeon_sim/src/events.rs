//! Simulation events and the sinks that receive them.
//!
//! Everything a host may want to show (combat log lines, deaths, monsters
//! moving, tunnels caving in) is reported as a [`SimEvent`] through an
//! injected [`EventSink`]. Nothing in the simulation prints.

use dungeon_rules::{EdgeId, EntityId, EntityKind, VertexId};
use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorMode;
use crate::combat::{EncounterId, EncounterOutcome};

/// Something that happened during a simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Free-form text for a message log.
    Narration(String),

    DamageDealt {
        encounter: EncounterId,
        source: EntityId,
        target: EntityId,
        amount: i32,
        critical: bool,
    },

    Dodged {
        encounter: EncounterId,
        attacker: EntityId,
        defender: EntityId,
    },

    Death {
        who: EntityId,
        kind: EntityKind,
    },

    EncounterStarted {
        encounter: EncounterId,
        player: EntityId,
        monster: EntityId,
        vertex: VertexId,
    },

    EncounterEnded {
        encounter: EncounterId,
        outcome: EncounterOutcome,
    },

    LevelUp {
        player: EntityId,
        level: u32,
    },

    PlayerMoved {
        player: EntityId,
        from: VertexId,
        to: VertexId,
    },

    MonsterMoved {
        monster: EntityId,
        from: VertexId,
        to: VertexId,
    },

    MonsterModeChanged {
        monster: EntityId,
        from: BehaviorMode,
        to: BehaviorMode,
    },

    EdgeCollapsed {
        edge: EdgeId,
    },
}

/// Receiver for simulation events.
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);

    /// Shorthand for a [`SimEvent::Narration`].
    fn narrate(&mut self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(SimEvent::Narration(text.into()));
    }
}

impl<F> EventSink for F
where
    F: FnMut(SimEvent),
{
    fn emit(&mut self, event: SimEvent) {
        self(event)
    }
}

/// Keeps every event in order. Mostly useful in tests and replays.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<SimEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: SimEvent) {}
}
