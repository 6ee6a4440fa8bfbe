//! Game mechanics: biomes, hazards, tunnel kinds and combat rolls.

mod rolls;

pub use rolls::*;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RulesError;

/// Environments a chamber can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BiomeType {
    #[default]
    Cave,
    UndergroundLake,
    CrystalCavern,
    LavaChamber,
    IceTunnel,
    MushroomGrove,
    AncientRuins,
}

/// Environmental hazards present in a chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardType {
    ToxicGas,
    UnstableFloor,
    Darkness,
    ExtremeHeat,
    ExtremeCold,
    Radiation,
}

/// Kinds of passage between chambers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TunnelKind {
    #[default]
    Normal,
    Unstable,
    Secret,
    Collapsed,
    Reinforced,
    Narrow,
    Underwater,
}

impl TunnelKind {
    pub const ALL: [TunnelKind; 7] = [
        TunnelKind::Normal,
        TunnelKind::Unstable,
        TunnelKind::Secret,
        TunnelKind::Collapsed,
        TunnelKind::Reinforced,
        TunnelKind::Narrow,
        TunnelKind::Underwater,
    ];

    /// Lower-case tag used in map data.
    pub fn tag(&self) -> &'static str {
        match self {
            TunnelKind::Normal => "normal",
            TunnelKind::Unstable => "unstable",
            TunnelKind::Secret => "secret",
            TunnelKind::Collapsed => "collapsed",
            TunnelKind::Reinforced => "reinforced",
            TunnelKind::Narrow => "narrow",
            TunnelKind::Underwater => "underwater",
        }
    }

    /// Collapse probability contributed by the tunnel kind alone.
    pub fn base_collapse_chance(&self) -> f32 {
        match self {
            TunnelKind::Unstable => 0.15,
            TunnelKind::Collapsed => 1.0,
            TunnelKind::Reinforced => 0.01,
            _ => 0.0,
        }
    }
}

impl FromStr for TunnelKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        TunnelKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
            .ok_or_else(|| RulesError::UnknownTunnelKind(s.to_string()))
    }
}
