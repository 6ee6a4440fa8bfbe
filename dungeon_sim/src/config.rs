//! Simulation configuration.
//!
//! Every section falls back to its defaults, so a TOML file only needs the
//! keys it wants to change:
//!
//! ```toml
//! seed = 7
//!
//! [combat]
//! max_exchanges = 60
//!
//! [behavior]
//! vision_range = 5
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Combat Clock tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Ticks with at least one attack before an encounter ends in a draw.
    pub max_exchanges: u32,

    /// Fraction of its cooldown the player starts with (1.0 = attacks on the first tick).
    pub player_initial_charge: f32,

    /// Fraction of its cooldown the monster starts with.
    pub monster_initial_charge: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_exchanges: 120,
            player_initial_charge: 1.0,
            monster_initial_charge: 0.5,
        }
    }
}

/// Monster Behavior Controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Weighted graph distance within which a monster notices a player.
    pub vision_range: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self { vision_range: 3 }
    }
}

/// Player movement costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Stamina spent per point of tunnel weight.
    pub stamina_per_weight: u32,

    /// Inclusive damage range of a tunnel caving in on a player.
    pub collapse_damage: (i32, i32),
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            stamina_per_weight: 2,
            collapse_damage: (15, 30),
        }
    }
}

/// Top-level configuration for a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the simulation's random number generator.
    pub seed: u64,
    pub combat: CombatConfig,
    pub behavior: BehaviorConfig,
    pub traversal: TraversalConfig,
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combat.max_exchanges == 0 {
            return Err(ConfigError::Invalid("combat.max_exchanges must be at least 1".into()));
        }
        for (name, charge) in [
            ("combat.player_initial_charge", self.combat.player_initial_charge),
            ("combat.monster_initial_charge", self.combat.monster_initial_charge),
        ] {
            if !(0.0..=1.0).contains(&charge) {
                return Err(ConfigError::Invalid(format!("{name} must be within 0.0 - 1.0")));
            }
        }
        let (low, high) = self.traversal.collapse_damage;
        if low < 0 || high < low {
            return Err(ConfigError::Invalid(
                "traversal.collapse_damage must be a non-negative (low, high) range".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.combat.max_exchanges, 120);
        assert_eq!(config.behavior.vision_range, 3);
    }

    #[test]
    fn test_partial_sections() {
        let config = SimConfig::from_toml_str(
            r#"
            seed = 42

            [combat]
            max_exchanges = 10

            [traversal]
            collapse_damage = [5, 6]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.combat.max_exchanges, 10);
        assert_eq!(config.combat.monster_initial_charge, 0.5);
        assert_eq!(config.traversal.collapse_damage, (5, 6));
        assert_eq!(config.traversal.stamina_per_weight, 2);
    }

    #[test]
    fn test_parse_error() {
        let err = SimConfig::from_toml_str("seed = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let err = SimConfig::from_toml_str("[combat]\nmax_exchanges = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimConfig::from_toml_str("[combat]\nmonster_initial_charge = 1.5").unwrap_err();
        assert!(err.to_string().contains("monster_initial_charge"));
    }
}
