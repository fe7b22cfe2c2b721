//! Combat configuration.
//!
//! Tunables that are global to one simulation instance. A config value is
//! injected into every component that reads it; there is no process-wide
//! default lookup.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Settings for the entropy safeguard listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropySafeguardConfig {
    /// Whether the safeguard listener is registered.
    pub enabled: bool,
    /// Amount subtracted from evasion and dodge after a dodge.
    pub penalty: f64,
    /// Seconds the penalty lasts if no hit lands first.
    pub duration: f64,
}

impl Default for EntropySafeguardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            penalty: 0.15,
            duration: 5.0,
        }
    }
}

/// Tunables for damage resolution and event propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Maximum evasion chance any defender can reach.
    pub evasion_cap: f64,
    /// Damage factor for glancing blows.
    pub glancing_multiplier: f64,
    /// Lowest damage a blocked hit can be reduced to by the block itself.
    pub block_floor: f64,
    /// Lowest final damage of any hit that is not a full dodge.
    pub min_damage: f64,
    /// Maximum events pumped through the bus per flush.
    pub max_cascade_events: usize,
    /// Entropy safeguard settings.
    pub entropy_safeguard: EntropySafeguardConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            evasion_cap: 0.75,
            glancing_multiplier: 0.5,
            block_floor: 1.0,
            min_damage: 1.0,
            max_cascade_events: 256,
            entropy_safeguard: EntropySafeguardConfig::default(),
        }
    }
}

impl CombatConfig {
    /// Parses a YAML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document cannot be parsed or
    /// holds out-of-range values.
    pub fn from_yaml_str(source: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid combat config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document cannot be parsed or
    /// holds out-of-range values.
    pub fn from_json_str(source: &str) -> Result<Self, DomainError> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid combat config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every tunable is in range.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.evasion_cap) {
            return Err(DomainError::Validation(
                "evasion_cap must be within [0, 1]".to_owned(),
            ));
        }
        if !(self.glancing_multiplier >= 0.0 && self.glancing_multiplier.is_finite()) {
            return Err(DomainError::Validation(
                "glancing_multiplier must be a non-negative number".to_owned(),
            ));
        }
        if !(self.block_floor >= 0.0 && self.min_damage >= 0.0) {
            return Err(DomainError::Validation(
                "block_floor and min_damage must be non-negative".to_owned(),
            ));
        }
        if self.max_cascade_events == 0 {
            return Err(DomainError::Validation(
                "max_cascade_events must be at least 1".to_owned(),
            ));
        }
        if self.entropy_safeguard.duration < 0.0 {
            return Err(DomainError::Validation(
                "entropy_safeguard.duration must be non-negative".to_owned(),
            ));
        }
        Ok(())
    }
}
