//! Engine configuration
//!
//! Every section defaults to the values the incident simulation has always
//! used, and every section is `#[serde(default)]` so a JSON file only needs to
//! name the values it overrides.

use crate::core_types::Severity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root configuration for the incident engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub severity: SeverityTable,
    pub decay: DecayConfig,
    pub wave: WaveConfig,
    pub escalation: EscalationConfig,
    pub intrusion: IntrusionConfig,
    pub assessment: AssessmentConfig,
}

/// Grid anchor and resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub base_lat: f64,
    pub base_lng: f64,
    /// Cell edge length in meters
    pub cell_size_m: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_lat: 17.4675,
            base_lng: 78.3071,
            cell_size_m: 50.0,
        }
    }
}

/// Initial risk and decay for a seeded cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityProfile {
    pub risk_level: f64,
    pub decay_factor: f64,
}

/// Severity-indexed seeding constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityTable {
    pub low: SeverityProfile,
    pub elevated: SeverityProfile,
    pub critical: SeverityProfile,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            low: SeverityProfile {
                risk_level: 40.0,
                decay_factor: 0.6,
            },
            elevated: SeverityProfile {
                risk_level: 70.0,
                decay_factor: 0.75,
            },
            critical: SeverityProfile {
                risk_level: 100.0,
                decay_factor: 0.85,
            },
        }
    }
}

impl SeverityTable {
    /// Profile for `severity`; unrecognized levels use the level 1 profile
    pub fn profile(&self, severity: Severity) -> SeverityProfile {
        match severity.level() {
            2 => self.elevated,
            3 => self.critical,
            _ => self.low,
        }
    }

    fn profiles(&self) -> [(&'static str, SeverityProfile); 3] {
        [
            ("low", self.low),
            ("elevated", self.elevated),
            ("critical", self.critical),
        ]
    }
}

/// Decay propagation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Propagated risk below this value is discarded
    pub risk_threshold: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 20.0,
        }
    }
}

/// Wave expansion admission chances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Severity 1
    pub chance_low: f64,
    /// Severity 2
    pub chance_elevated: f64,
    /// Severity 3 and any unrecognized level
    pub chance_default: f64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            chance_low: 0.6,
            chance_elevated: 0.8,
            chance_default: 1.0,
        }
    }
}

impl WaveConfig {
    /// Probability of admitting one neighbor candidate
    pub fn expansion_chance(&self, severity: Severity) -> f64 {
        match severity.level() {
            1 => self.chance_low,
            2 => self.chance_elevated,
            _ => self.chance_default,
        }
    }
}

/// Elapsed-time escalation thresholds, compared with strict `>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub elevated_after_minutes: f64,
    pub critical_after_minutes: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            elevated_after_minutes: 1.0,
            critical_after_minutes: 2.0,
        }
    }
}

/// Intrusion alert fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrusionConfig {
    /// Households within this many meters (inclusive) are alerted
    pub radius_m: f64,
}

impl Default for IntrusionConfig {
    fn default() -> Self {
        Self { radius_m: 120.0 }
    }
}

/// Household risk classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Cells above this risk influence households up to 3 cells away
    pub wide_reach_risk: f64,
    /// Cells above this risk influence households up to 2 cells away
    pub medium_reach_risk: f64,
    pub critical_above: f64,
    pub high_above: f64,
    pub elevated_above: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            wide_reach_risk: 70.0,
            medium_reach_risk: 40.0,
            critical_above: 75.0,
            high_above: 45.0,
            elevated_above: 15.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read engine config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn in_open_unit(value: f64) -> bool {
    value > 0.0 && value < 1.0
}

impl EngineConfig {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
    /// errors of [`EngineConfig::from_json_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.grid.cell_size_m) {
            return Err(ConfigError::Invalid(format!(
                "grid.cell_size_m must be positive, got {}",
                self.grid.cell_size_m
            )));
        }
        if !is_positive(self.intrusion.radius_m) {
            return Err(ConfigError::Invalid(format!(
                "intrusion.radius_m must be positive, got {}",
                self.intrusion.radius_m
            )));
        }
        for (name, profile) in self.severity.profiles() {
            if !in_open_unit(profile.decay_factor) {
                return Err(ConfigError::Invalid(format!(
                    "severity.{name}.decay_factor must be in (0, 1), got {}",
                    profile.decay_factor
                )));
            }
            if profile.risk_level.is_nan() || profile.risk_level < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "severity.{name}.risk_level must be non-negative, got {}",
                    profile.risk_level
                )));
            }
        }
        for (name, chance) in [
            ("chance_low", self.wave.chance_low),
            ("chance_elevated", self.wave.chance_elevated),
            ("chance_default", self.wave.chance_default),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!(
                    "wave.{name} must be in [0, 1], got {chance}"
                )));
            }
        }
        if self.escalation.elevated_after_minutes >= self.escalation.critical_after_minutes {
            return Err(ConfigError::Invalid(format!(
                "escalation.elevated_after_minutes ({}) must be below critical_after_minutes ({})",
                self.escalation.elevated_after_minutes, self.escalation.critical_after_minutes
            )));
        }
        Ok(())
    }
}
