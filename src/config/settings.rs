//! Detector and evasion settings
//!
//! Every field has a default, so a JSON document only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::detection::{ExactClickOptions, PatternOptions, PerfectMovementOptions, TimingOptions};
use crate::motion::EvasionOptions;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pointer-path detector
    pub movement: PerfectMovementOptions,
    /// Click-coordinate detector
    pub clicks: ExactClickOptions,
    /// Reaction-time detector
    pub timing: TimingOptions,
    /// Action-sequence detector
    pub pattern: PatternOptions,
    /// Default tuning for evasive widgets
    pub evasion: EvasionOptions,
}

impl Settings {
    /// Flags more streams: smaller samples, lower thresholds
    pub fn strict() -> Self {
        Self {
            movement: PerfectMovementOptions {
                min_points: 8,
                perfectness_threshold: 0.2,
                ..Default::default()
            },
            clicks: ExactClickOptions {
                exactness_radius: 3.0,
                min_clicks: 4,
                suspicion_threshold: 0.6,
                ..Default::default()
            },
            timing: TimingOptions {
                min_human_reaction_time: 180.0,
                max_consistent_variance: 30.0,
                min_events: 4,
                suspicion_threshold: 0.6,
                ..Default::default()
            },
            pattern: PatternOptions {
                suspicion_threshold: 0.6,
                ..Default::default()
            },
            evasion: EvasionOptions {
                evasion_distance: 150.0,
                speed: 1.5,
                ..Default::default()
            },
        }
    }

    /// Flags only blatant automation
    pub fn lenient() -> Self {
        Self {
            movement: PerfectMovementOptions {
                min_points: 15,
                perfectness_threshold: 0.05,
                ..Default::default()
            },
            clicks: ExactClickOptions {
                exactness_radius: 1.0,
                min_clicks: 8,
                suspicion_threshold: 0.8,
                ..Default::default()
            },
            timing: TimingOptions {
                min_human_reaction_time: 120.0,
                max_consistent_variance: 10.0,
                min_events: 8,
                suspicion_threshold: 0.8,
                ..Default::default()
            },
            pattern: PatternOptions {
                min_repetitions: 4,
                suspicion_threshold: 0.8,
                ..Default::default()
            },
            evasion: EvasionOptions {
                evasion_distance: 80.0,
                speed: 0.75,
                ..Default::default()
            },
        }
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the detectors cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("movement.time_window", self.movement.time_window)?;
        at_least_one("movement.min_points", self.movement.min_points)?;
        unit_interval(
            "movement.perfectness_threshold",
            self.movement.perfectness_threshold,
        )?;

        non_negative("clicks.exactness_radius", self.clicks.exactness_radius)?;
        at_least_one("clicks.min_clicks", self.clicks.min_clicks)?;
        positive("clicks.time_window", self.clicks.time_window)?;
        unit_interval(
            "clicks.suspicion_threshold",
            self.clicks.suspicion_threshold,
        )?;

        non_negative(
            "timing.min_human_reaction_time",
            self.timing.min_human_reaction_time,
        )?;
        positive(
            "timing.max_consistent_variance",
            self.timing.max_consistent_variance,
        )?;
        at_least_one("timing.min_events", self.timing.min_events)?;
        positive("timing.time_window", self.timing.time_window)?;
        unit_interval(
            "timing.suspicion_threshold",
            self.timing.suspicion_threshold,
        )?;

        at_least_one(
            "pattern.min_pattern_length",
            self.pattern.min_pattern_length,
        )?;
        at_least_one("pattern.min_repetitions", self.pattern.min_repetitions)?;
        positive("pattern.time_window", self.pattern.time_window)?;
        unit_interval(
            "pattern.suspicion_threshold",
            self.pattern.suspicion_threshold,
        )?;

        non_negative("evasion.evasion_distance", self.evasion.evasion_distance)?;
        non_negative("evasion.speed", self.evasion.speed)?;
        non_negative("evasion.max_step", self.evasion.max_step)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be positive, got {}", value),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must not be negative, got {}", value),
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be within [0, 1], got {}", value),
        })
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        })
    }
}
