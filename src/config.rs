//! Controller configuration parsing from TOML files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::character::constants::{movement, physics, probe, roll};
use crate::character::roll_curve::SpeedCurve;
use crate::collision::LayerMask;

/// Grounded locomotion section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Speed while walking (m/s)
    pub walk_speed: f32,
    /// Speed while sprint is held (m/s)
    pub sprint_speed: f32,
    /// Time constant of the facing smoothing (seconds)
    pub turn_smooth_time: f32,
    /// Stick deflection below which input is ignored
    pub input_dead_zone: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: movement::DEFAULT_WALK_SPEED,
            sprint_speed: movement::DEFAULT_SPRINT_SPEED,
            turn_smooth_time: movement::DEFAULT_TURN_SMOOTH_TIME,
            input_dead_zone: movement::DEFAULT_INPUT_DEAD_ZONE,
        }
    }
}

/// Gravity section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Vertical acceleration while airborne (negative is down)
    pub acceleration: f32,
    /// Vertical velocity the character is held at while grounded
    pub grounded_floor: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            acceleration: physics::DEFAULT_GRAVITY,
            grounded_floor: movement::DEFAULT_GROUNDED_FLOOR,
        }
    }
}

/// Per-frame grounding probe section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProbeConfig {
    pub radius: f32,
    pub cast_distance: f32,
    /// Height of the sphere's bottom above the feet at sweep start
    pub origin_height: f32,
    /// Layers that count as ground
    pub layers: LayerMask,
}

impl Default for GroundProbeConfig {
    fn default() -> Self {
        Self {
            radius: probe::DEFAULT_RADIUS,
            cast_distance: probe::DEFAULT_CAST_DISTANCE,
            origin_height: probe::DEFAULT_ORIGIN_HEIGHT,
            layers: LayerMask(probe::DEFAULT_GROUND_LAYERS),
        }
    }
}

/// One-time spawn snap section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSnapConfig {
    pub radius: f32,
    pub max_distance: f32,
    pub lift: f32,
}

impl Default for SpawnSnapConfig {
    fn default() -> Self {
        Self {
            radius: probe::SPAWN_RADIUS,
            max_distance: probe::SPAWN_MAX_DISTANCE,
            lift: probe::SPAWN_LIFT,
        }
    }
}

/// Which clock decides how far a roll has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollTiming {
    /// Elapsed simulation time divided by `roll.duration`.
    #[default]
    Timer,
    /// Normalized time of the roll clip reported by the animation sink.
    Animation,
}

/// Dodge roll section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    /// Base speed, scaled by the curve (m/s)
    pub speed: f32,
    /// Roll length when timed by the timer (seconds)
    pub duration: f32,
    /// Time after a roll ends before the next may start (seconds)
    pub cooldown: f32,
    pub timing: RollTiming,
    pub curve: SpeedCurve,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            speed: roll::DEFAULT_SPEED,
            duration: roll::DEFAULT_DURATION,
            cooldown: roll::DEFAULT_COOLDOWN,
            timing: RollTiming::Timer,
            curve: SpeedCurve::default(),
        }
    }
}

/// Full controller configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub movement: MovementConfig,
    pub gravity: GravityConfig,
    pub ground_probe: GroundProbeConfig,
    pub spawn_snap: SpawnSnapConfig,
    pub roll: RollConfig,
}

impl ControllerConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration held in memory
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("movement.walk_speed", self.movement.walk_speed)?;
        positive("movement.sprint_speed", self.movement.sprint_speed)?;
        positive("movement.turn_smooth_time", self.movement.turn_smooth_time)?;
        let dead_zone = self.movement.input_dead_zone;
        if !(0.0..1.0).contains(&dead_zone) {
            return Err(ConfigError::invalid(
                "movement.input_dead_zone",
                format!("must be in [0, 1), got {}", dead_zone),
            ));
        }

        finite("gravity.acceleration", self.gravity.acceleration)?;
        if !self.gravity.grounded_floor.is_finite() || self.gravity.grounded_floor > 0.0 {
            return Err(ConfigError::invalid(
                "gravity.grounded_floor",
                format!("must be zero or negative, got {}", self.gravity.grounded_floor),
            ));
        }

        positive("ground_probe.radius", self.ground_probe.radius)?;
        non_negative("ground_probe.cast_distance", self.ground_probe.cast_distance)?;
        non_negative("ground_probe.origin_height", self.ground_probe.origin_height)?;
        if self.ground_probe.layers == LayerMask::NONE {
            return Err(ConfigError::invalid("ground_probe.layers", "no ground layer selected"));
        }

        positive("spawn_snap.radius", self.spawn_snap.radius)?;
        positive("spawn_snap.max_distance", self.spawn_snap.max_distance)?;
        non_negative("spawn_snap.lift", self.spawn_snap.lift)?;

        positive("roll.speed", self.roll.speed)?;
        positive("roll.duration", self.roll.duration)?;
        non_negative("roll.cooldown", self.roll.cooldown)?;
        if !self.roll.curve.is_well_formed() {
            return Err(ConfigError::invalid(
                "roll.curve",
                "needs at least one key and strictly increasing key times",
            ));
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {}", value)))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must not be negative, got {}", value)))
    }
}

/// Errors that can occur when loading controller configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = ControllerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.movement.walk_speed, 5.0);
        assert_eq!(config.movement.sprint_speed, 9.0);
        assert_eq!(config.gravity.grounded_floor, -2.0);
        assert_eq!(config.ground_probe.radius, 0.4);
        assert_eq!(config.roll.timing, RollTiming::Timer);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [movement]
            walk_speed = 4.0
            sprint_speed = 8.0
            turn_smooth_time = 0.2
            input_dead_zone = 0.2

            [gravity]
            acceleration = -20.0
            grounded_floor = -1.0

            [ground_probe]
            radius = 0.3
            cast_distance = 0.2
            layers = 3

            [roll]
            speed = 10.0
            duration = 0.5
            cooldown = 0.75
            timing = "animation"
            curve = [
                { time = 0.0, value = 0.0 },
                { time = 0.3, value = 1.0 },
                { time = 1.0, value = 0.0 },
            ]
        "#;
        let config = ControllerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.movement.walk_speed, 4.0);
        assert_eq!(config.gravity.acceleration, -20.0);
        assert_eq!(config.ground_probe.layers, LayerMask(3));
        assert_eq!(config.ground_probe.origin_height, probe::DEFAULT_ORIGIN_HEIGHT);
        assert_eq!(config.roll.timing, RollTiming::Animation);
        assert_eq!(config.roll.curve.keys().len(), 3);
        assert_eq!(config.roll.curve.evaluate(0.3), 1.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = ControllerConfig::from_toml_str("[roll]\nduration = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "roll.duration", .. }));

        let err = ControllerConfig::from_toml_str("[gravity]\ngrounded_floor = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "gravity.grounded_floor", .. }));

        let err = ControllerConfig::from_toml_str("[movement]\ninput_dead_zone = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "movement.input_dead_zone", .. }));

        let err = ControllerConfig::from_toml_str("[ground_probe]\nlayers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ground_probe.layers", .. }));
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = ControllerConfig::from_toml_str("[movement\nwalk_speed = 1").unwrap_err();
        assert!(err.to_string().contains("<inline>"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = ControllerConfig::default().to_toml_string().unwrap();
        let parsed = ControllerConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, ControllerConfig::default());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ControllerConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
