//! Tunable sentinel parameters and the faults raised while validating them.

use std::time::Duration;

use nightwatch_core::GridCoord;
use serde::Deserialize;
use thiserror::Error;

/// Configuration faults that leave a sentinel idle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The sentinel was created without a grid to navigate.
    #[error("sentinel has no grid reference")]
    MissingGrid,
    /// The sentinel was created without any patrol waypoints.
    #[error("sentinel has an empty patrol route")]
    EmptyPatrolRoute,
    /// A patrol waypoint lies outside the walkable grid.
    #[error("patrol waypoint {index} at {cell:?} is not walkable")]
    UnwalkableWaypoint {
        /// Position of the waypoint within the route.
        index: usize,
        /// Cell the waypoint refers to.
        cell: GridCoord,
    },
    /// A numeric parameter is non-finite or outside its allowed range.
    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter {
        /// Name of the offending field.
        name: &'static str,
        /// Value that was rejected.
        value: f32,
    },
}

/// Movement, perception and combat parameters of a sentinel.
///
/// Durations are expressed in seconds so the struct reads naturally from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentinelConfig {
    /// Translation speed in world units per second.
    pub move_speed: f32,
    /// Time taken to turn toward the next waypoint, in seconds.
    pub rotation_duration: f32,
    /// Dwell time at each patrol waypoint, in seconds.
    pub patrol_pause: f32,
    /// Distance beyond which a pursued intruder is considered lost.
    pub detection_radius: f32,
    /// Maximum distance at which the sentinel fires.
    pub attack_range: f32,
    /// Minimum interval between two attacks, in seconds.
    pub shoot_cooldown: f32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            rotation_duration: 0.2,
            patrol_pause: 0.5,
            detection_radius: 5.0,
            attack_range: 4.0,
            shoot_cooldown: 0.35,
        }
    }
}

impl SentinelConfig {
    /// Checks every parameter, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("move_speed", self.move_speed)?;
        positive("detection_radius", self.detection_radius)?;
        non_negative("attack_range", self.attack_range)?;
        non_negative("rotation_duration", self.rotation_duration)?;
        non_negative("patrol_pause", self.patrol_pause)?;
        non_negative("shoot_cooldown", self.shoot_cooldown)?;
        Ok(())
    }

    /// Patrol dwell time as a duration.
    #[must_use]
    pub fn patrol_pause(&self) -> Duration {
        seconds(self.patrol_pause)
    }

    /// Attack cooldown as a duration.
    #[must_use]
    pub fn shoot_cooldown(&self) -> Duration {
        seconds(self.shoot_cooldown)
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SentinelConfig::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_non_positive_speed() {
        let config = SentinelConfig {
            move_speed: 0.0,
            ..SentinelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "move_speed",
                value: 0.0,
            })
        );
    }

    #[test]
    fn validate_rejects_non_finite_durations() {
        let config = SentinelConfig {
            shoot_cooldown: f32::INFINITY,
            ..SentinelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "shoot_cooldown",
                ..
            })
        ));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: SentinelConfig = toml::from_str(
            r#"
            move_speed = 3.5
            shoot_cooldown = 1.0
            "#,
        )
        .expect("config parses");

        assert!((config.move_speed - 3.5).abs() < f32::EPSILON);
        assert_eq!(config.shoot_cooldown(), Duration::from_secs(1));
        assert!((config.detection_radius - 5.0).abs() < f32::EPSILON);
        assert_eq!(config.patrol_pause(), Duration::from_millis(500));
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let parsed = toml::from_str::<SentinelConfig>("turn_speed = 4.0");
        assert!(parsed.is_err());
    }
}
