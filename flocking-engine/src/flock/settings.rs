// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Simulation settings
//!
//! Settings are fixed for the lifetime of a simulation run and shared
//! read-only by every agent during a tick. They are validated once when the
//! simulation is built; ticks never re-check them.

use crate::collision::ObstacleMask;
use thiserror::Error;

/// Default number of precomputed obstacle probe directions
pub const DEFAULT_RAY_COUNT: usize = 300;

/// Errors reported by [`SimulationSettings::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// A field holds NaN or an infinite value
    #[error("setting `{field}` must be finite")]
    NonFinite {
        /// Name of the offending field
        field: &'static str,
    },

    /// A field that must be non-negative is negative
    #[error("setting `{field}` must be non-negative, got {value}")]
    Negative {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// The speed range is inverted
    #[error("min_speed ({min}) must not exceed max_speed ({max})")]
    SpeedRange {
        /// Configured minimum speed
        min: f64,
        /// Configured maximum speed
        max: f64,
    },

    /// Agents could never move
    #[error("max_speed must be greater than zero")]
    ZeroMaxSpeed,

    /// Obstacle avoidance needs at least one probe direction
    #[error("ray_count must be at least 1")]
    NoRayDirections,
}

/// Configuration for a flocking simulation
///
/// Defaults reproduce the classic tuning: agents cruise between 2 and 5
/// units per second, see flockmates within 2.5 units and keep 1 unit apart.
///
/// # Examples
///
/// ```
/// use flocking_engine::flock::SimulationSettings;
///
/// let settings = SimulationSettings::default()
///     .with_speed_range(3.0, 10.0)
///     .with_radii(4.0, 1.5);
/// assert!(settings.validate().is_ok());
///
/// let broken = SimulationSettings::default().with_speed_range(10.0, 3.0);
/// assert!(broken.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationSettings {
    /// Lower speed bound enforced after every tick
    pub min_speed: f64,
    /// Upper speed bound enforced after every tick
    pub max_speed: f64,
    /// Radius within which other agents count as flockmates
    pub perception_radius: f64,
    /// Radius within which other agents push this one away
    pub avoidance_radius: f64,
    /// Magnitude limit for every individual steering force
    pub max_steer_force: f64,
    /// Weight of the alignment term
    pub align_weight: f64,
    /// Weight of the cohesion term
    pub cohesion_weight: f64,
    /// Weight of the separation term
    pub separate_weight: f64,
    /// Weight of the target-seeking term
    pub target_weight: f64,
    /// Weight of the obstacle-avoidance term
    pub avoid_collision_weight: f64,
    /// Radius of the sphere swept when probing for obstacles
    pub bounds_radius: f64,
    /// How far ahead obstacles are probed
    pub collision_avoid_distance: f64,
    /// Obstacle layers considered by collision queries
    pub obstacle_mask: ObstacleMask,
    /// Number of precomputed directions tried when looking for a clear path
    pub ray_count: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            min_speed: 2.0,
            max_speed: 5.0,
            perception_radius: 2.5,
            avoidance_radius: 1.0,
            max_steer_force: 3.0,
            align_weight: 1.0,
            cohesion_weight: 1.0,
            separate_weight: 1.0,
            target_weight: 1.0,
            avoid_collision_weight: 10.0,
            bounds_radius: 0.27,
            collision_avoid_distance: 5.0,
            obstacle_mask: ObstacleMask::ALL,
            ray_count: DEFAULT_RAY_COUNT,
        }
    }
}

impl SimulationSettings {
    /// Set the speed range
    pub fn with_speed_range(mut self, min_speed: f64, max_speed: f64) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    /// Set the perception and avoidance radii
    pub fn with_radii(mut self, perception_radius: f64, avoidance_radius: f64) -> Self {
        self.perception_radius = perception_radius;
        self.avoidance_radius = avoidance_radius;
        self
    }

    /// Set the maximum steering force
    pub fn with_max_steer_force(mut self, max_steer_force: f64) -> Self {
        self.max_steer_force = max_steer_force;
        self
    }

    /// Set the alignment, cohesion and separation weights
    pub fn with_flocking_weights(mut self, align: f64, cohesion: f64, separate: f64) -> Self {
        self.align_weight = align;
        self.cohesion_weight = cohesion;
        self.separate_weight = separate;
        self
    }

    /// Set the target-seeking weight
    pub fn with_target_weight(mut self, weight: f64) -> Self {
        self.target_weight = weight;
        self
    }

    /// Configure obstacle probing
    pub fn with_collision_probe(
        mut self,
        bounds_radius: f64,
        avoid_distance: f64,
        avoid_weight: f64,
    ) -> Self {
        self.bounds_radius = bounds_radius;
        self.collision_avoid_distance = avoid_distance;
        self.avoid_collision_weight = avoid_weight;
        self
    }

    /// Set the obstacle layers considered by collision queries
    pub fn with_obstacle_mask(mut self, mask: ObstacleMask) -> Self {
        self.obstacle_mask = mask;
        self
    }

    /// Set the number of probe directions
    pub fn with_ray_count(mut self, ray_count: usize) -> Self {
        self.ray_count = ray_count;
        self
    }

    /// Largest radius any neighbor query needs to cover
    pub fn interaction_radius(&self) -> f64 {
        self.perception_radius.max(self.avoidance_radius)
    }

    /// Validate the settings
    ///
    /// Every numeric field must be finite; speeds, radii, distances and the
    /// steering limit must be non-negative; `min_speed <= max_speed` and
    /// `max_speed > 0`. Weights may be negative (a negative weight inverts
    /// the corresponding behavior).
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("perception_radius", self.perception_radius),
            ("avoidance_radius", self.avoidance_radius),
            ("max_steer_force", self.max_steer_force),
            ("align_weight", self.align_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("separate_weight", self.separate_weight),
            ("target_weight", self.target_weight),
            ("avoid_collision_weight", self.avoid_collision_weight),
            ("bounds_radius", self.bounds_radius),
            ("collision_avoid_distance", self.collision_avoid_distance),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SettingsError::NonFinite { field });
        }

        let non_negative = [
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("perception_radius", self.perception_radius),
            ("avoidance_radius", self.avoidance_radius),
            ("max_steer_force", self.max_steer_force),
            ("bounds_radius", self.bounds_radius),
            ("collision_avoid_distance", self.collision_avoid_distance),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, value)| *value < 0.0) {
            return Err(SettingsError::Negative { field, value });
        }

        if self.min_speed > self.max_speed {
            return Err(SettingsError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.max_speed == 0.0 {
            return Err(SettingsError::ZeroMaxSpeed);
        }
        if self.ray_count == 0 {
            return Err(SettingsError::NoRayDirections);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ray_count, DEFAULT_RAY_COUNT);
        assert_eq!(settings.obstacle_mask, ObstacleMask::ALL);
    }

    #[test]
    fn test_builders() {
        let settings = SimulationSettings::default()
            .with_speed_range(3.0, 10.0)
            .with_radii(4.0, 6.0)
            .with_max_steer_force(2.0)
            .with_flocking_weights(0.5, 0.25, 2.0)
            .with_target_weight(0.0)
            .with_collision_probe(0.5, 8.0, 20.0)
            .with_obstacle_mask(ObstacleMask::NONE)
            .with_ray_count(50);

        assert_eq!(settings.min_speed, 3.0);
        assert_eq!(settings.max_speed, 10.0);
        assert_eq!(settings.perception_radius, 4.0);
        assert_eq!(settings.avoidance_radius, 6.0);
        assert_eq!(settings.max_steer_force, 2.0);
        assert_eq!(settings.align_weight, 0.5);
        assert_eq!(settings.cohesion_weight, 0.25);
        assert_eq!(settings.separate_weight, 2.0);
        assert_eq!(settings.target_weight, 0.0);
        assert_eq!(settings.bounds_radius, 0.5);
        assert_eq!(settings.collision_avoid_distance, 8.0);
        assert_eq!(settings.avoid_collision_weight, 20.0);
        assert_eq!(settings.obstacle_mask, ObstacleMask::NONE);
        assert_eq!(settings.ray_count, 50);
        assert_eq!(settings.interaction_radius(), 6.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_inverted_speed_range() {
        let settings = SimulationSettings::default().with_speed_range(10.0, 3.0);
        assert_eq!(
            settings.validate(),
            Err(SettingsError::SpeedRange { min: 10.0, max: 3.0 })
        );
    }

    #[test]
    fn test_negative_radius() {
        let settings = SimulationSettings::default().with_radii(-1.0, 1.0);
        assert_eq!(
            settings.validate(),
            Err(SettingsError::Negative {
                field: "perception_radius",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_non_finite_field() {
        let mut settings = SimulationSettings::default();
        settings.cohesion_weight = f64::NAN;
        assert_eq!(
            settings.validate(),
            Err(SettingsError::NonFinite {
                field: "cohesion_weight"
            })
        );
    }

    #[test]
    fn test_zero_max_speed() {
        let settings = SimulationSettings::default().with_speed_range(0.0, 0.0);
        assert_eq!(settings.validate(), Err(SettingsError::ZeroMaxSpeed));
    }

    #[test]
    fn test_zero_rays() {
        let settings = SimulationSettings::default().with_ray_count(0);
        assert_eq!(settings.validate(), Err(SettingsError::NoRayDirections));
    }

    #[test]
    fn test_negative_weights_allowed() {
        let settings = SimulationSettings::default().with_flocking_weights(-1.0, -1.0, -1.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = SettingsError::SpeedRange { min: 4.0, max: 1.0 };
        assert_eq!(err.to_string(), "min_speed (4) must not exceed max_speed (1)");

        let err = SettingsError::Negative {
            field: "bounds_radius",
            value: -0.5,
        };
        assert!(err.to_string().contains("bounds_radius"));
    }
}
