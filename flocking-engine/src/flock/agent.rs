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
//! Agent identity and kinematic state
//!
//! Agents are stored densely in the simulation and addressed by index.
//! The kinematic state is a plain value: each tick produces a fresh state
//! for every agent and the simulation commits them all at once.

use crate::flock::SimulationSettings;
use crate::math::Vec3;
use std::fmt;

/// Index of an agent within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(usize);

impl AgentId {
    /// Create a new AgentId from a raw index
    pub fn new(index: usize) -> Self {
        AgentId(index)
    }

    /// Get the raw index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({})", self.0)
    }
}

/// Kinematic state of one boid
///
/// `heading` is a unit vector parallel to `velocity`. After every completed
/// tick the speed lies in `[min_speed, max_speed]`.
///
/// # Examples
///
/// ```
/// use flocking_engine::flock::{Agent, SimulationSettings};
/// use flocking_engine::math::Vec3;
///
/// let settings = SimulationSettings::default();
/// let agent = Agent::spawn(Vec3::ZERO, Vec3::X, &settings);
/// assert_eq!(agent.speed(), (settings.min_speed + settings.max_speed) / 2.0);
/// assert_eq!(agent.heading(), Vec3::X);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
    position: Vec3,
    heading: Vec3,
    velocity: Vec3,
}

impl Agent {
    /// Create an agent at the start of a simulation
    ///
    /// The agent travels along `facing` at the midpoint of the configured
    /// speed range. A degenerate `facing` falls back to +Z.
    pub fn spawn(position: Vec3, facing: Vec3, settings: &SimulationSettings) -> Self {
        let heading = facing.try_normalize().unwrap_or(Vec3::Z);
        let start_speed = (settings.min_speed + settings.max_speed) / 2.0;
        Agent {
            position,
            heading,
            velocity: heading * start_speed,
        }
    }

    /// Create an agent from an explicit state
    ///
    /// The caller is responsible for `heading` being a unit vector parallel
    /// to `velocity`.
    pub fn with_state(position: Vec3, heading: Vec3, velocity: Vec3) -> Self {
        Agent {
            position,
            heading,
            velocity,
        }
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current unit heading
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Magnitude of the velocity
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Check if every component of the state is finite
    pub fn is_valid(&self) -> bool {
        self.position.is_valid() && self.heading.is_valid() && self.velocity.is_valid()
    }
}
