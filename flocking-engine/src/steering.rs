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
//! Per-agent steering and integration (the "integrate" phase of a tick)
//!
//! # Acceleration
//!
//! The acceleration of an agent is the weighted sum of up to five
//! steer-towards terms:
//!
//! ```text
//! a  = steer(target - p)            · target_weight        if a target exists
//! a += steer(Σ heading)             · align_weight         if neighbors > 0
//! a += steer(centroid - p)          · cohesion_weight      if neighbors > 0
//! a += steer(Σ avoidance)           · separate_weight      if neighbors > 0
//! a += steer(clear direction)       · avoid_collision_weight if heading for collision
//! ```
//!
//! where `steer(v) = clamp(normalize(v) · max_speed - velocity, max_steer_force)`.
//!
//! # Integration
//!
//! ```text
//! v' = v + a·dt
//! heading' = v' / |v'|                 (previous heading if |v'| ≈ 0)
//! v' = heading' · min(max(|v'|, min_speed), max_speed)
//! p' = p + v'·dt
//! ```
//!
//! # Degenerate vectors
//!
//! A steering vector shorter than [`DEGENERATE_LENGTH`] has no direction and
//! contributes no force. A velocity that collapses to (nearly) zero keeps the
//! previous heading and is restarted at `min_speed` along it; if that heading
//! is itself degenerate the agent restarts along +Z. Neither case ever writes
//! NaN into agent state.

use crate::aggregation::NeighborSummary;
use crate::collision::{CollisionProbe, LocalFrame, RayDirections};
use crate::flock::{Agent, SimulationSettings, Target};
use crate::math::{Vec3, DEGENERATE_LENGTH};

/// Acceleration computed for one agent, before integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Total acceleration
    pub acceleration: Vec3,
    /// Direction chosen to steer around an obstacle, if one was ahead
    pub avoidance_direction: Option<Vec3>,
}

impl SteeringOutput {
    /// Check if the agent was steering around an obstacle
    pub fn is_avoiding_collision(&self) -> bool {
        self.avoidance_direction.is_some()
    }
}

/// Result of advancing one agent by one timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringStep {
    /// New kinematic state
    pub state: Agent,
    /// Whether obstacle avoidance contributed to the step
    pub avoided_collision: bool,
}

/// Stateless steering rules bound to one tick's shared inputs
///
/// The engine only borrows its inputs, so one instance can be shared by all
/// worker threads of the integrate phase.
///
/// # Examples
///
/// ```
/// use flocking_engine::aggregation::NeighborSummary;
/// use flocking_engine::collision::{NoObstacles, RayDirections};
/// use flocking_engine::flock::{Agent, SimulationSettings};
/// use flocking_engine::math::Vec3;
/// use flocking_engine::steering::SteeringEngine;
///
/// let settings = SimulationSettings::default();
/// let directions = RayDirections::fibonacci(settings.ray_count);
/// let engine = SteeringEngine::new(&settings, &NoObstacles, &directions);
///
/// let agent = Agent::spawn(Vec3::ZERO, Vec3::X, &settings);
/// let step = engine.step_agent(&agent, &NeighborSummary::default(), None, 1.0);
///
/// assert_eq!(step.state.position(), Vec3::new(3.5, 0.0, 0.0));
/// assert_eq!(step.state.velocity(), agent.velocity());
/// ```
pub struct SteeringEngine<'a, P: CollisionProbe + ?Sized> {
    settings: &'a SimulationSettings,
    probe: &'a P,
    directions: &'a RayDirections,
}

impl<'a, P: CollisionProbe + ?Sized> SteeringEngine<'a, P> {
    /// Bind the engine to settings, obstacle geometry and the probe table
    ///
    /// `settings` are used as given. Call [`SimulationSettings::validate`]
    /// first; an inverted speed range is not rejected here and yields
    /// `max_speed` for every agent.
    pub fn new(settings: &'a SimulationSettings, probe: &'a P, directions: &'a RayDirections) -> Self {
        SteeringEngine {
            settings,
            probe,
            directions,
        }
    }

    /// Settings the engine steers with
    pub fn settings(&self) -> &SimulationSettings {
        self.settings
    }

    /// Force turning `velocity` toward `direction` at top speed
    ///
    /// The result is limited to `max_steer_force`. A degenerate `direction`
    /// yields zero.
    pub fn steer_towards(&self, direction: Vec3, velocity: Vec3) -> Vec3 {
        match direction.try_normalize() {
            Some(dir) => {
                (dir * self.settings.max_speed - velocity).clamp_magnitude(self.settings.max_steer_force)
            }
            None => Vec3::ZERO,
        }
    }

    /// Sum every steering term acting on `agent`
    pub fn compute_acceleration(
        &self,
        agent: &Agent,
        summary: &NeighborSummary,
        target: Option<&Target>,
    ) -> SteeringOutput {
        let s = self.settings;
        let velocity = agent.velocity();
        let mut acceleration = Vec3::ZERO;

        if let Some(target) = target {
            acceleration += self.steer_towards(target.offset_from(agent.position()), velocity) * s.target_weight;
        }

        if let Some(centroid) = summary.centroid() {
            let alignment = self.steer_towards(summary.flock_heading, velocity) * s.align_weight;
            let cohesion = self.steer_towards(centroid - agent.position(), velocity) * s.cohesion_weight;
            let separation = self.steer_towards(summary.avoidance_heading, velocity) * s.separate_weight;

            acceleration += alignment + cohesion + separation;
        }

        let mut avoidance_direction = None;
        if self.probe.is_heading_for_collision(
            agent.position(),
            agent.heading(),
            s.bounds_radius,
            s.collision_avoid_distance,
            s.obstacle_mask,
        ) {
            let frame = LocalFrame::from_heading(agent.heading());
            let dir = self.probe.find_clear_direction(
                agent.position(),
                &frame,
                s.bounds_radius,
                s.collision_avoid_distance,
                s.obstacle_mask,
                self.directions,
            );
            acceleration += self.steer_towards(dir, velocity) * s.avoid_collision_weight;
            avoidance_direction = Some(dir);
        }

        SteeringOutput {
            acceleration,
            avoidance_direction,
        }
    }

    /// Apply `acceleration` to `agent` over `dt`
    pub fn integrate(&self, agent: &Agent, acceleration: Vec3, dt: f64) -> Agent {
        let s = self.settings;
        let velocity = agent.velocity() + acceleration * dt;
        let speed = velocity.length();

        let (heading, speed) = if speed < DEGENERATE_LENGTH || !speed.is_finite() {
            (agent.heading().try_normalize().unwrap_or(Vec3::Z), s.min_speed)
        } else {
            // Not `clamp`: that panics on an inverted range
            (velocity / speed, speed.max(s.min_speed).min(s.max_speed))
        };

        let velocity = heading * speed;
        Agent::with_state(agent.position() + velocity * dt, heading, velocity)
    }

    /// Advance one agent by `dt`
    ///
    /// Reads only the agent's own snapshot and summary; the caller commits the
    /// returned state once every agent has been stepped.
    pub fn step_agent(
        &self,
        agent: &Agent,
        summary: &NeighborSummary,
        target: Option<&Target>,
        dt: f64,
    ) -> SteeringStep {
        let output = self.compute_acceleration(agent, summary, target);
        SteeringStep {
            state: self.integrate(agent, output.acceleration, dt),
            avoided_collision: output.is_avoiding_collision(),
        }
    }
}
