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
//! # Flocking Engine
//!
//! A boid flocking simulation with data-parallel ticks and pluggable
//! obstacle queries.
//!
//! ## Features
//!
//! - **Classic steering**: alignment, cohesion, separation, target seeking and
//!   obstacle avoidance, each limited by a maximum steering force
//! - **Two-phase ticks**: a neighbor aggregation pass and an integration pass
//!   separated by a full barrier, with atomic commit of new states
//! - **Parallelization**: optional Rayon integration for both phases
//! - **Spatial indexing**: all-pairs or uniform-grid neighbor search with
//!   identical results
//! - **Obstacle probing**: sphere casts against layered spheres, planes and
//!   boxes, or any custom [`collision::CollisionProbe`]
//!
//! ## Example
//!
//! ```rust
//! use flocking_engine::collision::{ObstacleField, ObstacleMask};
//! use flocking_engine::flock::{SimulationSettings, Target};
//! use flocking_engine::math::Vec3;
//! use flocking_engine::simulation::Simulation;
//! use flocking_engine::spawner::Spawner;
//!
//! let settings = SimulationSettings::default();
//! let walls = ObstacleField::bounding_box(Vec3::ZERO, 40.0, ObstacleMask::layer(0));
//!
//! let mut sim = Simulation::builder(settings)
//!     .spawn(&Spawner::new(Vec3::ZERO, 8.0, 64).with_seed(11))
//!     .target(Target::new(Vec3::new(0.0, 5.0, 0.0)))
//!     .probe(walls)
//!     .build()
//!     .unwrap();
//!
//! sim.run(10, 1.0 / 60.0).unwrap();
//! for agent in sim.agents() {
//!     let speed = agent.speed();
//!     assert!(speed >= settings.min_speed - 1e-9 && speed <= settings.max_speed + 1e-9);
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.
//! Probe failures and discarded agent states are reported at `warn` level.

#![warn(missing_docs)]

/// 3D vector math
pub mod math;

/// Agents, settings and targets
pub mod flock;

/// Obstacle queries and probe directions
pub mod collision;

/// Per-tick neighbor aggregation
pub mod aggregation;

/// Steering rules and integration
pub mod steering;

/// Tick orchestration
pub mod simulation;

/// Seeded initial placement
pub mod spawner;

pub use flock::{Agent, AgentId, SimulationSettings, Target};
pub use math::Vec3;
pub use simulation::{SimResult, Simulation, SimulationBuilder, SimulationError, TickReport};
