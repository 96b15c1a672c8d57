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
//! Obstacle queries used by the steering pipeline
//!
//! The simulation does not own obstacle geometry. It talks to it through
//! the [`CollisionProbe`] trait, whose only required method is a sphere
//! cast. The two queries steering needs are provided on top of it:
//!
//! - [`CollisionProbe::is_heading_for_collision`]: is anything within reach
//!   straight ahead?
//! - [`CollisionProbe::find_clear_direction`]: first direction of a fixed
//!   table that is free of obstacles.
//!
//! # Failure policy
//!
//! A failed query (invalid input, broken or unavailable geometry) never
//! aborts a tick. It is logged at `warn` level and treated as "no obstacle":
//! the agent keeps flying rather than the whole simulation stopping.

mod directions;
mod obstacles;

pub use directions::{LocalFrame, RayDirections};
pub use obstacles::{Obstacle, ObstacleField, ObstacleMask, Shape, SharedObstacleField};

use crate::math::Vec3;
use thiserror::Error;

/// Errors an obstacle query can report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// The query itself was malformed
    #[error("invalid obstacle query: {0}")]
    InvalidQuery(String),

    /// An obstacle holds non-finite or inconsistent geometry
    #[error("obstacle {index} has invalid geometry")]
    InvalidGeometry {
        /// Index of the offending obstacle
        index: usize,
    },

    /// The geometry could not be accessed
    #[error("obstacle geometry is unavailable")]
    GeometryUnavailable,
}

/// Spatial query capability over obstacle geometry
///
/// Implementations must be shareable across threads: the integrate phase may
/// query the probe for many agents at once.
pub trait CollisionProbe: Send + Sync {
    /// Sweep a sphere of `radius` from `origin` along `direction`
    ///
    /// Returns the travel distance at which the sphere first touches an
    /// obstacle on a layer in `mask`, or `None` if nothing is touched within
    /// `max_distance`.
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f64,
        max_distance: f64,
        mask: ObstacleMask,
    ) -> Result<Option<f64>, ProbeError>;

    /// Check whether a sphere swept along `direction` hits anything
    ///
    /// Query failures count as "no collision".
    fn is_heading_for_collision(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f64,
        max_distance: f64,
        mask: ObstacleMask,
    ) -> bool {
        match self.sphere_cast(origin, direction, radius, max_distance, mask) {
            Ok(hit) => hit.is_some(),
            Err(e) => {
                log::warn!("Collision query failed, assuming clear path: {}", e);
                false
            }
        }
    }

    /// Find the first unobstructed direction in `directions`
    ///
    /// Directions are taken in table order, transformed by `frame` into world
    /// space, and the first one whose sweep hits nothing is returned. If every
    /// direction is blocked the frame's forward axis is returned. A failed
    /// query counts as a clear direction.
    fn find_clear_direction(
        &self,
        origin: Vec3,
        frame: &LocalFrame,
        radius: f64,
        max_distance: f64,
        mask: ObstacleMask,
        directions: &RayDirections,
    ) -> Vec3 {
        for local in directions.iter() {
            let dir = frame.to_world(*local);
            match self.sphere_cast(origin, dir, radius, max_distance, mask) {
                Ok(None) => return dir,
                Ok(Some(_)) => continue,
                Err(e) => {
                    log::warn!("Collision query failed, treating {:?} as clear: {}", dir, e);
                    return dir;
                }
            }
        }

        frame.forward()
    }
}

/// Probe for scenes without obstacles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoObstacles;

impl CollisionProbe for NoObstacles {
    fn sphere_cast(
        &self,
        _origin: Vec3,
        _direction: Vec3,
        _radius: f64,
        _max_distance: f64,
        _mask: ObstacleMask,
    ) -> Result<Option<f64>, ProbeError> {
        Ok(None)
    }
}
