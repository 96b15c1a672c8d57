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
//! Obstacle geometry and sphere casts
//!
//! A minimal obstacle store that answers sphere-cast queries for the
//! steering pipeline. Each obstacle lives on one or more layers; queries
//! only see obstacles whose layers intersect the query mask.
//!
//! # Sphere casts
//!
//! Sweeping a sphere of radius `r` against a shape is the same as casting a
//! ray against the shape inflated by `r`:
//!
//! - **Sphere**: exact, a ray against a sphere of radius `R + r`.
//! - **Plane**: exact, the ray stops when the signed distance reaches `r`.
//! - **Aabb**: the box is grown by `r` on every side, which slightly
//!   over-approximates the rounded corners of the true swept volume.
//!
//! A cast that starts inside the inflated shape reports a hit at distance 0.

use super::{CollisionProbe, ProbeError};
use crate::math::Vec3;
use std::sync::{Arc, RwLock};

/// Bit set of obstacle layers
///
/// # Examples
///
/// ```
/// use flocking_engine::collision::ObstacleMask;
///
/// let walls = ObstacleMask::layer(3);
/// assert!(ObstacleMask::ALL.intersects(walls));
/// assert!(!ObstacleMask::NONE.intersects(walls));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstacleMask(pub u32);

impl ObstacleMask {
    /// No layers
    pub const NONE: ObstacleMask = ObstacleMask(0);
    /// Every layer
    pub const ALL: ObstacleMask = ObstacleMask(u32::MAX);

    /// Mask containing a single layer (`0..32`)
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or greater.
    pub const fn layer(index: u32) -> Self {
        assert!(index < 32, "Layer index must be below 32");
        ObstacleMask(1 << index)
    }

    /// Check if the two masks share at least one layer
    pub fn intersects(self, other: ObstacleMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two masks
    pub fn union(self, other: ObstacleMask) -> Self {
        ObstacleMask(self.0 | other.0)
    }
}

/// Obstacle geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Solid ball
    Sphere {
        /// Center of the ball
        centre: Vec3,
        /// Radius of the ball
        radius: f64,
    },
    /// Infinite wall; everything behind the normal is solid
    Plane {
        /// Any point on the plane
        point: Vec3,
        /// Unit normal pointing into open space
        normal: Vec3,
    },
    /// Solid axis-aligned box
    Aabb {
        /// Minimum corner
        min: Vec3,
        /// Maximum corner
        max: Vec3,
    },
}

impl Shape {
    fn is_valid(&self) -> bool {
        match *self {
            Shape::Sphere { centre, radius } => {
                centre.is_valid() && radius.is_finite() && radius >= 0.0
            }
            Shape::Plane { point, normal } => point.is_valid() && normal.try_normalize().is_some(),
            Shape::Aabb { min, max } => {
                min.is_valid() && max.is_valid() && min.x <= max.x && min.y <= max.y && min.z <= max.z
            }
        }
    }

    /// Distance along a unit `direction` at which a sphere of `radius` first
    /// touches this shape, if any
    fn sphere_cast(&self, origin: Vec3, direction: Vec3, radius: f64) -> Option<f64> {
        match *self {
            Shape::Sphere { centre, radius: r } => {
                ray_sphere(origin, direction, centre, r + radius)
            }
            Shape::Plane { point, normal } => {
                let n = normal.normalize_or_zero();
                let signed = (origin - point).dot(n) - radius;
                if signed <= 0.0 {
                    return Some(0.0);
                }
                let approach = direction.dot(n);
                if approach >= 0.0 {
                    None
                } else {
                    Some(signed / -approach)
                }
            }
            Shape::Aabb { min, max } => {
                let grow = Vec3::splat(radius);
                ray_aabb(origin, direction, min - grow, max + grow)
            }
        }
    }
}

fn ray_sphere(origin: Vec3, direction: Vec3, centre: Vec3, radius: f64) -> Option<f64> {
    let offset = origin - centre;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = offset.dot(direction);
    if b >= 0.0 {
        // Outside and moving away
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f64> {
    let mut t_enter = 0.0_f64;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let o = origin.as_array()[axis];
        let d = direction.as_array()[axis];
        let lo = min.as_array()[axis];
        let hi = max.as_array()[axis];

        if d.abs() < f64::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (t0, t1) = {
            let a = (lo - o) * inv;
            let b = (hi - o) * inv;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// An obstacle on a set of layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Geometry of the obstacle
    pub shape: Shape,
    /// Layers the obstacle belongs to
    pub layers: ObstacleMask,
}

impl Obstacle {
    /// Create an obstacle
    pub fn new(shape: Shape, layers: ObstacleMask) -> Self {
        Obstacle { shape, layers }
    }
}

/// Collection of obstacles answering sphere-cast queries
///
/// # Examples
///
/// ```
/// use flocking_engine::collision::{CollisionProbe, ObstacleField, ObstacleMask};
/// use flocking_engine::math::Vec3;
///
/// let mut field = ObstacleField::new();
/// field.add_sphere(Vec3::new(0.0, 0.0, 10.0), 2.0, ObstacleMask::layer(0));
///
/// let hit = field.sphere_cast(Vec3::ZERO, Vec3::Z, 0.5, 20.0, ObstacleMask::ALL).unwrap();
/// assert_eq!(hit, Some(7.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    /// Create an empty field
    pub fn new() -> Self {
        ObstacleField {
            obstacles: Vec::new(),
        }
    }

    /// Six inward-facing walls enclosing a cube of edge `size` around `centre`
    ///
    /// Agents flying inside the cube are steered back before reaching a wall.
    pub fn bounding_box(centre: Vec3, size: f64, layers: ObstacleMask) -> Self {
        let half = size / 2.0;
        let mut field = ObstacleField::new();
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            field.add_plane(centre + axis * half, -axis, layers);
            field.add_plane(centre - axis * half, axis, layers);
        }
        field
    }

    /// Add an obstacle
    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Add a solid ball
    pub fn add_sphere(&mut self, centre: Vec3, radius: f64, layers: ObstacleMask) {
        self.add(Obstacle::new(Shape::Sphere { centre, radius }, layers));
    }

    /// Add an infinite wall whose `normal` points into open space
    pub fn add_plane(&mut self, point: Vec3, normal: Vec3, layers: ObstacleMask) {
        self.add(Obstacle::new(Shape::Plane { point, normal }, layers));
    }

    /// Add a solid axis-aligned box
    pub fn add_box(&mut self, min: Vec3, max: Vec3, layers: ObstacleMask) {
        self.add(Obstacle::new(Shape::Aabb { min, max }, layers));
    }

    /// Number of obstacles
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Check if the field has no obstacles
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Remove every obstacle
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Obstacles in insertion order
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl CollisionProbe for ObstacleField {
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f64,
        max_distance: f64,
        mask: ObstacleMask,
    ) -> Result<Option<f64>, ProbeError> {
        if !origin.is_valid() || !radius.is_finite() || !max_distance.is_finite() {
            return Err(ProbeError::InvalidQuery(format!(
                "non-finite cast from {:?} (radius {}, distance {})",
                origin, radius, max_distance
            )));
        }
        let direction = direction.try_normalize().ok_or_else(|| {
            ProbeError::InvalidQuery(format!("degenerate cast direction {:?}", direction))
        })?;

        let mut nearest: Option<f64> = None;
        for (index, obstacle) in self.obstacles.iter().enumerate() {
            if !obstacle.layers.intersects(mask) {
                continue;
            }
            if !obstacle.shape.is_valid() {
                return Err(ProbeError::InvalidGeometry { index });
            }
            if let Some(distance) = obstacle.shape.sphere_cast(origin, direction, radius) {
                if distance <= max_distance && nearest.map_or(true, |n| distance < n) {
                    nearest = Some(distance);
                }
            }
        }

        Ok(nearest)
    }
}

/// Obstacle field shared with a host that edits it between ticks
///
/// Queries take a read lock. If a writer panicked while holding the lock the
/// geometry is reported as unavailable.
#[derive(Debug, Clone, Default)]
pub struct SharedObstacleField {
    inner: Arc<RwLock<ObstacleField>>,
}

impl SharedObstacleField {
    /// Wrap an obstacle field for sharing
    pub fn new(field: ObstacleField) -> Self {
        SharedObstacleField {
            inner: Arc::new(RwLock::new(field)),
        }
    }

    /// Handle to the underlying lock for editing
    pub fn handle(&self) -> Arc<RwLock<ObstacleField>> {
        Arc::clone(&self.inner)
    }
}

impl CollisionProbe for SharedObstacleField {
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f64,
        max_distance: f64,
        mask: ObstacleMask,
    ) -> Result<Option<f64>, ProbeError> {
        let field = self
            .inner
            .read()
            .map_err(|_| ProbeError::GeometryUnavailable)?;
        field.sphere_cast(origin, direction, radius, max_distance, mask)
    }
}
