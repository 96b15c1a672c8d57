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
//! Probe directions and agent-local frames
//!
//! Obstacle avoidance tries a fixed table of unit directions, expressed in
//! the agent's local frame (+Z forward, +Y up, +X right), in a fixed order.
//!
//! # Direction table
//!
//! The table is a Fibonacci (golden spiral) sphere: direction `i` of `n` has
//!
//! ```text
//! inclination = acos(1 - 2i/n)
//! azimuth     = 2π · φ · i        where φ = (1 + √5) / 2
//! ```
//!
//! Direction 0 is straight ahead and later directions sweep progressively
//! further back, so the first clear direction found is also the one closest
//! to the current heading.

use crate::math::Vec3;

/// Precomputed, evenly distributed unit directions in local space
#[derive(Debug, Clone, PartialEq)]
pub struct RayDirections {
    directions: Vec<Vec3>,
}

impl RayDirections {
    /// Build a Fibonacci-sphere table with `count` directions
    pub fn fibonacci(count: usize) -> Self {
        let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let angle_increment = std::f64::consts::TAU * golden_ratio;

        let directions = (0..count)
            .map(|i| {
                let t = i as f64 / count as f64;
                let inclination = (1.0 - 2.0 * t).acos();
                let azimuth = angle_increment * i as f64;

                Vec3::new(
                    inclination.sin() * azimuth.cos(),
                    inclination.sin() * azimuth.sin(),
                    inclination.cos(),
                )
            })
            .collect();

        RayDirections { directions }
    }

    /// Number of directions in the table
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Directions in priority order
    pub fn as_slice(&self) -> &[Vec3] {
        &self.directions
    }

    /// Iterate over directions in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.directions.iter()
    }
}

impl Default for RayDirections {
    fn default() -> Self {
        RayDirections::fibonacci(crate::flock::DEFAULT_RAY_COUNT)
    }
}

/// Orthonormal frame attached to an agent
///
/// Local +Z maps to the agent's heading. The frame is built against world
/// +Y as the reference up axis, switching to world +Z when the heading is
/// (nearly) vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

impl LocalFrame {
    /// Build the frame for a heading
    ///
    /// A degenerate heading yields the identity frame.
    pub fn from_heading(heading: Vec3) -> Self {
        let forward = match heading.try_normalize() {
            Some(f) => f,
            None => return LocalFrame::identity(),
        };

        let reference_up = if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = reference_up.cross(forward).normalize_or_zero();
        let up = forward.cross(right);

        LocalFrame { right, up, forward }
    }

    /// The world-aligned frame
    pub fn identity() -> Self {
        LocalFrame {
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
        }
    }

    /// World-space forward axis
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// World-space up axis
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// World-space right axis
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Transform a local direction into world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.right * local.x + self.up * local.y + self.forward * local.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_directions_are_unit() {
        let table = RayDirections::fibonacci(300);
        assert_eq!(table.len(), 300);
        assert!(!table.is_empty());
        for dir in table.iter() {
            assert!((dir.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_first_direction_is_forward() {
        let table = RayDirections::fibonacci(16);
        assert_eq!(table.as_slice()[0], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_directions_sweep_backwards() {
        let table = RayDirections::fibonacci(100);
        let zs: Vec<f64> = table.iter().map(|d| d.z).collect();
        assert!(zs.windows(2).all(|w| w[1] <= w[0]));
        assert!(zs[99] < -0.9);
    }

    #[test]
    fn test_directions_cover_sphere() {
        let table = RayDirections::fibonacci(300);
        let centroid: Vec3 = table.iter().copied().sum::<Vec3>() / table.len() as f64;
        // Evenly distributed directions roughly cancel out
        assert!(centroid.length() < 0.05);
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let frame = LocalFrame::from_heading(Vec3::new(1.0, 2.0, -0.5));
        for axis in [frame.right(), frame.up(), frame.forward()] {
            assert!((axis.length() - 1.0).abs() < 1e-12);
        }
        assert!(frame.right().dot(frame.up()).abs() < 1e-12);
        assert!(frame.right().dot(frame.forward()).abs() < 1e-12);
        assert!(frame.up().dot(frame.forward()).abs() < 1e-12);
    }

    #[test]
    fn test_frame_maps_local_forward_to_heading() {
        let heading = Vec3::new(0.0, 0.0, -1.0);
        let frame = LocalFrame::from_heading(heading);
        let world = frame.to_world(Vec3::Z);
        assert!((world - heading).length() < 1e-12);
    }

    #[test]
    fn test_world_aligned_heading_gives_identity() {
        let frame = LocalFrame::from_heading(Vec3::Z);
        assert_eq!(frame, LocalFrame::identity());
    }

    #[test]
    fn test_vertical_heading() {
        let frame = LocalFrame::from_heading(Vec3::Y);
        assert!((frame.forward() - Vec3::Y).length() < 1e-12);
        assert!((frame.right().length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_heading() {
        assert_eq!(LocalFrame::from_heading(Vec3::ZERO), LocalFrame::identity());
    }
}
