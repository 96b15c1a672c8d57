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
//! Shared steering target

use crate::math::Vec3;

/// A point every agent steers toward
///
/// The target is read-only during a tick. Hosts move it between ticks
/// through [`Simulation::target_mut`](crate::simulation::Simulation::target_mut).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    position: Vec3,
}

impl Target {
    /// Create a target at the given position
    pub fn new(position: Vec3) -> Self {
        Target { position }
    }

    /// Current target position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the target
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Offset from `from` to the target
    pub fn offset_from(&self, from: Vec3) -> Vec3 {
        self.position - from
    }
}

impl From<Vec3> for Target {
    fn from(position: Vec3) -> Self {
        Target::new(position)
    }
}
