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
//! Uniform hashed grid for neighbor candidate lookup
//!
//! Space is split into cubic cells of a fixed edge length and each agent is
//! bucketed by the cell containing its position. A radius query visits every
//! cell the query sphere's bounding cube overlaps and yields all agents in
//! them. Candidates are a superset of the true neighbors; callers apply the
//! exact distance predicate themselves.

use crate::math::Vec3;
use std::collections::HashMap;

const MIN_CELL_SIZE: f64 = 1e-6;

type CellKey = (i64, i64, i64);

/// Hashed uniform grid over agent indices
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid with the given cell edge length
    pub fn new(cell_size: f64) -> Self {
        SpatialGrid {
            cell_size: sanitize_cell_size(cell_size),
            cells: HashMap::new(),
        }
    }

    /// Edge length of a cell
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Change the cell edge length (takes effect on the next rebuild)
    pub fn set_cell_size(&mut self, cell_size: f64) {
        self.cell_size = sanitize_cell_size(cell_size);
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|bucket| !bucket.is_empty()).count()
    }

    /// Re-bucket every position
    ///
    /// Bucket allocations are kept between rebuilds; buckets that end up
    /// empty are dropped.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }

        for (index, position) in positions.into_iter().enumerate() {
            let key = self.cell_of(position);
            self.cells.entry(key).or_default().push(index);
        }

        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Visit every agent index in cells overlapping the query sphere
    pub fn for_each_candidate<F>(&self, centre: Vec3, radius: f64, mut visit: F)
    where
        F: FnMut(usize),
    {
        let radius = radius.max(0.0);
        let lo = self.cell_of(centre - Vec3::splat(radius));
        let hi = self.cell_of(centre + Vec3::splat(radius));

        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                for cz in lo.2..=hi.2 {
                    if let Some(bucket) = self.cells.get(&(cx, cy, cz)) {
                        for &index in bucket {
                            visit(index);
                        }
                    }
                }
            }
        }
    }

    fn cell_of(&self, position: Vec3) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }
}

fn sanitize_cell_size(cell_size: f64) -> f64 {
    if cell_size.is_finite() {
        cell_size.max(MIN_CELL_SIZE)
    } else {
        MIN_CELL_SIZE
    }
}
