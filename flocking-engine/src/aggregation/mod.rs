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
//! Neighbor aggregation (the "aggregate" phase of a tick)
//!
//! For every agent `i` the aggregator sums data over the other agents `j`:
//!
//! | Field               | Predicate                    | Contribution              |
//! |---------------------|------------------------------|---------------------------|
//! | `perceived_count`   | `d(i, j) < perception_radius`| `1`                       |
//! | `flock_heading`     | `d(i, j) < perception_radius`| `heading[j]`              |
//! | `flock_centre`      | `d(i, j) < perception_radius`| `position[j]`             |
//! | `avoidance_heading` | `d(i, j) < avoidance_radius` | `(pos[i] - pos[j]) / d²`  |
//!
//! Identity, not distance, excludes an agent from its own sums, so two
//! agents at the same position still perceive each other. Such a pair adds
//! nothing to `avoidance_heading` because the push has no direction.
//!
//! # Parallel Computation
//!
//! Each agent's summary depends only on the read-only snapshot of all agents,
//! so the pass is embarrassingly parallel. With the `parallel` feature the
//! output buffer is filled with Rayon; otherwise it is filled sequentially.
//! Both produce identical summaries.
//!
//! # Strategies
//!
//! - [`AggregationStrategy::AllPairs`]: O(N²) scan, best for small flocks.
//! - [`AggregationStrategy::UniformGrid`]: buckets agents into a
//!   [`SpatialGrid`] with cells as wide as the largest radius and scans only
//!   neighboring cells. The exact radius predicates are applied to every
//!   candidate, so the perceived sets match the all-pairs scan.

mod grid;

pub use grid::SpatialGrid;

use crate::flock::{Agent, SimulationSettings};
use crate::math::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-tick neighbor data for one agent
///
/// Produced fresh by the aggregate phase and consumed by the integrate
/// phase of the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborSummary {
    /// Sum of the headings of perceived flockmates
    pub flock_heading: Vec3,
    /// Sum of the positions of perceived flockmates
    pub flock_centre: Vec3,
    /// Inverse-square weighted push away from agents inside the avoidance radius
    pub avoidance_heading: Vec3,
    /// Number of perceived flockmates
    pub perceived_count: usize,
}

impl NeighborSummary {
    /// Centroid of the perceived flockmates, if there are any
    pub fn centroid(&self) -> Option<Vec3> {
        if self.perceived_count > 0 {
            Some(self.flock_centre / self.perceived_count as f64)
        } else {
            None
        }
    }

    /// Check if no flockmate was perceived
    pub fn is_alone(&self) -> bool {
        self.perceived_count == 0
    }

    fn accumulate(&mut self, me: &Agent, other: &Agent, perception_sq: f64, avoidance_sq: f64) {
        let offset = me.position() - other.position();
        let dist_sq = offset.length_squared();

        if dist_sq < perception_sq {
            self.perceived_count += 1;
            self.flock_heading += other.heading();
            self.flock_centre += other.position();
        }

        if dist_sq < avoidance_sq && dist_sq > 0.0 {
            self.avoidance_heading += offset / dist_sq;
        }
    }
}

/// How candidate neighbors are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationStrategy {
    /// Compare every agent with every other agent
    #[default]
    AllPairs,
    /// Bucket agents into a hashed uniform grid first
    UniformGrid,
}

/// Computes [`NeighborSummary`] values for a whole flock
///
/// # Examples
///
/// ```
/// use flocking_engine::aggregation::{AggregationStrategy, NeighborAggregator};
/// use flocking_engine::flock::{Agent, SimulationSettings};
/// use flocking_engine::math::Vec3;
///
/// let settings = SimulationSettings::default().with_radii(2.0, 1.0);
/// let agents = vec![
///     Agent::spawn(Vec3::ZERO, Vec3::Z, &settings),
///     Agent::spawn(Vec3::new(1.5, 0.0, 0.0), Vec3::Z, &settings),
///     Agent::spawn(Vec3::new(50.0, 0.0, 0.0), Vec3::Z, &settings),
/// ];
///
/// let mut aggregator = NeighborAggregator::new(AggregationStrategy::UniformGrid);
/// let mut summaries = Vec::new();
/// aggregator.aggregate(&agents, &settings, &mut summaries);
///
/// assert_eq!(summaries[0].perceived_count, 1);
/// assert_eq!(summaries[2].perceived_count, 0);
/// ```
#[derive(Debug, Clone)]
pub struct NeighborAggregator {
    strategy: AggregationStrategy,
    grid: SpatialGrid,
    min_chunk_len: usize,
}

impl NeighborAggregator {
    /// Default minimum number of agents handled per parallel work item
    pub const DEFAULT_MIN_CHUNK_LEN: usize = 32;

    /// Create an aggregator using the given strategy
    pub fn new(strategy: AggregationStrategy) -> Self {
        NeighborAggregator {
            strategy,
            grid: SpatialGrid::new(1.0),
            min_chunk_len: Self::DEFAULT_MIN_CHUNK_LEN,
        }
    }

    /// Active strategy
    pub fn strategy(&self) -> AggregationStrategy {
        self.strategy
    }

    /// Switch strategy
    pub fn set_strategy(&mut self, strategy: AggregationStrategy) {
        self.strategy = strategy;
    }

    /// Set the minimum number of agents per parallel work item
    ///
    /// Larger values reduce scheduling overhead but may cause load
    /// imbalance. Has no effect without the `parallel` feature.
    pub fn set_min_chunk_len(&mut self, len: usize) {
        self.min_chunk_len = len.max(1);
    }

    /// Summarize the neighborhood of every agent
    ///
    /// `out` is cleared and refilled with exactly one summary per agent, in
    /// agent order. Its allocation is reused across calls.
    pub fn aggregate(
        &mut self,
        agents: &[Agent],
        settings: &SimulationSettings,
        out: &mut Vec<NeighborSummary>,
    ) {
        out.clear();
        out.resize(agents.len(), NeighborSummary::default());

        if agents.is_empty() {
            return;
        }

        let perception_sq = settings.perception_radius * settings.perception_radius;
        let avoidance_sq = settings.avoidance_radius * settings.avoidance_radius;
        let radius = settings.interaction_radius();

        match self.strategy {
            AggregationStrategy::AllPairs => {
                self.fill(out, |i| {
                    let me = &agents[i];
                    let mut summary = NeighborSummary::default();
                    for (j, other) in agents.iter().enumerate() {
                        if j != i {
                            summary.accumulate(me, other, perception_sq, avoidance_sq);
                        }
                    }
                    summary
                });
            }
            AggregationStrategy::UniformGrid => {
                self.grid.set_cell_size(radius);
                self.grid.rebuild(agents.iter().map(Agent::position));

                let grid = &self.grid;
                self.fill(out, |i| {
                    let me = &agents[i];
                    let mut summary = NeighborSummary::default();
                    grid.for_each_candidate(me.position(), radius, |j| {
                        if j != i {
                            summary.accumulate(me, &agents[j], perception_sq, avoidance_sq);
                        }
                    });
                    summary
                });
            }
        }

        log::trace!(
            "Aggregated neighbors for {} agents ({:?})",
            agents.len(),
            self.strategy
        );
    }

    /// Convenience wrapper returning a freshly allocated buffer
    pub fn summarize(
        &mut self,
        agents: &[Agent],
        settings: &SimulationSettings,
    ) -> Vec<NeighborSummary> {
        let mut out = Vec::with_capacity(agents.len());
        self.aggregate(agents, settings, &mut out);
        out
    }

    #[cfg(feature = "parallel")]
    fn fill<F>(&self, out: &mut [NeighborSummary], summarize: F)
    where
        F: Fn(usize) -> NeighborSummary + Sync,
    {
        out.par_iter_mut()
            .with_min_len(self.min_chunk_len)
            .enumerate()
            .for_each(|(i, slot)| *slot = summarize(i));
    }

    #[cfg(not(feature = "parallel"))]
    fn fill<F>(&self, out: &mut [NeighborSummary], summarize: F)
    where
        F: Fn(usize) -> NeighborSummary + Sync,
    {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = summarize(i);
        }
    }
}

impl Default for NeighborAggregator {
    fn default() -> Self {
        Self::new(AggregationStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at(x: f64, y: f64, z: f64, heading: Vec3) -> Agent {
        Agent::with_state(Vec3::new(x, y, z), heading, heading * 3.0)
    }

    fn settings() -> SimulationSettings {
        SimulationSettings::default().with_radii(2.0, 1.0)
    }

    #[test]
    fn test_lone_agent_has_no_neighbors() {
        let agents = vec![agent_at(0.0, 0.0, 0.0, Vec3::X)];
        let summaries = NeighborAggregator::default().summarize(&agents, &settings());

        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].is_alone());
        assert_eq!(summaries[0].centroid(), None);
        assert_eq!(summaries[0], NeighborSummary::default());
    }

    #[test]
    fn test_pair_within_perception() {
        let agents = vec![
            agent_at(0.0, 0.0, 0.0, Vec3::X),
            agent_at(1.5, 0.0, 0.0, Vec3::Y),
        ];
        let summaries = NeighborAggregator::default().summarize(&agents, &settings());

        assert_eq!(summaries[0].perceived_count, 1);
        assert_eq!(summaries[0].flock_heading, Vec3::Y);
        assert_eq!(summaries[0].flock_centre, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(summaries[0].centroid(), Some(Vec3::new(1.5, 0.0, 0.0)));
        // Outside the avoidance radius
        assert_eq!(summaries[0].avoidance_heading, Vec3::ZERO);

        assert_eq!(summaries[1].perceived_count, 1);
        assert_eq!(summaries[1].flock_heading, Vec3::X);
    }

    #[test]
    fn test_avoidance_is_inverse_square_weighted() {
        let agents = vec![
            agent_at(0.0, 0.0, 0.0, Vec3::X),
            agent_at(0.5, 0.0, 0.0, Vec3::X),
        ];
        let summaries = NeighborAggregator::default().summarize(&agents, &settings());

        // (p0 - p1) / d² = (-0.5, 0, 0) / 0.25
        assert_eq!(summaries[0].avoidance_heading, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(summaries[1].avoidance_heading, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let agents = vec![
            agent_at(0.0, 0.0, 0.0, Vec3::X),
            agent_at(2.0, 0.0, 0.0, Vec3::X),
        ];
        let summaries = NeighborAggregator::default().summarize(&agents, &settings());
        assert_eq!(summaries[0].perceived_count, 0);
    }

    #[test]
    fn test_coincident_agents() {
        let agents = vec![
            agent_at(1.0, 1.0, 1.0, Vec3::X),
            agent_at(1.0, 1.0, 1.0, Vec3::Z),
        ];
        let summaries = NeighborAggregator::default().summarize(&agents, &settings());

        assert_eq!(summaries[0].perceived_count, 1);
        assert_eq!(summaries[0].flock_heading, Vec3::Z);
        assert_eq!(summaries[0].avoidance_heading, Vec3::ZERO);
        assert!(summaries[0].avoidance_heading.is_valid());
    }

    #[test]
    fn test_avoidance_radius_independent_of_perception() {
        let wide_avoidance = SimulationSettings::default().with_radii(1.0, 3.0);
        let agents = vec![
            agent_at(0.0, 0.0, 0.0, Vec3::X),
            agent_at(2.0, 0.0, 0.0, Vec3::X),
        ];
        let summaries = NeighborAggregator::default().summarize(&agents, &wide_avoidance);

        assert_eq!(summaries[0].perceived_count, 0);
        assert_eq!(summaries[0].avoidance_heading, Vec3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn test_buffer_is_fully_overwritten() {
        let mut aggregator = NeighborAggregator::default();
        let mut out = vec![
            NeighborSummary {
                perceived_count: 99,
                ..Default::default()
            };
            5
        ];

        let agents = vec![
            agent_at(0.0, 0.0, 0.0, Vec3::X),
            agent_at(100.0, 0.0, 0.0, Vec3::X),
        ];
        aggregator.aggregate(&agents, &settings(), &mut out);

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.perceived_count == 0));
    }

    #[test]
    fn test_empty_flock() {
        let mut aggregator = NeighborAggregator::new(AggregationStrategy::UniformGrid);
        let mut out = vec![NeighborSummary::default(); 3];
        aggregator.aggregate(&[], &settings(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_grid_matches_all_pairs() {
        let settings = settings();
        let mut agents = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                for k in 0..3 {
                    let heading = Vec3::new(i as f64, j as f64 + 1.0, k as f64).normalize_or_zero();
                    agents.push(agent_at(i as f64 * 0.9, j as f64 * 1.3, k as f64 * 0.7, heading));
                }
            }
        }

        let brute = NeighborAggregator::new(AggregationStrategy::AllPairs).summarize(&agents, &settings);
        let mut grid_aggregator = NeighborAggregator::new(AggregationStrategy::UniformGrid);
        grid_aggregator.set_min_chunk_len(4);
        let grid = grid_aggregator.summarize(&agents, &settings);

        for (a, b) in brute.iter().zip(grid.iter()) {
            assert_eq!(a.perceived_count, b.perceived_count);
            assert!((a.flock_heading - b.flock_heading).length() < 1e-9);
            assert!((a.flock_centre - b.flock_centre).length() < 1e-9);
            assert!((a.avoidance_heading - b.avoidance_heading).length() < 1e-9);
        }
    }

    #[test]
    fn test_strategy_switch() {
        let mut aggregator = NeighborAggregator::default();
        assert_eq!(aggregator.strategy(), AggregationStrategy::AllPairs);
        aggregator.set_strategy(AggregationStrategy::UniformGrid);
        assert_eq!(aggregator.strategy(), AggregationStrategy::UniformGrid);
    }
}
