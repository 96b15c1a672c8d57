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
//! Two-phase simulation loop
//!
//! Each call to [`Simulation::tick`] runs:
//!
//! 1. **Aggregate**: every agent's [`NeighborSummary`] is computed from the
//!    committed agent states of the previous tick.
//! 2. **Integrate**: every agent is stepped by the [`SteeringEngine`] using
//!    only its own state and summary. New states go to a separate buffer.
//! 3. **Commit**: the new states replace the old ones all at once.
//!
//! Both phases run in parallel with the `parallel` feature. A phase finishes
//! for all agents before the next one starts, so no agent ever observes
//! another agent's state from the same tick.
//!
//! The loop has no notion of wall-clock time; the driver passes `dt`.

mod builder;

pub use builder::SimulationBuilder;

use crate::aggregation::{AggregationStrategy, NeighborAggregator, NeighborSummary};
use crate::collision::{CollisionProbe, NoObstacles, RayDirections};
use crate::flock::{Agent, AgentId, SettingsError, SimulationSettings, Target};
use crate::steering::{SteeringEngine, SteeringStep};
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Errors reported by the simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Settings were rejected at construction
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// `dt` was zero, negative or not finite
    #[error("invalid timestep {0}: must be positive and finite")]
    InvalidTimestep(f64),

    /// No agent with this id exists
    #[error("{0} not found")]
    AgentNotFound(AgentId),

    /// An initial agent state contained non-finite values
    #[error("agent at index {index} has a non-finite initial state")]
    InvalidAgent {
        /// Index of the offending agent
        index: usize,
    },
}

/// Result alias for simulation operations
pub type SimResult<T> = Result<T, SimulationError>;

/// Statistics for one completed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Tick number, starting at 1 for the first tick
    pub tick: u64,
    /// Number of agents stepped
    pub agent_count: usize,
    /// Agents that steered around an obstacle this tick
    pub avoiding_collision: usize,
    /// Agents whose new state was non-finite and was discarded
    pub rejected_states: usize,
}

/// A flock advancing in discrete ticks
///
/// # Examples
///
/// ```
/// use flocking_engine::flock::SimulationSettings;
/// use flocking_engine::simulation::Simulation;
/// use flocking_engine::spawner::Spawner;
/// use flocking_engine::math::Vec3;
///
/// let mut sim = Simulation::builder(SimulationSettings::default())
///     .spawn(&Spawner::new(Vec3::ZERO, 5.0, 50).with_seed(1))
///     .build()
///     .unwrap();
///
/// let report = sim.tick(1.0 / 60.0).unwrap();
/// assert_eq!(report.agent_count, 50);
/// assert_eq!(sim.tick_count(), 1);
/// ```
pub struct Simulation<P: CollisionProbe = NoObstacles> {
    settings: SimulationSettings,
    agents: Vec<Agent>,
    target: Option<Target>,
    probe: P,
    directions: RayDirections,
    aggregator: NeighborAggregator,
    summaries: Vec<NeighborSummary>,
    steps: Vec<SteeringStep>,
    tick_count: u64,
}

impl Simulation<NoObstacles> {
    /// Start building a simulation with the given settings
    pub fn builder(settings: SimulationSettings) -> SimulationBuilder<NoObstacles> {
        SimulationBuilder::new(settings)
    }

    /// Create an obstacle-free simulation from initial agents
    pub fn new(settings: SimulationSettings, agents: Vec<Agent>) -> SimResult<Self> {
        SimulationBuilder::new(settings).agents(agents).build()
    }
}

impl<P: CollisionProbe> Simulation<P> {
    pub(crate) fn from_parts(
        settings: SimulationSettings,
        agents: Vec<Agent>,
        target: Option<Target>,
        probe: P,
        strategy: AggregationStrategy,
    ) -> Self {
        let directions = RayDirections::fibonacci(settings.ray_count);
        let agent_count = agents.len();
        Simulation {
            settings,
            agents,
            target,
            probe,
            directions,
            aggregator: NeighborAggregator::new(strategy),
            summaries: Vec::with_capacity(agent_count),
            steps: Vec::with_capacity(agent_count),
            tick_count: 0,
        }
    }

    /// Advance every agent by `dt`
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTimestep`] if `dt` is not positive
    /// and finite. No state is modified in that case.
    pub fn tick(&mut self, dt: f64) -> SimResult<TickReport> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimulationError::InvalidTimestep(dt));
        }

        self.tick_count += 1;
        let mut report = TickReport {
            tick: self.tick_count,
            agent_count: self.agents.len(),
            ..TickReport::default()
        };

        if self.agents.is_empty() {
            return Ok(report);
        }

        // Phase 1: aggregate over the committed snapshot
        self.aggregator
            .aggregate(&self.agents, &self.settings, &mut self.summaries);
        log::trace!("Tick {}: aggregate phase complete", self.tick_count);

        // Phase 2: integrate into a separate buffer
        let engine = SteeringEngine::new(&self.settings, &self.probe, &self.directions);
        let target = self.target.as_ref();
        integrate_all(&engine, &self.agents, &self.summaries, target, dt, &mut self.steps);
        log::trace!("Tick {}: integrate phase complete", self.tick_count);

        // Phase 3: commit
        for (index, (agent, step)) in self.agents.iter_mut().zip(self.steps.iter()).enumerate() {
            if step.avoided_collision {
                report.avoiding_collision += 1;
            }
            if step.state.is_valid() {
                *agent = step.state;
            } else {
                report.rejected_states += 1;
                log::warn!(
                    "Discarding non-finite state for {} at tick {}",
                    AgentId::new(index),
                    self.tick_count
                );
            }
        }

        log::debug!(
            "Tick {} complete: {} agents, {} avoiding obstacles, {} rejected",
            report.tick,
            report.agent_count,
            report.avoiding_collision,
            report.rejected_states
        );

        Ok(report)
    }

    /// Run `ticks` consecutive ticks with the same `dt`
    ///
    /// Returns the report of the last tick (or a default report when
    /// `ticks` is zero).
    pub fn run(&mut self, ticks: usize, dt: f64) -> SimResult<TickReport> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimulationError::InvalidTimestep(dt));
        }

        let mut last = TickReport {
            tick: self.tick_count,
            agent_count: self.agents.len(),
            ..TickReport::default()
        };
        for _ in 0..ticks {
            last = self.tick(dt)?;
        }
        Ok(last)
    }

    /// All agents in id order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Number of agents
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Look up one agent
    pub fn agent(&self, id: AgentId) -> SimResult<&Agent> {
        self.agents
            .get(id.index())
            .ok_or(SimulationError::AgentNotFound(id))
    }

    /// Neighbor summaries computed during the last tick
    ///
    /// Empty before the first tick.
    pub fn summaries(&self) -> &[NeighborSummary] {
        &self.summaries
    }

    /// Steering target, if any
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Mutable access to the target (e.g. to move it between ticks)
    pub fn target_mut(&mut self) -> Option<&mut Target> {
        self.target.as_mut()
    }

    /// Replace or remove the target
    pub fn set_target(&mut self, target: Option<Target>) {
        self.target = target;
    }

    /// Settings of this run
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Obstacle probe
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Mutable access to the obstacle probe between ticks
    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    /// Direction table used for obstacle avoidance
    pub fn ray_directions(&self) -> &RayDirections {
        &self.directions
    }

    /// Active neighbor search strategy
    pub fn strategy(&self) -> AggregationStrategy {
        self.aggregator.strategy()
    }

    /// Switch neighbor search strategy between ticks
    pub fn set_strategy(&mut self, strategy: AggregationStrategy) {
        self.aggregator.set_strategy(strategy);
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(feature = "parallel")]
fn integrate_all<P: CollisionProbe>(
    engine: &SteeringEngine<'_, P>,
    agents: &[Agent],
    summaries: &[NeighborSummary],
    target: Option<&Target>,
    dt: f64,
    out: &mut Vec<SteeringStep>,
) {
    agents
        .par_iter()
        .zip(summaries.par_iter())
        .map(|(agent, summary)| engine.step_agent(agent, summary, target, dt))
        .collect_into_vec(out);
}

#[cfg(not(feature = "parallel"))]
fn integrate_all<P: CollisionProbe>(
    engine: &SteeringEngine<'_, P>,
    agents: &[Agent],
    summaries: &[NeighborSummary],
    target: Option<&Target>,
    dt: f64,
    out: &mut Vec<SteeringStep>,
) {
    out.clear();
    out.extend(
        agents
            .iter()
            .zip(summaries.iter())
            .map(|(agent, summary)| engine.step_agent(agent, summary, target, dt)),
    );
}
