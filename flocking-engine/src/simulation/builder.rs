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
//! Fluent builder for constructing a [`Simulation`]

use super::{SimResult, Simulation, SimulationError};
use crate::aggregation::AggregationStrategy;
use crate::collision::{CollisionProbe, NoObstacles};
use crate::flock::{Agent, SimulationSettings, Target};
use crate::math::Vec3;
use crate::spawner::Spawner;

/// Fluent builder for [`Simulation<P>`]
///
/// # Optional inputs
///
/// | Method          | Default                       |
/// |-----------------|-------------------------------|
/// | `.agents(v)`    | No agents                     |
/// | `.spawn(s)`     | No agents                     |
/// | `.target(t)`    | No target                     |
/// | `.probe(p)`     | [`NoObstacles`]               |
/// | `.strategy(s)`  | [`AggregationStrategy::AllPairs`] |
///
/// Settings and initial agents are validated by [`build`](Self::build);
/// nothing is checked while the builder is being filled.
pub struct SimulationBuilder<P: CollisionProbe = NoObstacles> {
    settings: SimulationSettings,
    agents: Vec<Agent>,
    target: Option<Target>,
    probe: P,
    strategy: AggregationStrategy,
}

impl SimulationBuilder<NoObstacles> {
    /// Create a builder with no agents and no obstacles
    pub fn new(settings: SimulationSettings) -> Self {
        SimulationBuilder {
            settings,
            agents: Vec::new(),
            target: None,
            probe: NoObstacles,
            strategy: AggregationStrategy::default(),
        }
    }
}

impl<P: CollisionProbe> SimulationBuilder<P> {
    /// Append pre-built agents
    pub fn agents<I: IntoIterator<Item = Agent>>(mut self, agents: I) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Append one agent
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Append an agent at `position` travelling along `facing`
    pub fn spawn_at(mut self, position: Vec3, facing: Vec3) -> Self {
        let agent = Agent::spawn(position, facing, &self.settings);
        self.agents.push(agent);
        self
    }

    /// Append the agents produced by `spawner`
    pub fn spawn(mut self, spawner: &Spawner) -> Self {
        let spawned = spawner.spawn(&self.settings);
        self.agents.extend(spawned);
        self
    }

    /// Steer every agent toward `target`
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Query obstacles through `probe`
    pub fn probe<Q: CollisionProbe>(self, probe: Q) -> SimulationBuilder<Q> {
        SimulationBuilder {
            settings: self.settings,
            agents: self.agents,
            target: self.target,
            probe,
            strategy: self.strategy,
        }
    }

    /// Select the neighbor search strategy
    pub fn strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validate inputs and return a ready-to-run [`Simulation`]
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Settings`] if the settings are malformed
    /// - [`SimulationError::InvalidAgent`] if an initial state is not finite
    pub fn build(self) -> SimResult<Simulation<P>> {
        self.settings.validate()?;

        if let Some(index) = self.agents.iter().position(|agent| !agent.is_valid()) {
            return Err(SimulationError::InvalidAgent { index });
        }
        if let Some(target) = &self.target {
            if !target.position().is_valid() {
                log::warn!("Target position {:?} is not finite; it will exert no pull", target.position());
            }
        }

        log::info!(
            "Created simulation with {} agents ({:?} neighbor search, {} probe directions)",
            self.agents.len(),
            self.strategy,
            self.settings.ray_count
        );

        Ok(Simulation::from_parts(
            self.settings,
            self.agents,
            self.target,
            self.probe,
            self.strategy,
        ))
    }
}
