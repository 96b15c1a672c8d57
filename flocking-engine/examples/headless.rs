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
//! Headless flock example
//!
//! Runs a flock chasing a moving target with a fixed timestep and prints a
//! short summary every simulated second. Set `RUST_LOG=debug` to see the
//! per-tick log lines.

use flocking_engine::aggregation::AggregationStrategy;
use flocking_engine::flock::{SimulationSettings, Target};
use flocking_engine::math::Vec3;
use flocking_engine::simulation::{SimResult, Simulation};
use flocking_engine::spawner::Spawner;

const DT: f64 = 1.0 / 60.0;
const SECONDS: usize = 10;

fn main() -> SimResult<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("Flocking Engine - Headless Example");
    println!("==================================\n");

    let settings = SimulationSettings::default().with_radii(3.0, 1.0);
    let mut sim = Simulation::builder(settings)
        .spawn(&Spawner::new(Vec3::ZERO, 10.0, 500).with_seed(2025))
        .target(Target::new(Vec3::ZERO))
        .strategy(AggregationStrategy::UniformGrid)
        .build()?;

    for second in 1..=SECONDS {
        // Target circles the origin once every ten seconds
        let angle = std::f64::consts::TAU * second as f64 / SECONDS as f64;
        if let Some(target) = sim.target_mut() {
            target.set_position(Vec3::new(angle.cos() * 15.0, 0.0, angle.sin() * 15.0));
        }

        sim.run(60, DT)?;

        let agents = sim.agents();
        let centre: Vec3 = agents.iter().map(|a| a.position()).sum::<Vec3>() / agents.len() as f64;
        let heading: Vec3 = agents.iter().map(|a| a.heading()).sum();
        let mean_neighbors = sim
            .summaries()
            .iter()
            .map(|s| s.perceived_count as f64)
            .sum::<f64>()
            / agents.len() as f64;

        println!(
            "t={:>2}s  centre=({:>6.2}, {:>6.2}, {:>6.2})  polarization={:.3}  neighbors={:.1}",
            second,
            centre.x,
            centre.y,
            centre.z,
            heading.length() / agents.len() as f64,
            mean_neighbors
        );
    }

    println!("\nCompleted {} ticks", sim.tick_count());
    Ok(())
}
