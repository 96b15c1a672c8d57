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
//! Flock inside a box with a pillar
//!
//! Demonstrates obstacle layers and editing shared geometry between ticks:
//! the walls live on one layer, a central pillar on another, and the pillar
//! is removed halfway through the run.

use flocking_engine::collision::{ObstacleField, ObstacleMask, SharedObstacleField};
use flocking_engine::flock::SimulationSettings;
use flocking_engine::math::Vec3;
use flocking_engine::simulation::{SimResult, Simulation};
use flocking_engine::spawner::Spawner;

const WALLS: ObstacleMask = ObstacleMask::layer(0);
const PILLARS: ObstacleMask = ObstacleMask::layer(1);
const BOX_SIZE: f64 = 40.0;

fn main() -> SimResult<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("Flocking Engine - Walled Flock Example");
    println!("======================================\n");

    let mut field = ObstacleField::bounding_box(Vec3::ZERO, BOX_SIZE, WALLS);
    field.add_box(Vec3::new(-2.0, -20.0, -2.0), Vec3::new(2.0, 20.0, 2.0), PILLARS);
    let shared = SharedObstacleField::new(field);
    let geometry = shared.handle();

    let settings = SimulationSettings::default().with_obstacle_mask(WALLS.union(PILLARS));
    let mut sim = Simulation::builder(settings)
        .spawn(&Spawner::new(Vec3::new(10.0, 0.0, 10.0), 5.0, 200).with_seed(7))
        .probe(shared)
        .build()?;

    for second in 1..=20 {
        if second == 10 {
            match geometry.write() {
                Ok(mut field) => {
                    *field = ObstacleField::bounding_box(Vec3::ZERO, BOX_SIZE, WALLS);
                    println!("-- pillar removed --");
                }
                Err(_) => log::error!("Obstacle geometry lock poisoned"),
            }
        }

        let mut avoiding = 0;
        for _ in 0..60 {
            avoiding += sim.tick(1.0 / 60.0)?.avoiding_collision;
        }

        let outside = sim
            .agents()
            .iter()
            .filter(|a| {
                let p = a.position();
                p.x.abs() > BOX_SIZE / 2.0 || p.y.abs() > BOX_SIZE / 2.0 || p.z.abs() > BOX_SIZE / 2.0
            })
            .count();

        println!(
            "t={:>2}s  avoidance steps={:>5}  agents outside box={}",
            second, avoiding, outside
        );
    }

    Ok(())
}
