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
//! Randomized invariant tests
//!
//! Every test draws its inputs from a seeded RNG so failures reproduce.

use flocking_engine::aggregation::{AggregationStrategy, NeighborAggregator};
use flocking_engine::collision::{ObstacleField, ObstacleMask};
use flocking_engine::flock::{Agent, SimulationSettings, Target};
use flocking_engine::math::Vec3;
use flocking_engine::simulation::Simulation;
use flocking_engine::spawner::random_in_unit_sphere;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_settings(rng: &mut StdRng) -> SimulationSettings {
    let min_speed = rng.gen_range(0.0..4.0);
    let max_speed = min_speed + rng.gen_range(0.1..8.0);
    let perception = rng.gen_range(0.5..5.0);
    let avoidance = rng.gen_range(0.1..3.0);

    SimulationSettings::default()
        .with_speed_range(min_speed, max_speed)
        .with_radii(perception, avoidance)
        .with_max_steer_force(rng.gen_range(0.1..10.0))
        .with_flocking_weights(
            rng.gen_range(-1.0..3.0),
            rng.gen_range(-1.0..3.0),
            rng.gen_range(0.0..3.0),
        )
        .with_target_weight(rng.gen_range(0.0..2.0))
        .with_ray_count(rng.gen_range(1..120))
}

fn random_agents(rng: &mut StdRng, count: usize, spread: f64) -> Vec<Agent> {
    (0..count)
        .map(|_| {
            let position = random_in_unit_sphere(rng) * spread;
            let heading = random_in_unit_sphere(rng).try_normalize().unwrap_or(Vec3::X);
            // Initial speeds deliberately ignore the configured range
            let speed = rng.gen_range(0.0..15.0);
            Agent::with_state(position, heading, heading * speed)
        })
        .collect()
}

fn speed_tolerance(settings: &SimulationSettings) -> f64 {
    1e-9 * (1.0 + settings.max_speed)
}

#[test]
fn test_speed_bound_after_every_tick() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..20 {
        let settings = random_settings(&mut rng);
        let agents = random_agents(&mut rng, 40, 6.0);
        let walls = ObstacleField::bounding_box(Vec3::ZERO, 16.0, ObstacleMask::layer(0));
        let target = Target::new(random_in_unit_sphere(&mut rng) * 4.0);

        let mut sim = Simulation::builder(settings)
            .agents(agents)
            .target(target)
            .probe(walls)
            .build()
            .unwrap();

        let tol = speed_tolerance(&settings);
        for _ in 0..15 {
            let dt = rng.gen_range(0.001..0.2);
            let report = sim.tick(dt).unwrap();
            assert_eq!(report.rejected_states, 0);

            for agent in sim.agents() {
                let speed = agent.speed();
                assert!(
                    speed >= settings.min_speed - tol && speed <= settings.max_speed + tol,
                    "speed {} outside [{}, {}]",
                    speed,
                    settings.min_speed,
                    settings.max_speed
                );
            }
        }
    }
}

#[test]
fn test_heading_parallel_to_velocity() {
    let mut rng = StdRng::seed_from_u64(17);

    for _ in 0..20 {
        let settings = random_settings(&mut rng);
        let mut sim = Simulation::new(settings, random_agents(&mut rng, 30, 4.0)).unwrap();

        for _ in 0..10 {
            sim.tick(rng.gen_range(0.01..0.1)).unwrap();

            for agent in sim.agents() {
                assert!((agent.heading().length() - 1.0).abs() < 1e-9);
                if agent.speed() > 1e-6 {
                    let cos = agent.heading().dot(agent.velocity()) / agent.speed();
                    assert!((cos - 1.0).abs() < 1e-9, "heading not aligned: cos = {}", cos);
                }
            }
        }
    }
}

#[test]
fn test_neighbor_symmetry() {
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..200 {
        let settings = random_settings(&mut rng);
        let a = random_in_unit_sphere(&mut rng) * 5.0;
        let b = random_in_unit_sphere(&mut rng) * 5.0;
        let agents = vec![
            Agent::spawn(a, Vec3::X, &settings),
            Agent::spawn(b, Vec3::Y, &settings),
        ];

        let summaries = NeighborAggregator::default().summarize(&agents, &settings);
        assert_eq!(summaries[0].perceived_count, summaries[1].perceived_count);
        // Separation pushes are equal and opposite
        assert!((summaries[0].avoidance_heading + summaries[1].avoidance_heading).length() < 1e-9);
    }
}

#[test]
fn test_perceived_set_matches_radius_predicate() {
    let mut rng = StdRng::seed_from_u64(2024);
    let settings = random_settings(&mut rng);
    let agents = random_agents(&mut rng, 150, 8.0);

    for strategy in [AggregationStrategy::AllPairs, AggregationStrategy::UniformGrid] {
        let summaries = NeighborAggregator::new(strategy).summarize(&agents, &settings);

        for (i, summary) in summaries.iter().enumerate() {
            let expected: Vec<&Agent> = agents
                .iter()
                .enumerate()
                .filter(|&(j, other)| {
                    j != i && agents[i].position().distance(other.position()) < settings.perception_radius
                })
                .map(|(_, other)| other)
                .collect();

            assert_eq!(summary.perceived_count, expected.len());
            let centre: Vec3 = expected.iter().map(|a| a.position()).sum();
            assert!((summary.flock_centre - centre).length() < 1e-9);
        }
    }
}

#[test]
fn test_no_self_perception() {
    let mut rng = StdRng::seed_from_u64(5);
    let settings = SimulationSettings::default().with_radii(1e-3, 1e-3);
    let agents = random_agents(&mut rng, 50, 100.0);

    for strategy in [AggregationStrategy::AllPairs, AggregationStrategy::UniformGrid] {
        let summaries = NeighborAggregator::new(strategy).summarize(&agents, &settings);
        for summary in &summaries {
            assert_eq!(summary.perceived_count, 0);
            assert_eq!(summary.flock_centre, Vec3::ZERO);
            assert_eq!(summary.flock_heading, Vec3::ZERO);
            assert_eq!(summary.avoidance_heading, Vec3::ZERO);
        }
    }

    // A pair sees only the other agent, never itself
    let pair = vec![
        Agent::spawn(Vec3::new(0.3, 0.0, 0.0), Vec3::X, &settings),
        Agent::spawn(Vec3::new(0.3, 0.0, 0.0005), Vec3::Y, &settings),
    ];
    let summaries = NeighborAggregator::default().summarize(&pair, &settings);
    assert_eq!(summaries[0].perceived_count, 1);
    assert_eq!(summaries[0].flock_centre, pair[1].position());
    assert_eq!(summaries[0].flock_heading, pair[1].heading());
}

#[test]
fn test_separation_strengthens_with_proximity() {
    let settings = SimulationSettings::default().with_radii(2.5, 2.0);
    let mut aggregator = NeighborAggregator::default();
    let direction = Vec3::new(1.0, 2.0, -0.5).normalize_or_zero();

    let mut previous = 0.0;
    // Walk from the edge of the avoidance radius inwards
    for step in (1..=40).rev() {
        let distance = 2.0 * step as f64 / 41.0;
        let agents = vec![
            Agent::spawn(Vec3::ZERO, Vec3::X, &settings),
            Agent::spawn(direction * distance, Vec3::X, &settings),
        ];

        let summaries = aggregator.summarize(&agents, &settings);
        let push = summaries[0].avoidance_heading.length();
        assert!(push > 0.0);
        assert!(push >= previous, "push {} weaker than {} at distance {}", push, previous, distance);
        previous = push;
    }
}
