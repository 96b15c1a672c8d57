//! Flock data model
//!
//! This module provides the values a simulation is built from:
//! - Agent identity and kinematic state
//! - Immutable per-run settings with validation
//! - The optional shared steering target

mod agent;
mod settings;
mod target;

pub use agent::{Agent, AgentId};
pub use settings::{SettingsError, SimulationSettings, DEFAULT_RAY_COUNT};
pub use target::Target;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_spawned_agent_respects_default_speed_bounds() {
        let settings = SimulationSettings::default();
        let agent = Agent::spawn(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), &settings);
        assert!(agent.speed() >= settings.min_speed);
        assert!(agent.speed() <= settings.max_speed);
        assert!((agent.heading().length() - 1.0).abs() < 1e-12);
    }
}
