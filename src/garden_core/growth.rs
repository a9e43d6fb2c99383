use glam::Vec3;

use crate::garden_core::config::{GrowthCap, GrowthConfig};
use crate::garden_core::environment::EnvironmentState;
use crate::garden_core::instance::{PlacedPlant, MAX_HEALTH};
use crate::garden_core::project::ProjectPage;

/// Scale growth per elapsed millisecond under the current weather.
pub fn growth_rate(env: &EnvironmentState, config: &GrowthConfig) -> f32 {
    let water = 0.5 + 0.5 * env.rain_intensity();
    let sunlight = 1.0 - 0.5 * env.cloud_cover();
    config.base_rate * env.season().growth_factor() * water * sunlight
}

/// Penalty for crowding: every other plant inside the competition square
/// around `plant` removes a fixed share of its growth, down to a floor.
pub fn competition_factor(plant: &PlacedPlant, neighbours: &[PlacedPlant], config: &GrowthConfig) -> f32 {
    let r = config.competition_radius;
    let crowd = neighbours
        .iter()
        .filter(|other| {
            other.id != plant.id
                && (other.position.x - plant.position.x).abs() < r
                && (other.position.z - plant.position.z).abs() < r
        })
        .count();
    (1.0 - crowd as f32 * config.competition_penalty).max(config.competition_floor)
}

/// Per-axis scale after `elapsed_ms` of growth at `rate`, bounded by the configured cap.
pub fn grown_scale(current: Vec3, spawn: Vec3, rate: f32, elapsed_ms: f32, config: &GrowthConfig) -> Vec3 {
    let factor = 1.0 + rate * elapsed_ms.max(0.0);
    let limit = match config.cap {
        GrowthCap::PerTick => current * config.max_multiplier,
        GrowthCap::Lifetime => (spawn * config.max_multiplier).max(current),
    };
    (current * factor).min(limit)
}

pub fn next_health(health: f32, env: &EnvironmentState, config: &GrowthConfig) -> f32 {
    let water = (env.rain_intensity() - 0.5) * 2.0;
    let wind = (env.wind_speed() - config.wind_damage_threshold).max(0.0) * 0.5;
    let shade = env.cloud_cover() * 1.5;
    (health + water - wind - shade).clamp(0.0, MAX_HEALTH)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthReport {
    pub plants: usize,
    pub elapsed_ms: f32,
}

/// Applies one growth tick to every plant on `page`. Crowding is measured
/// against the positions at the start of the tick.
pub fn tick(
    page: &mut ProjectPage,
    env: &EnvironmentState,
    config: &GrowthConfig,
    elapsed_ms: f32,
) -> GrowthReport {
    let rate = growth_rate(env, config);
    let snapshot = page.plants.clone();

    for plant in &mut page.plants {
        let effective = rate * competition_factor(plant, &snapshot, config);
        plant.scale = grown_scale(plant.scale, plant.spawn_scale, effective, elapsed_ms, config);
        plant.health = next_health(plant.health, env, config);
        plant.growth_rate = effective;
    }

    GrowthReport {
        plants: page.plants.len(),
        elapsed_ms,
    }
}

/// Accumulates frame time and fires once per configured interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthClock {
    accumulated_ms: f32,
}

impl GrowthClock {
    /// Returns the simulated milliseconds to grow by when an interval has
    /// passed: wall time since the last tick multiplied by `time_speed`.
    pub fn advance(&mut self, dt_seconds: f32, time_speed: f32, config: &GrowthConfig) -> Option<f32> {
        if !config.enabled || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return None;
        }
        self.accumulated_ms += dt_seconds * 1000.0;
        if self.accumulated_ms < config.interval_ms.max(1.0) {
            return None;
        }
        let elapsed = self.accumulated_ms * time_speed.max(0.0);
        self.accumulated_ms = 0.0;
        Some(elapsed)
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
    }
}
