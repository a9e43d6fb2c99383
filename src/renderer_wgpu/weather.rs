use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Streaks drawn at full rain intensity.
pub const MAX_DROPS: usize = 600;
/// Height drops fall from before wrapping back to the top.
pub const RAIN_CEILING: f32 = 50.0;
const STREAK_SECONDS: f32 = 0.05;
const SWAY_AMPLITUDE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainDrop {
    /// Horizontal position as a fraction of the ground extent, in `[-0.5, 0.5)`.
    pub x: f32,
    pub z: f32,
    phase: f32,
    /// Fall speed in units per second.
    pub speed: f32,
}

impl RainDrop {
    /// Head of the drop at `time` seconds on a ground `extent` units wide.
    pub fn position(&self, time: f32, extent: f32) -> Vec3 {
        let fallen = (self.phase + self.speed * time).rem_euclid(RAIN_CEILING);
        Vec3::new(self.x * extent, RAIN_CEILING - fallen, self.z * extent)
    }

    /// Segment from the head back along the drop's velocity.
    pub fn streak(&self, time: f32, extent: f32, wind_speed: f32) -> [Vec3; 2] {
        let head = self.position(time, extent);
        let velocity = wind_drift(wind_speed) - Vec3::Y * self.speed;
        [head, head - velocity * STREAK_SECONDS]
    }
}

/// A stable population of rain drops that grows and shrinks with intensity.
pub struct RainField {
    rng: StdRng,
    drops: Vec<RainDrop>,
}

impl RainField {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            drops: Vec::new(),
        }
    }

    pub fn sync(&mut self, intensity: f32) -> &[RainDrop] {
        let wanted = drop_count(intensity);
        self.drops.truncate(wanted);
        while self.drops.len() < wanted {
            let drop = RainDrop {
                x: self.rng.random_range(-0.5..0.5),
                z: self.rng.random_range(-0.5..0.5),
                phase: self.rng.random_range(0.0..RAIN_CEILING),
                speed: self.rng.random_range(6.0..24.0),
            };
            self.drops.push(drop);
        }
        &self.drops
    }
}

pub fn drop_count(intensity: f32) -> usize {
    if !intensity.is_finite() {
        return 0;
    }
    (intensity.clamp(0.0, 1.0) * MAX_DROPS as f32).floor() as usize
}

/// Horizontal push the wind gives falling rain, in units per second.
pub fn wind_drift(wind_speed: f32) -> Vec3 {
    let wind = wind_speed.max(0.0);
    Vec3::new(wind * 0.1, 0.0, wind * 0.05)
}

/// Tilt about the world X and Z axes for a plant swaying in the wind.
/// `phase` keeps neighbouring plants out of step.
pub fn sway(wind_speed: f32, time: f32, phase: f32) -> Vec2 {
    if wind_speed <= 0.0 || !wind_speed.is_finite() {
        return Vec2::ZERO;
    }
    let t = (time + phase) * wind_speed;
    Vec2::new(t.sin(), (2.0 * t).sin()) * SWAY_AMPLITUDE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_count_follows_intensity() {
        assert_eq!(drop_count(0.0), 0);
        assert_eq!(drop_count(0.5), MAX_DROPS / 2);
        assert_eq!(drop_count(3.0), MAX_DROPS);
        assert_eq!(drop_count(f32::NAN), 0);
    }

    #[test]
    fn field_keeps_existing_drops_when_rain_picks_up() {
        let mut field = RainField::new(7);
        let light: Vec<RainDrop> = field.sync(0.1).to_vec();
        let heavy = field.sync(0.8);
        assert_eq!(heavy.len(), drop_count(0.8));
        assert_eq!(&heavy[..light.len()], &light[..]);
        assert!(field.sync(0.0).is_empty());
    }

    #[test]
    fn drops_wrap_between_ground_and_ceiling() {
        let mut field = RainField::new(3);
        for drop in field.sync(1.0) {
            for t in [0.0, 1.3, 17.0, 400.0] {
                let p = drop.position(t, 100.0);
                assert!(p.y > 0.0 && p.y <= RAIN_CEILING);
                assert!(p.x.abs() <= 50.0 && p.z.abs() <= 50.0);
            }
        }
    }

    #[test]
    fn wind_leans_the_streaks() {
        let mut field = RainField::new(1);
        let drop = field.sync(1.0)[0];
        let [calm_head, calm_tail] = drop.streak(2.0, 100.0, 0.0);
        assert_eq!(calm_head.x, calm_tail.x);
        let [head, tail] = drop.streak(2.0, 100.0, 20.0);
        assert!(tail.x < head.x);
        assert!(tail.y > head.y);
    }

    #[test]
    fn calm_air_does_not_sway() {
        assert_eq!(sway(0.0, 12.0, 0.4), Vec2::ZERO);
        let tilt = sway(8.0, 0.7, 0.0);
        assert!(tilt != Vec2::ZERO);
        assert!(tilt.abs().max_element() <= SWAY_AMPLITUDE);
    }
}
