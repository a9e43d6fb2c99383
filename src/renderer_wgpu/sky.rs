use crate::garden_core::environment::{EnvironmentState, Season};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPalette {
    pub background: [f32; 3],
    pub ground: [f32; 3],
    pub light: f32,
}

struct KeyFrame {
    hour: f32,
    sky: [f32; 3],
}

const KEYFRAMES: &[KeyFrame] = &[
    KeyFrame { hour: 0.0, sky: [0.02, 0.02, 0.08] },
    KeyFrame { hour: 5.0, sky: [0.15, 0.08, 0.05] },
    KeyFrame { hour: 6.5, sky: [0.90, 0.50, 0.20] },
    KeyFrame { hour: 8.0, sky: [0.55, 0.75, 0.95] },
    KeyFrame { hour: 16.0, sky: [0.55, 0.75, 0.95] },
    KeyFrame { hour: 17.5, sky: [0.90, 0.50, 0.20] },
    KeyFrame { hour: 19.0, sky: [0.15, 0.08, 0.05] },
    KeyFrame { hour: 20.0, sky: [0.02, 0.02, 0.08] },
    KeyFrame { hour: 24.0, sky: [0.02, 0.02, 0.08] },
];

const OVERCAST: [f32; 3] = [0.55, 0.57, 0.6];

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn scale3(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn sky_at(hour: f32) -> [f32; 3] {
    let h = hour.rem_euclid(24.0);
    let i = KEYFRAMES
        .windows(2)
        .position(|pair| h < pair[1].hour)
        .unwrap_or(KEYFRAMES.len() - 2);
    let (a, b) = (&KEYFRAMES[i], &KEYFRAMES[i + 1]);
    let t = ((h - a.hour) / (b.hour - a.hour)).clamp(0.0, 1.0);
    lerp3(a.sky, b.sky, t)
}

fn season_ground(season: Season) -> [f32; 3] {
    match season {
        Season::Spring => [0.36, 0.55, 0.25],
        Season::Summer => [0.40, 0.52, 0.22],
        Season::Autumn => [0.52, 0.45, 0.24],
        Season::Winter => [0.78, 0.80, 0.82],
    }
}

/// Background and ground colours for the current weather. Cloud cover
/// pulls the sky toward grey and rain darkens both.
pub fn sky_palette(env: &EnvironmentState) -> SkyPalette {
    let clear = sky_at(env.time_of_day());
    let brightness = clear.iter().copied().fold(0.0, f32::max);
    let overcast = scale3(OVERCAST, brightness);
    let sky = lerp3(clear, overcast, env.cloud_cover());
    let rain = 1.0 - 0.35 * env.rain_intensity();

    let light = env.light_intensity() / 1.5;
    let ground = scale3(season_ground(env.season()), 0.25 + 0.75 * light);

    SkyPalette {
        background: scale3(sky, rain),
        ground: scale3(ground, rain),
        light,
    }
}

impl SkyPalette {
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.background;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midday_is_brighter_than_midnight() {
        let mut env = EnvironmentState::default();
        env.set_time_of_day(12.0);
        let noon = sky_palette(&env);
        env.set_time_of_day(0.0);
        let midnight = sky_palette(&env);
        assert!(noon.background[2] > midnight.background[2]);
        assert!(noon.light > midnight.light);
    }

    #[test]
    fn full_cloud_greys_the_sky() {
        let mut env = EnvironmentState::default();
        env.set_time_of_day(12.0);
        env.set_cloud_cover(1.0);
        let [r, g, b] = sky_palette(&env).background;
        assert!((b - r).abs() < 0.1, "{r} {g} {b}");
    }

    #[test]
    fn keyframes_wrap_around_midnight() {
        assert_eq!(sky_at(24.0), sky_at(0.0));
        assert_eq!(sky_at(12.0), [0.55, 0.75, 0.95]);
    }
}
