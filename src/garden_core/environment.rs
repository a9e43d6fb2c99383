use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::garden_core::config::EnvironmentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    #[default]
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn growth_factor(self) -> f32 {
        match self {
            Season::Spring => 1.5,
            Season::Summer => 1.2,
            Season::Autumn => 0.8,
            Season::Winter => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

/// Scene-wide weather and clock. Setters clamp to the valid ranges so the
/// growth model never sees out-of-range inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentState {
    time_of_day: f32,
    season: Season,
    rain_intensity: f32,
    wind_speed: f32,
    cloud_cover: f32,
    time_speed: f32,
    pub day_speed: f32,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            time_of_day: 12.0,
            season: Season::Summer,
            rain_intensity: 0.0,
            wind_speed: 0.0,
            cloud_cover: 0.0,
            time_speed: 1.0,
            day_speed: 0.0,
        }
    }
}

impl EnvironmentState {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        let mut state = Self {
            season: config.season,
            day_speed: config.day_speed,
            ..Self::default()
        };
        state.set_time_of_day(config.start_hour);
        state
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn rain_intensity(&self) -> f32 {
        self.rain_intensity
    }

    pub fn wind_speed(&self) -> f32 {
        self.wind_speed
    }

    pub fn cloud_cover(&self) -> f32 {
        self.cloud_cover
    }

    pub fn time_speed(&self) -> f32 {
        self.time_speed
    }

    pub fn set_time_of_day(&mut self, hour: f32) {
        self.time_of_day = wrap_hour(sanitize(hour));
    }

    pub fn set_season(&mut self, season: Season) {
        self.season = season;
    }

    pub fn set_rain_intensity(&mut self, value: f32) {
        self.rain_intensity = sanitize(value).clamp(0.0, 1.0);
    }

    pub fn set_wind_speed(&mut self, value: f32) {
        self.wind_speed = sanitize(value).max(0.0);
    }

    pub fn set_cloud_cover(&mut self, value: f32) {
        self.cloud_cover = sanitize(value).clamp(0.0, 1.0);
    }

    pub fn set_time_speed(&mut self, value: f32) {
        self.time_speed = sanitize(value).max(0.0);
    }

    /// Re-applies every setter, for state that arrived through deserialization.
    pub fn sanitized(mut self) -> Self {
        self.set_time_of_day(self.time_of_day);
        self.set_rain_intensity(self.rain_intensity);
        self.set_wind_speed(self.wind_speed);
        self.set_cloud_cover(self.cloud_cover);
        self.set_time_speed(self.time_speed);
        self.day_speed = sanitize(self.day_speed);
        self
    }

    /// Advances the clock by `dt_seconds` of wall time, wrapping at midnight.
    pub fn advance(&mut self, dt_seconds: f32) {
        if self.day_speed == 0.0 {
            return;
        }
        self.time_of_day = wrap_hour(self.time_of_day + dt_seconds * self.day_speed * self.time_speed);
    }

    pub fn sun_direction(&self) -> Vec3 {
        let angle = (self.time_of_day / 24.0) * std::f32::consts::TAU - std::f32::consts::FRAC_PI_2;
        let altitude = angle.sin();
        let azimuth = angle.cos();
        Vec3::new(azimuth * 0.45, altitude, 0.75).normalize()
    }

    /// Direct light multiplier, dimmed by up to half under full cloud.
    pub fn light_intensity(&self) -> f32 {
        let day = (self.sun_direction().y * 0.5 + 0.5).clamp(0.0, 1.0);
        1.5 * day * (1.0 - self.cloud_cover * 0.5)
    }

    pub fn ambient_strength(&self) -> f32 {
        0.1 + self.light_intensity() * 0.25
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Hour in `[0, 24)`; tiny negative inputs round up to 24.0 under `rem_euclid`.
fn wrap_hour(hour: f32) -> f32 {
    let wrapped = hour.rem_euclid(24.0);
    if wrapped >= 24.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_to_valid_ranges() {
        let mut env = EnvironmentState::default();
        env.set_rain_intensity(3.0);
        env.set_cloud_cover(-1.0);
        env.set_wind_speed(-5.0);
        env.set_time_of_day(30.0);
        env.set_time_speed(f32::NAN);
        assert_eq!(env.rain_intensity(), 1.0);
        assert_eq!(env.cloud_cover(), 0.0);
        assert_eq!(env.wind_speed(), 0.0);
        assert_eq!(env.time_of_day(), 6.0);
        assert_eq!(env.time_speed(), 0.0);
    }

    #[test]
    fn sanitized_repairs_deserialized_values() {
        let env: EnvironmentState =
            serde_json::from_str(r#"{"rain_intensity": 4.0, "time_of_day": -1.0}"#).unwrap();
        let env = env.sanitized();
        assert_eq!(env.rain_intensity(), 1.0);
        assert_eq!(env.time_of_day(), 23.0);
        assert_eq!(env.season(), Season::Summer);
    }

    #[test]
    fn advance_wraps_at_midnight() {
        let mut env = EnvironmentState {
            day_speed: 1.0,
            ..EnvironmentState::default()
        };
        env.set_time_of_day(23.5);
        env.advance(1.0);
        assert!((env.time_of_day() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn hours_just_below_midnight_stay_in_range() {
        let mut env = EnvironmentState::default();
        env.set_time_of_day(-1e-8);
        assert!((0.0..24.0).contains(&env.time_of_day()));
        env.set_time_of_day(24.0);
        assert_eq!(env.time_of_day(), 0.0);
    }

    #[test]
    fn clock_is_frozen_without_day_speed() {
        let mut env = EnvironmentState::default();
        env.advance(100.0);
        assert_eq!(env.time_of_day(), 12.0);
    }

    #[test]
    fn clouds_dim_the_sun() {
        let mut env = EnvironmentState::default();
        let clear = env.light_intensity();
        env.set_cloud_cover(1.0);
        assert!((env.light_intensity() - clear * 0.5).abs() < 1e-5);
    }

    #[test]
    fn noon_is_brighter_than_midnight() {
        let mut env = EnvironmentState::default();
        env.set_time_of_day(12.0);
        let noon = env.light_intensity();
        env.set_time_of_day(0.0);
        assert!(noon > env.light_intensity());
    }
}
