use serde::{Deserialize, Serialize};

use crate::garden_core::environment::Season;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GardenConfig {
    pub ground: GroundConfig,
    pub grid: GridConfig,
    pub placement: PlacementConfig,
    pub growth: GrowthConfig,
    pub lod: LodConfig,
    pub environment: EnvironmentConfig,
    pub lookup: LookupConfig,
    pub camera: CameraConfig,
}

impl GardenConfig {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let path = std::path::Path::new("garden_config.json");
        if !path.exists() {
            log::info!("no garden_config.json found, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("loaded garden_config.json");
                    config
                }
                Err(e) => {
                    log::warn!("failed to parse garden_config.json: {e}, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("failed to read garden_config.json: {e}, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Side length of the square ground plane, centred on the origin.
    pub size: f32,
    pub resolution: usize,
    pub height_scale: f32,
    pub relief_seed: u32,
    /// Normalized noise amplitude for the initial terrain. Zero keeps it flat.
    pub relief_amplitude: f32,
    pub relief_frequency: f64,
    pub stroke_delta: f32,
    pub brush_radius: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            resolution: 128,
            height_scale: 5.0,
            relief_seed: 42,
            relief_amplitude: 0.0,
            relief_frequency: 0.04,
            stroke_delta: 0.01,
            brush_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_size: f32,
    pub snap: bool,
    pub visible: bool,
    /// Extent of the drawn helper grid, in cells per side.
    pub divisions: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            snap: true,
            visible: true,
            divisions: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub scale_jitter: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { scale_jitter: 0.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthCap {
    /// No axis may exceed `max_multiplier` times its scale at the start of the tick.
    #[default]
    PerTick,
    /// No axis may exceed `max_multiplier` times the scale it was placed with.
    Lifetime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub enabled: bool,
    /// Scale growth per elapsed millisecond before environmental factors.
    pub base_rate: f32,
    pub interval_ms: f32,
    pub max_multiplier: f32,
    pub cap: GrowthCap,
    pub competition_radius: f32,
    pub competition_penalty: f32,
    pub competition_floor: f32,
    pub wind_damage_threshold: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_rate: 0.00001,
            interval_ms: 1000.0,
            max_multiplier: 2.0,
            cap: GrowthCap::PerTick,
            competition_radius: 2.0,
            competition_penalty: 0.1,
            competition_floor: 0.5,
            wind_damage_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub distances: [f32; 3],
    pub detail_factors: [f32; 3],
    pub min_vertices: usize,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            distances: [10.0, 20.0, 40.0],
            detail_factors: [1.0, 0.5, 0.2],
            min_vertices: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub start_hour: f32,
    pub season: Season,
    /// In-game hours advanced per real second. Zero leaves the clock to the user.
    pub day_speed: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            start_hour: 12.0,
            season: Season::Summer,
            day_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    pub wiki_api: String,
    pub commons_api: String,
    pub file_path_base: String,
    pub article_base: String,
    pub max_links: usize,
    /// Lookups in flight at once; the rest queue.
    pub workers: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
            wiki_api: "https://en.wikipedia.org/w/api.php".to_string(),
            commons_api: "https://commons.wikimedia.org/w/api.php".to_string(),
            file_path_base: "https://commons.wikimedia.org/wiki/Special:FilePath/".to_string(),
            article_base: "https://en.wikipedia.org/wiki/".to_string(),
            max_links: 8,
            workers: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_degrees: f32,
    pub orbit_sensitivity: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 11.2,
            yaw: std::f32::consts::FRAC_PI_2,
            pitch: 0.46,
            fov_degrees: 50.0,
            orbit_sensitivity: 0.008,
            zoom_speed: 0.0015,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config: GardenConfig =
            serde_json::from_str(r#"{ "grid": { "cell_size": 0.5 }, "growth": { "cap": "lifetime" } }"#)
                .unwrap();
        assert_eq!(config.grid.cell_size, 0.5);
        assert!(config.grid.snap);
        assert_eq!(config.growth.cap, GrowthCap::Lifetime);
        assert_eq!(config.growth.interval_ms, 1000.0);
        assert_eq!(config.ground, GroundConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        let config: GardenConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GardenConfig::default());
    }
}
