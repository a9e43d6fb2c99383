use serde::{Deserialize, Serialize};

use crate::garden_core::catalogue::PlantId;
use crate::garden_core::environment::EnvironmentState;
use crate::garden_core::error::{GardenError, GardenResult};
use crate::garden_core::heightmap::HeightMap;
use crate::garden_core::project::Project;

pub const FORMAT_VERSION: u32 = 1;
pub const DEFAULT_PATH: &str = "garden.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSave {
    pub snap: bool,
    pub visible: bool,
}

impl Default for GridSave {
    fn default() -> Self {
        Self {
            snap: true,
            visible: true,
        }
    }
}

/// Everything needed to restore an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub format_version: u32,
    pub selected_plant: Option<PlantId>,
    pub project: Project,
    pub environment: EnvironmentState,
    pub grid: GridSave,
    /// Absent in files written before terrain editing existed; the configured
    /// ground is used instead.
    pub terrain: Option<HeightMap>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            selected_plant: None,
            project: Project::default(),
            environment: EnvironmentState::default(),
            grid: GridSave::default(),
            terrain: None,
        }
    }
}

impl ProjectFile {
    pub fn to_json(&self) -> GardenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a project. Nothing is returned unless the whole
    /// file is usable, so callers can swap it in atomically.
    pub fn from_json(json: &str) -> GardenResult<Self> {
        let mut file: ProjectFile = serde_json::from_str(json)?;
        if file.format_version > FORMAT_VERSION {
            return Err(GardenError::UnsupportedVersion(file.format_version));
        }
        if let Some(terrain) = &file.terrain {
            if !terrain.is_consistent() {
                return Err(GardenError::InconsistentTerrain {
                    resolution: terrain.resolution(),
                    samples: terrain.samples().len(),
                });
            }
        }
        file.project.repair();
        file.environment = file.environment.sanitized();
        file.format_version = FORMAT_VERSION;
        Ok(file)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ProjectFile {
    pub fn load(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(file) => {
                    log::info!("loaded {}", path.display());
                    Some(file)
                }
                Err(e) => {
                    log::warn!("failed to parse {}: {e}", path.display());
                    None
                }
            },
            Err(e) => {
                log::warn!("failed to read {}: {e}", path.display());
                None
            }
        }
    }

    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved garden to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use serde_json::json;

    use super::*;
    use crate::garden_core::catalogue::Catalogue;
    use crate::garden_core::environment::Season;
    use crate::garden_core::instance::{Override, PlacedPlant};

    fn sample_file() -> ProjectFile {
        let catalogue = Catalogue::builtin();
        let mut project = Project::default();
        let rose = catalogue.get(PlantId(3)).cloned().unwrap();
        let id = project.allocate_id();
        let mut plant = PlacedPlant::new(id, rose, Vec3::new(3.0, 0.25, 8.0), 1.2, Vec3::splat(1.1));
        plant.customization.color = Override::Set("white".to_string());
        plant.customization.spread = Override::Set(2.5);
        project.active_page_mut().plants.push(plant);
        project.add_page("Herbs");

        let mut environment = EnvironmentState::default();
        environment.set_season(Season::Autumn);
        environment.set_rain_intensity(0.4);

        let mut terrain = HeightMap::flat(16, 100.0, 5.0);
        terrain.apply_stroke(3.0, 8.0, 0.05, 0.0);

        ProjectFile {
            selected_plant: Some(PlantId(3)),
            project,
            environment,
            grid: GridSave {
                snap: false,
                visible: true,
            },
            terrain: Some(terrain),
            ..ProjectFile::default()
        }
    }

    #[test]
    fn export_then_import_is_identity() {
        let file = sample_file();
        let json = file.to_json().unwrap();
        let back = ProjectFile::from_json(&json).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file = ProjectFile::from_json("{}").unwrap();
        assert_eq!(file.project.pages().len(), 1);
        assert_eq!(file.format_version, FORMAT_VERSION);
        assert!(file.grid.snap);
        assert!(file.terrain.is_none());
    }

    #[test]
    fn broken_json_is_rejected() {
        assert!(matches!(
            ProjectFile::from_json("{\"project\": ["),
            Err(GardenError::InvalidProject(_))
        ));
    }

    #[test]
    fn terrain_with_wrong_sample_count_is_rejected() {
        let doc = json!({
            "terrain": { "resolution": 4, "size": 100.0, "height_scale": 5.0, "samples": [0.0, 0.0] }
        });
        assert!(matches!(
            ProjectFile::from_json(&doc.to_string()),
            Err(GardenError::InconsistentTerrain { resolution: 4, samples: 2 })
        ));
    }

    #[test]
    fn terrain_with_overflowing_resolution_is_rejected() {
        let doc = json!({
            "terrain": { "resolution": 4294967296u64, "size": 100.0, "height_scale": 5.0, "samples": [] }
        });
        assert!(matches!(
            ProjectFile::from_json(&doc.to_string()),
            Err(GardenError::InconsistentTerrain { samples: 0, .. })
        ));
    }

    #[test]
    fn terrain_with_non_positive_extent_is_rejected() {
        let doc = json!({
            "terrain": { "resolution": 1, "size": -3.0, "height_scale": 5.0, "samples": [0.0] }
        });
        assert!(ProjectFile::from_json(&doc.to_string()).is_err());
        let doc = json!({
            "terrain": { "resolution": 1, "size": 100.0, "height_scale": 0.0, "samples": [0.0] }
        });
        assert!(ProjectFile::from_json(&doc.to_string()).is_err());
    }

    #[test]
    fn newer_format_is_rejected() {
        let doc = json!({ "format_version": FORMAT_VERSION + 1 });
        assert!(matches!(
            ProjectFile::from_json(&doc.to_string()),
            Err(GardenError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let doc = json!({ "format_version": 1, "theme": "dark" });
        assert!(ProjectFile::from_json(&doc.to_string()).is_ok());
    }
}
