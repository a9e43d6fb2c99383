use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::garden_core::error::GardenResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(pub u32);

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plant#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlantCategory {
    Tree,
    Shrub,
    Flower,
    Groundcover,
    Grass,
    #[default]
    Other,
}

impl PlantCategory {
    pub const ALL: [PlantCategory; 6] = [
        PlantCategory::Tree,
        PlantCategory::Shrub,
        PlantCategory::Flower,
        PlantCategory::Groundcover,
        PlantCategory::Grass,
        PlantCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlantCategory::Tree => "Tree",
            PlantCategory::Shrub => "Shrub",
            PlantCategory::Flower => "Flower",
            PlantCategory::Groundcover => "Groundcover",
            PlantCategory::Grass => "Grass",
            PlantCategory::Other => "Other",
        }
    }
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDefinition {
    pub id: PlantId,
    pub name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub model_url: String,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// Nominal mature height in metres.
    #[serde(default)]
    pub height: f32,
    /// Nominal spread (crown width) in metres.
    #[serde(default)]
    pub spread: f32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: PlantCategory,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl PlantDefinition {
    /// Name used for encyclopedia lookups: scientific when known, common otherwise.
    pub fn lookup_key(&self) -> &str {
        self.scientific_name.as_deref().unwrap_or(&self.name)
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .scientific_name
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle))
            || self.description.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    plants: Vec<PlantDefinition>,
}

impl Catalogue {
    pub fn new(plants: Vec<PlantDefinition>) -> Self {
        Self { plants }
    }

    pub fn from_json(json: &str) -> GardenResult<Self> {
        let plants: Vec<PlantDefinition> = serde_json::from_str(json)?;
        Ok(Self::new(plants))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let path = std::path::Path::new("catalogue.json");
        if !path.exists() {
            log::info!("no catalogue.json found, using built-in catalogue");
            return Self::builtin();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(catalogue) if !catalogue.is_empty() => {
                    log::info!("loaded {} plants from catalogue.json", catalogue.len());
                    catalogue
                }
                Ok(_) => {
                    log::warn!("catalogue.json is empty, using built-in catalogue");
                    Self::builtin()
                }
                Err(e) => {
                    log::warn!("failed to parse catalogue.json: {e}, using built-in catalogue");
                    Self::builtin()
                }
            },
            Err(e) => {
                log::warn!("failed to read catalogue.json: {e}, using built-in catalogue");
                Self::builtin()
            }
        }
    }

    pub fn builtin() -> Self {
        let entry = |id: u32,
                     name: &str,
                     scientific: &str,
                     model: &str,
                     scale: f32,
                     height: f32,
                     spread: f32,
                     category: PlantCategory,
                     color: &str,
                     description: &str| PlantDefinition {
            id: PlantId(id),
            name: name.to_string(),
            scientific_name: Some(scientific.to_string()),
            model_url: model.to_string(),
            scale: Vec3::splat(scale),
            height,
            spread,
            description: description.to_string(),
            category,
            preview_image: None,
            color: Some(color.to_string()),
            href: None,
        };

        Self::new(vec![
            entry(
                1,
                "Sunflower",
                "Helianthus annuus",
                "models/canada_lily.glb",
                1.0,
                2.5,
                0.6,
                PlantCategory::Flower,
                "yellow",
                "Tall annual plant with large yellow flowers",
            ),
            entry(
                2,
                "Lavender",
                "Lavandula angustifolia",
                "models/canada_lily.glb",
                0.8,
                0.6,
                0.4,
                PlantCategory::Shrub,
                "purple",
                "Fragrant perennial herb with purple flowers",
            ),
            entry(
                3,
                "Rose Bush",
                "Rosa",
                "models/canada_lily.glb",
                1.2,
                1.5,
                1.2,
                PlantCategory::Shrub,
                "red",
                "Woody perennial flowering plant with fragrant blooms",
            ),
            entry(
                4,
                "Fern",
                "Polypodiopsida",
                "models/canada_lily.glb",
                0.9,
                0.8,
                1.0,
                PlantCategory::Groundcover,
                "green",
                "Non-flowering vascular plant with feathery fronds",
            ),
            entry(
                5,
                "Oak Tree",
                "Quercus",
                "models/oak_tree.glb",
                2.0,
                20.0,
                15.0,
                PlantCategory::Tree,
                "green",
                "Large deciduous tree with lobed leaves and acorns",
            ),
        ])
    }

    pub fn get(&self, id: PlantId) -> Option<&PlantDefinition> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn first(&self) -> Option<&PlantDefinition> {
        self.plants.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantDefinition> {
        self.plants.iter()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    /// Case-insensitive search over name, scientific name and description,
    /// optionally restricted to one category. An empty query matches everything.
    pub fn search<'a>(
        &'a self,
        query: &str,
        category: Option<PlantCategory>,
    ) -> impl Iterator<Item = &'a PlantDefinition> + 'a {
        let needle = query.trim().to_lowercase();
        self.plants.iter().filter(move |p| {
            category.is_none_or(|c| p.category == c) && (needle.is_empty() || p.matches(&needle))
        })
    }

    /// Categories present in the catalogue, in declaration order.
    pub fn categories(&self) -> Vec<PlantCategory> {
        PlantCategory::ALL
            .into_iter()
            .filter(|c| self.plants.iter().any(|p| p.category == *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let catalogue = Catalogue::builtin();
        let mut ids: Vec<_> = catalogue.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalogue.len());
    }

    #[test]
    fn search_matches_scientific_name_case_insensitively() {
        let catalogue = Catalogue::builtin();
        let hits: Vec<_> = catalogue.search("QUERCUS", None).map(|p| p.name.as_str()).collect();
        assert_eq!(hits, vec!["Oak Tree"]);
    }

    #[test]
    fn search_filters_by_category() {
        let catalogue = Catalogue::builtin();
        let shrubs: Vec<_> = catalogue
            .search("", Some(PlantCategory::Shrub))
            .map(|p| p.id)
            .collect();
        assert_eq!(shrubs, vec![PlantId(2), PlantId(3)]);
        assert_eq!(catalogue.search("", None).count(), catalogue.len());
    }

    #[test]
    fn lookup_key_falls_back_to_common_name() {
        let mut plant = Catalogue::builtin().first().cloned().unwrap();
        assert_eq!(plant.lookup_key(), "Helianthus annuus");
        plant.scientific_name = None;
        assert_eq!(plant.lookup_key(), "Sunflower");
    }

    #[test]
    fn json_entries_take_defaults() {
        let catalogue =
            Catalogue::from_json(r#"[{ "id": 9, "name": "Moss", "model_url": "models/moss.glb" }]"#)
                .unwrap();
        let moss = catalogue.get(PlantId(9)).unwrap();
        assert_eq!(moss.scale, Vec3::ONE);
        assert_eq!(moss.category, PlantCategory::Other);
        assert!(catalogue.get(PlantId(1)).is_none());
    }
}
