use serde::{Deserialize, Serialize};

use crate::garden_core::config::LodConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodLevel {
    High,
    Medium,
    Low,
}

impl LodLevel {
    pub const ALL: [LodLevel; 3] = [LodLevel::High, LodLevel::Medium, LodLevel::Low];

    pub fn index(self) -> usize {
        match self {
            LodLevel::High => 0,
            LodLevel::Medium => 1,
            LodLevel::Low => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LodLevel::High => "high",
            LodLevel::Medium => "medium",
            LodLevel::Low => "low",
        }
    }
}

impl LodConfig {
    /// Detail level for a plant `distance` units from the camera. Anything
    /// past the medium band is low detail.
    pub fn level_for_distance(&self, distance: f32) -> LodLevel {
        if distance < self.distances[0] {
            LodLevel::High
        } else if distance < self.distances[1] {
            LodLevel::Medium
        } else {
            LodLevel::Low
        }
    }

    /// Whether a plant this far away is drawn as a mesh at all. Past the last
    /// threshold it is reduced to a marker.
    pub fn draws_mesh(&self, distance: f32) -> bool {
        distance < self.distances[2]
    }

    /// Vertex count kept at `level` for a mesh with `source` vertices.
    pub fn vertex_budget(&self, level: LodLevel, source: usize) -> usize {
        let factor = self.detail_factors[level.index()].clamp(0.0, 1.0);
        let kept = (source as f32 * factor).floor() as usize;
        kept.max(self.min_vertices).min(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_bands() {
        let lod = LodConfig::default();
        assert_eq!(lod.level_for_distance(0.0), LodLevel::High);
        assert_eq!(lod.level_for_distance(9.99), LodLevel::High);
        assert_eq!(lod.level_for_distance(10.0), LodLevel::Medium);
        assert_eq!(lod.level_for_distance(25.0), LodLevel::Low);
        assert_eq!(lod.level_for_distance(400.0), LodLevel::Low);
    }

    #[test]
    fn far_plants_fall_back_to_markers() {
        let lod = LodConfig::default();
        assert!(lod.draws_mesh(39.9));
        assert!(!lod.draws_mesh(40.0));
        assert_eq!(lod.level_for_distance(39.9), LodLevel::Low);
    }

    #[test]
    fn budgets_shrink_with_distance_but_keep_a_minimum() {
        let lod = LodConfig::default();
        assert_eq!(lod.vertex_budget(LodLevel::High, 1000), 1000);
        assert_eq!(lod.vertex_budget(LodLevel::Medium, 1000), 500);
        assert_eq!(lod.vertex_budget(LodLevel::Low, 1000), 200);
        assert_eq!(lod.vertex_budget(LodLevel::Low, 10), 4);
        // never more than the source has
        assert_eq!(lod.vertex_budget(LodLevel::Low, 3), 3);
    }
}
