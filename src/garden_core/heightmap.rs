use noise::{NoiseFn, OpenSimplex};
use serde::{Deserialize, Serialize};

use crate::garden_core::config::GroundConfig;

/// Largest side length a map may have, whether configured or loaded.
pub const MAX_RESOLUTION: usize = 4096;

/// Square grid of normalized height samples covering `[-size/2, size/2]` on
/// both horizontal axes. Samples stay in `[0, 1]`; world heights are samples
/// multiplied by `height_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    resolution: usize,
    size: f32,
    height_scale: f32,
    samples: Vec<f32>,
}

impl HeightMap {
    pub fn flat(resolution: usize, size: f32, height_scale: f32) -> Self {
        let resolution = resolution.clamp(1, MAX_RESOLUTION);
        Self {
            resolution,
            size,
            height_scale,
            samples: vec![0.0; resolution * resolution],
        }
    }

    pub fn from_config(config: &GroundConfig) -> Self {
        let mut map = Self::flat(config.resolution, config.size, config.height_scale);
        if config.relief_amplitude <= 0.0 {
            return map;
        }

        let noise = OpenSimplex::new(config.relief_seed);
        let side = map.resolution;
        for iz in 0..side {
            for ix in 0..side {
                let (x, z) = map.cell_center(ix, iz);
                let n = noise.get([
                    x as f64 * config.relief_frequency,
                    z as f64 * config.relief_frequency,
                ]) as f32;
                map.samples[iz * side + ix] =
                    ((n * 0.5 + 0.5) * config.relief_amplitude).clamp(0.0, 1.0);
            }
        }
        map
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn cell_size(&self) -> f32 {
        self.size / self.resolution as f32
    }

    /// A deserialized map is only usable if its sample vector matches its
    /// resolution and its extent is a positive finite number.
    pub fn is_consistent(&self) -> bool {
        let expected = match self.resolution.checked_mul(self.resolution) {
            Some(n) if (1..=MAX_RESOLUTION).contains(&self.resolution) => n,
            _ => return false,
        };
        self.samples.len() == expected
            && self.size.is_finite()
            && self.size > 0.0
            && self.height_scale.is_finite()
            && self.height_scale > 0.0
            && self.samples.iter().all(|s| (0.0..=1.0).contains(s))
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.size * 0.5;
        (-half..=half).contains(&x) && (-half..=half).contains(&z)
    }

    /// Grid cell under a world coordinate. Coordinates off the ground clamp to the edge.
    pub fn index_of(&self, x: f32, z: f32) -> (usize, usize) {
        (self.axis_index(x), self.axis_index(z))
    }

    fn axis_index(&self, v: f32) -> usize {
        let t = (v + self.size * 0.5) / self.size;
        let i = (t * self.resolution as f32).floor();
        if i.is_nan() || i < 0.0 {
            0
        } else {
            (i as usize).min(self.resolution - 1)
        }
    }

    pub fn cell_center(&self, ix: usize, iz: usize) -> (f32, f32) {
        let cell = self.cell_size();
        let half = self.size * 0.5;
        (
            -half + (ix as f32 + 0.5) * cell,
            -half + (iz as f32 + 0.5) * cell,
        )
    }

    pub fn sample(&self, ix: usize, iz: usize) -> f32 {
        self.samples[iz * self.resolution + ix]
    }

    /// World-space ground elevation under `(x, z)`.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let (ix, iz) = self.index_of(x, z);
        self.sample(ix, iz) * self.height_scale
    }

    /// Adds `delta` to the cell under `(x, z)` and, for a positive radius, to
    /// every cell whose centre lies within `radius`. Returns the number of
    /// samples that changed.
    pub fn apply_stroke(&mut self, x: f32, z: f32, delta: f32, radius: f32) -> usize {
        if !delta.is_finite() || delta == 0.0 {
            return 0;
        }

        let (cx, cz) = self.index_of(x, z);
        let reach = if radius > 0.0 {
            (radius / self.cell_size()).ceil() as usize
        } else {
            0
        };
        let side = self.resolution;
        let mut changed = 0;

        for iz in cz.saturating_sub(reach)..=(cz + reach).min(side - 1) {
            for ix in cx.saturating_sub(reach)..=(cx + reach).min(side - 1) {
                let is_center = ix == cx && iz == cz;
                if !is_center {
                    let (px, pz) = self.cell_center(ix, iz);
                    let (dx, dz) = (px - x, pz - z);
                    if (dx * dx + dz * dz).sqrt() > radius {
                        continue;
                    }
                }
                let slot = &mut self.samples[iz * side + ix];
                let next = (*slot + delta).clamp(0.0, 1.0);
                if next != *slot {
                    *slot = next;
                    changed += 1;
                }
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_maps_world_extent_to_grid() {
        let map = HeightMap::flat(128, 100.0, 5.0);
        assert_eq!(map.index_of(-50.0, -50.0), (0, 0));
        assert_eq!(map.index_of(0.0, 0.0), (64, 64));
        assert_eq!(map.index_of(49.99, 49.99), (127, 127));
        assert_eq!(map.index_of(50.0, 50.0), (127, 127));
        assert_eq!(map.index_of(-500.0, 500.0), (0, 127));
    }

    #[test]
    fn stroke_clamps_and_scales_height() {
        let mut map = HeightMap::flat(100, 100.0, 5.0);
        assert_eq!(map.apply_stroke(3.0, 8.0, 0.4, 0.0), 1);
        assert!((map.height_at(3.0, 8.0) - 2.0).abs() < 1e-6);

        map.apply_stroke(3.0, 8.0, 0.9, 0.0);
        assert_eq!(map.height_at(3.0, 8.0), 5.0);

        map.apply_stroke(3.0, 8.0, -5.0, 0.0);
        assert_eq!(map.height_at(3.0, 8.0), 0.0);
        assert_eq!(map.apply_stroke(3.0, 8.0, -0.01, 0.0), 0);
    }

    #[test]
    fn single_cell_stroke_leaves_neighbours_alone() {
        let mut map = HeightMap::flat(100, 100.0, 5.0);
        map.apply_stroke(0.5, 0.5, 0.01, 0.0);
        assert!(map.height_at(0.5, 0.5) > 0.0);
        assert_eq!(map.height_at(1.5, 0.5), 0.0);
        assert_eq!(map.samples().iter().filter(|s| **s > 0.0).count(), 1);
    }

    #[test]
    fn brush_radius_touches_surrounding_cells() {
        let mut map = HeightMap::flat(100, 100.0, 5.0);
        let changed = map.apply_stroke(0.5, 0.5, 0.1, 1.0);
        // centre plus its four edge neighbours; diagonals sit at sqrt(2)
        assert_eq!(changed, 5);
    }

    #[test]
    fn oversized_or_degenerate_maps_are_inconsistent() {
        let mut map = HeightMap::flat(4, 100.0, 5.0);
        assert!(map.is_consistent());

        map.resolution = usize::MAX;
        map.samples.clear();
        assert!(!map.is_consistent());

        let mut map = HeightMap::flat(4, 100.0, 5.0);
        map.size = f32::INFINITY;
        assert!(!map.is_consistent());

        let mut map = HeightMap::flat(4, 100.0, 5.0);
        map.height_scale = 0.0;
        assert!(!map.is_consistent());

        assert_eq!(HeightMap::flat(usize::MAX, 100.0, 5.0).resolution(), MAX_RESOLUTION);
    }

    #[test]
    fn relief_stays_normalized() {
        let config = GroundConfig {
            resolution: 32,
            relief_amplitude: 0.6,
            ..GroundConfig::default()
        };
        let map = HeightMap::from_config(&config);
        assert!(map.is_consistent());
        assert!(map.samples().iter().any(|s| *s > 0.0));
        assert!(map.samples().iter().all(|s| *s <= 0.6 + 1e-6));
    }
}
