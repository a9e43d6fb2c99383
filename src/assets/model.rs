use std::collections::HashMap;

use anyhow::{ensure, Context, Result};
use glam::{UVec3, Vec3};

use crate::garden_core::config::LodConfig;
use crate::garden_core::lod::LodLevel;

/// Triangle mesh in model space, as read from the first primitive of a GLB.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ModelGeometry {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let normals = compute_smooth_normals(&positions, &indices);
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.positions[t[0] as usize],
                self.positions[t[1] as usize],
                self.positions[t[2] as usize],
            ]
        })
    }

    /// Reduces the mesh to at most `budget` vertices by merging every vertex
    /// that falls into the same cell of a uniform grid over the bounds.
    /// Triangles that collapse are dropped.
    pub fn simplify(&self, budget: usize) -> ModelGeometry {
        let budget = budget.max(1);
        if self.vertex_count() <= budget {
            return self.clone();
        }
        let Some((lo, hi)) = self.bounds() else {
            return self.clone();
        };
        let extent = (hi - lo).max(Vec3::splat(1e-6));

        let mut cells_per_axis = (budget as f32).cbrt().ceil() as u32 + 1;
        loop {
            let clustered = self.cluster(lo, extent, cells_per_axis.max(1));
            if clustered.vertex_count() <= budget || cells_per_axis <= 1 {
                return clustered;
            }
            cells_per_axis -= 1;
        }
    }

    fn cluster(&self, lo: Vec3, extent: Vec3, cells: u32) -> ModelGeometry {
        let max_cell = UVec3::splat(cells - 1);
        let mut slot_of_cell: HashMap<UVec3, u32> = HashMap::new();
        let mut sums: Vec<(Vec3, Vec3, u32)> = Vec::new();
        let mut remap = Vec::with_capacity(self.positions.len());

        for (i, p) in self.positions.iter().enumerate() {
            let t = (*p - lo) / extent * cells as f32;
            let cell = t.floor().as_uvec3().min(max_cell);
            let slot = *slot_of_cell.entry(cell).or_insert_with(|| {
                sums.push((Vec3::ZERO, Vec3::ZERO, 0));
                (sums.len() - 1) as u32
            });
            let entry = &mut sums[slot as usize];
            entry.0 += *p;
            entry.1 += self.normals.get(i).copied().unwrap_or(Vec3::ZERO);
            entry.2 += 1;
            remap.push(slot);
        }

        let mut indices = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            let a = remap[tri[0] as usize];
            let b = remap[tri[1] as usize];
            let c = remap[tri[2] as usize];
            if a != b && b != c && a != c {
                indices.extend_from_slice(&[a, b, c]);
            }
        }

        ModelGeometry {
            positions: sums.iter().map(|(p, _, n)| *p / *n as f32).collect(),
            normals: sums.iter().map(|(_, n, _)| n.normalize_or_zero()).collect(),
            indices,
        }
    }
}

/// One simplified mesh per detail level, derived once from the source model.
#[derive(Debug, Clone, PartialEq)]
pub struct LodChain {
    levels: Vec<ModelGeometry>,
}

impl LodChain {
    pub fn build(source: &ModelGeometry, config: &LodConfig) -> Self {
        let levels = LodLevel::ALL
            .iter()
            .map(|level| source.simplify(config.vertex_budget(*level, source.vertex_count())))
            .collect();
        Self { levels }
    }

    pub fn level(&self, level: LodLevel) -> &ModelGeometry {
        &self.levels[level.index()]
    }
}

/// Parses a GLB and returns the geometry of its first triangle primitive.
///
/// Normals come from the file when present and are otherwise computed by
/// averaging face normals. Images are never decoded.
pub fn load_glb(bytes: &[u8]) -> Result<ModelGeometry> {
    let gltf = gltf::Gltf::from_slice(bytes).context("failed to parse GLB")?;
    let buffers =
        gltf::import_buffers(&gltf.document, None, gltf.blob).context("failed to load buffers")?;

    let mesh = gltf
        .document
        .meshes()
        .next()
        .context("GLB contains no meshes")?;
    let primitive = mesh
        .primitives()
        .next()
        .context("mesh contains no primitives")?;
    ensure!(
        primitive.mode() == gltf::mesh::Mode::Triangles,
        "unsupported primitive mode {:?}, expected Triangles",
        primitive.mode()
    );

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<Vec3> = reader
        .read_positions()
        .context("mesh has no POSITION attribute")?
        .map(Vec3::from)
        .collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    ensure!(
        indices.len().is_multiple_of(3),
        "index count {} is not a multiple of 3",
        indices.len()
    );
    ensure!(
        indices.iter().all(|i| (*i as usize) < positions.len()),
        "index out of range for {} vertices",
        positions.len()
    );

    let normals = match reader.read_normals() {
        Some(iter) => {
            let normals: Vec<Vec3> = iter.map(Vec3::from).collect();
            ensure!(
                normals.len() == positions.len(),
                "normal count ({}) does not match position count ({})",
                normals.len(),
                positions.len()
            );
            normals
        }
        None => compute_smooth_normals(&positions, &indices),
    };

    Ok(ModelGeometry {
        positions,
        normals,
        indices,
    })
}

fn compute_smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (a, b, c) = (positions[i0], positions[i1], positions[i2]);
        let face = (b - a).cross(c - a).normalize_or_zero();
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }
    normals.into_iter().map(Vec3::normalize_or_zero).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat `n` x `n` vertex grid in the XZ plane, two triangles per quad.
    fn grid_mesh(n: u32) -> ModelGeometry {
        let mut positions = Vec::new();
        for z in 0..n {
            for x in 0..n {
                positions.push(Vec3::new(x as f32, 0.0, z as f32));
            }
        }
        let mut indices = Vec::new();
        for z in 0..n - 1 {
            for x in 0..n - 1 {
                let i = z * n + x;
                indices.extend_from_slice(&[i, i + n, i + 1, i + 1, i + n, i + n + 1]);
            }
        }
        ModelGeometry::new(positions, indices)
    }

    #[test]
    fn smooth_normals_single_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = compute_smooth_normals(&positions, &[0, 1, 2]);
        for n in normals {
            assert!((n - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn smooth_normals_degenerate_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        let normals = compute_smooth_normals(&positions, &[0, 1, 2]);
        assert!(normals.iter().all(|n| n.length() < 1e-5));
    }

    #[test]
    fn simplify_respects_budget() {
        let mesh = grid_mesh(20);
        assert_eq!(mesh.vertex_count(), 400);
        for budget in [200, 80, 4] {
            let low = mesh.simplify(budget);
            assert!(low.vertex_count() <= budget, "{} > {budget}", low.vertex_count());
            assert!(low.indices.iter().all(|i| (*i as usize) < low.vertex_count()));
            assert!(low.triangle_count() <= mesh.triangle_count());
        }
    }

    #[test]
    fn simplify_keeps_small_meshes_untouched() {
        let mesh = grid_mesh(3);
        assert_eq!(mesh.simplify(100), mesh);
    }

    #[test]
    fn lod_chain_shrinks_per_level() {
        let mesh = grid_mesh(30);
        let chain = LodChain::build(&mesh, &LodConfig::default());
        assert_eq!(chain.level(LodLevel::High), &mesh);
        let medium = chain.level(LodLevel::Medium).vertex_count();
        let low = chain.level(LodLevel::Low).vertex_count();
        assert!(medium <= 450);
        assert!(low <= 180);
        assert!(low <= medium);
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(load_glb(b"definitely not a model").is_err());
    }
}
