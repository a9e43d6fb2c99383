use glam::Vec3;

use crate::garden_core::heightmap::HeightMap;

const BISECTION_STEPS: usize = 20;
/// The bounding slab dips slightly below zero so rays grazing flat ground still cross it.
const FLOOR_MARGIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane `y = height`, if it lies ahead of the origin.
    pub fn intersect_plane_y(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.at(t))
    }
}

impl HeightMap {
    /// First point where `ray` meets the terrain surface, or `None` if it
    /// misses the ground entirely.
    pub fn raycast(&self, ray: &Ray) -> Option<Vec3> {
        if ray.direction == Vec3::ZERO {
            return None;
        }
        let half = self.size() * 0.5;
        let min = Vec3::new(-half, -FLOOR_MARGIN, -half);
        let max = Vec3::new(half, self.height_scale() + FLOOR_MARGIN, half);
        let (t_enter, t_exit) = slab_interval(ray, min, max)?;

        let below = |t: f32| {
            let p = ray.at(t);
            p.y - self.height_at(p.x, p.z) <= 0.0
        };

        if below(t_enter) {
            return Some(self.surface_point(ray.at(t_enter)));
        }

        let step = (self.cell_size() * 0.5).max(1e-3);
        let mut prev = t_enter;
        loop {
            let t = (prev + step).min(t_exit);
            if below(t) {
                let (mut lo, mut hi) = (prev, t);
                for _ in 0..BISECTION_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if below(mid) {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                return Some(self.surface_point(ray.at(hi)));
            }
            if t >= t_exit {
                return None;
            }
            prev = t;
        }
    }

    fn surface_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(p.x, self.height_at(p.x, p.z), p.z)
    }
}

fn slab_interval(ray: &Ray, min: Vec3, max: Vec3) -> Option<(f32, f32)> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        if dir.abs() < 1e-8 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t0 = (min[axis] - origin) * inv;
        let mut t1 = (max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    t_exit.is_finite().then_some((t_enter, t_exit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_ray_hits_flat_ground() {
        let map = HeightMap::flat(128, 100.0, 5.0);
        let hit = map
            .raycast(&Ray::new(Vec3::new(3.4, 20.0, 7.8), Vec3::NEG_Y))
            .unwrap();
        assert!((hit - Vec3::new(3.4, 0.0, 7.8)).length() < 1e-3);
    }

    #[test]
    fn oblique_ray_hits_flat_ground() {
        let map = HeightMap::flat(128, 100.0, 5.0);
        let hit = map
            .raycast(&Ray::new(Vec3::new(0.0, 10.0, 10.0), Vec3::new(0.0, -1.0, -1.0)))
            .unwrap();
        assert!((hit - Vec3::ZERO).length() < 0.05, "hit {hit:?}");
    }

    #[test]
    fn raised_cell_is_hit_on_top() {
        let mut map = HeightMap::flat(100, 100.0, 5.0);
        map.apply_stroke(0.5, 0.5, 1.0, 0.0);
        let hit = map
            .raycast(&Ray::new(Vec3::new(0.5, 30.0, 0.5), Vec3::NEG_Y))
            .unwrap();
        assert!((hit.y - 5.0).abs() < 1e-3);
    }

    #[test]
    fn ray_outside_ground_misses() {
        let map = HeightMap::flat(64, 100.0, 5.0);
        assert!(map
            .raycast(&Ray::new(Vec3::new(80.0, 10.0, 0.0), Vec3::NEG_Y))
            .is_none());
        assert!(map
            .raycast(&Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y))
            .is_none());
    }

    #[test]
    fn plane_intersection_ignores_hits_behind_origin() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = ray.intersect_plane_y(0.0).unwrap();
        assert!((hit - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert!(ray.intersect_plane_y(10.0).is_none());
    }
}
