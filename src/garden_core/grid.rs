use glam::Vec3;

/// Rounds `value` to the nearest multiple of `cell_size`. Non-positive or
/// non-finite cell sizes leave the value untouched.
pub fn snap(value: f32, cell_size: f32) -> f32 {
    if cell_size <= 0.0 || !cell_size.is_finite() {
        return value;
    }
    (value / cell_size).round() * cell_size
}

/// Snaps the horizontal components of a world point, keeping its height.
pub fn snap_xz(point: Vec3, cell_size: f32) -> Vec3 {
    Vec3::new(snap(point.x, cell_size), point.y, snap(point.z, cell_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_cell() {
        assert_eq!(snap(3.4, 1.0), 3.0);
        assert_eq!(snap(7.8, 1.0), 8.0);
        assert_eq!(snap(-1.6, 0.5), -1.5);
        assert_eq!(snap_xz(Vec3::new(3.4, 9.0, 7.8), 1.0), Vec3::new(3.0, 9.0, 8.0));
    }

    #[test]
    fn snapping_is_idempotent() {
        for &cell in &[0.1_f32, 0.25, 0.5, 1.0, 1.7, 3.0, 10.0] {
            for i in -200..200 {
                let v = i as f32 * 0.37;
                let once = snap(v, cell);
                assert_eq!(snap(once, cell), once, "cell {cell} value {v}");
            }
        }
    }

    #[test]
    fn invalid_cell_size_is_a_no_op() {
        assert_eq!(snap(1.23, 0.0), 1.23);
        assert_eq!(snap(1.23, -2.0), 1.23);
        assert_eq!(snap(1.23, f32::NAN), 1.23);
    }
}
