use glam::{Mat4, Vec2, Vec3};

use crate::garden_core::config::CameraConfig;
use crate::garden_core::terrain::Ray;

const MIN_PITCH: f32 = 0.05;
const MAX_PITCH: f32 = 1.5;
const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 120.0;

/// Camera circling a target point on the ground.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            yaw: config.yaw,
            pitch: config.pitch,
            distance: config.distance,
            fov_y_radians: config.fov_degrees.to_radians(),
            near: 0.05,
            far: 1000.0,
        };
        camera.clamp();
        camera
    }

    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        );
        self.target + offset * self.distance
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fov_y_radians, aspect.max(1e-3), self.near, self.far);
        projection * view
    }

    /// Ray through `pixel`, measured from the viewport's top-left corner.
    pub fn screen_ray(&self, pixel: Vec2, viewport: Vec2) -> Ray {
        let ndc = Vec2::new(
            2.0 * pixel.x / viewport.x.max(1.0) - 1.0,
            1.0 - 2.0 * pixel.y / viewport.y.max(1.0),
        );
        let inverse = self.view_projection(aspect(viewport)).inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// Viewport pixel for `point`, or `None` when it lies behind the camera.
    pub fn world_to_screen(&self, point: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection(aspect(viewport)) * point.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch += delta_pitch;
        self.clamp();
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance *= factor;
        self.clamp();
    }

    pub fn set(&mut self, yaw: Option<f32>, pitch: Option<f32>, distance: Option<f32>) {
        if let Some(yaw) = yaw {
            self.yaw = yaw;
        }
        if let Some(pitch) = pitch {
            self.pitch = pitch;
        }
        if let Some(distance) = distance {
            self.distance = distance;
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        self.yaw = self.yaw.rem_euclid(std::f32::consts::TAU);
        self.pitch = self.pitch.clamp(MIN_PITCH, MAX_PITCH);
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

fn aspect(viewport: Vec2) -> f32 {
    viewport.x / viewport.y.max(1.0)
}

/// Collects pointer drags and wheel ticks between frames.
pub struct OrbitController {
    drag: Vec2,
    scroll: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
}

impl OrbitController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            drag: Vec2::ZERO,
            scroll: 0.0,
            sensitivity: config.orbit_sensitivity,
            zoom_speed: config.zoom_speed,
        }
    }

    pub fn drag(&mut self, delta: Vec2) {
        self.drag += delta;
    }

    pub fn scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    pub fn reset_inputs(&mut self) {
        self.drag = Vec2::ZERO;
        self.scroll = 0.0;
    }

    pub fn update_camera(&mut self, camera: &mut OrbitCamera) {
        if self.drag != Vec2::ZERO {
            camera.orbit(self.drag.x * self.sensitivity, self.drag.y * self.sensitivity);
        }
        if self.scroll != 0.0 {
            // scrolling up brings the camera closer
            camera.zoom((-self.scroll * self.zoom_speed).exp());
        }
        self.reset_inputs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn default_view_looks_down_at_the_origin() {
        let camera = OrbitCamera::new(&CameraConfig::default());
        let eye = camera.eye();
        assert!(eye.y > 0.0);
        assert!(eye.z > 0.0);
        assert!(eye.x.abs() < 1e-4);
        assert!((eye.length() - 11.2).abs() < 1e-3);
    }

    #[test]
    fn centre_ray_passes_through_the_target() {
        let camera = OrbitCamera::new(&CameraConfig::default());
        let ray = camera.screen_ray(VIEWPORT * 0.5, VIEWPORT);
        let hit = ray.intersect_plane_y(0.0).unwrap();
        assert!(hit.length() < 1e-2, "hit {hit:?}");
    }

    #[test]
    fn projection_and_rays_agree() {
        let camera = OrbitCamera::new(&CameraConfig::default());
        let point = Vec3::new(2.0, 0.0, -1.5);
        let pixel = camera.world_to_screen(point, VIEWPORT).unwrap();
        let hit = camera
            .screen_ray(pixel, VIEWPORT)
            .intersect_plane_y(0.0)
            .unwrap();
        assert!((hit - point).length() < 1e-2, "hit {hit:?}");
    }

    #[test]
    fn points_behind_the_camera_are_not_projected() {
        let camera = OrbitCamera::new(&CameraConfig::default());
        let behind = camera.eye() + (camera.eye() - camera.target);
        assert!(camera.world_to_screen(behind, VIEWPORT).is_none());
    }

    #[test]
    fn controller_orbits_and_zooms_within_limits() {
        let config = CameraConfig::default();
        let mut camera = OrbitCamera::new(&config);
        let mut controller = OrbitController::new(&config);

        controller.drag(Vec2::new(0.0, 10_000.0));
        controller.update_camera(&mut camera);
        assert_eq!(camera.pitch, MAX_PITCH);

        controller.scroll(100_000.0);
        controller.update_camera(&mut camera);
        assert_eq!(camera.distance, MIN_DISTANCE);

        let before = camera.clone();
        controller.update_camera(&mut camera);
        assert_eq!(camera, before);
    }
}
