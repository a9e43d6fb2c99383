use egui::{Color32, Pos2, Rect, Shape, Stroke};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::assets::ModelLibrary;
use crate::garden_core::catalogue::PlantCategory;
use crate::garden_core::config::{GridConfig, LodConfig};
use crate::garden_core::environment::EnvironmentState;
use crate::garden_core::heightmap::HeightMap;
use crate::garden_core::instance::{InstanceId, PlacedPlant};
use crate::garden_core::terrain::Ray;
use crate::renderer_wgpu::camera::OrbitCamera;
use crate::renderer_wgpu::sky::SkyPalette;
use crate::renderer_wgpu::weather::{self, RainDrop};

/// Terrain vertices per side; larger height maps are drawn in blocks of cells.
const MAX_TERRAIN_SIDE: usize = 128;
const GRID_SAMPLES: usize = 48;
const RING_SEGMENTS: usize = 24;
const SELECTED: Color32 = Color32::from_rgb(255, 200, 60);
const GHOST: Color32 = Color32::from_rgba_premultiplied(120, 200, 255, 160);

/// The camera bound to the screen rectangle the scene is painted into.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub camera: &'a OrbitCamera,
    pub rect: Rect,
}

impl<'a> SceneView<'a> {
    pub fn new(camera: &'a OrbitCamera, rect: Rect) -> Self {
        Self { camera, rect }
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.rect.width(), self.rect.height())
    }

    pub fn project(&self, point: Vec3) -> Option<Pos2> {
        let local = self.camera.world_to_screen(point, self.size())?;
        Some(self.rect.min + egui::vec2(local.x, local.y))
    }

    /// Projection in viewport-local pixels, the space marquee rectangles use.
    pub fn project_local(&self, point: Vec3) -> Option<Vec2> {
        self.camera.world_to_screen(point, self.size())
    }

    pub fn to_local(&self, pos: Pos2) -> Vec2 {
        Vec2::new(pos.x - self.rect.min.x, pos.y - self.rect.min.y)
    }

    pub fn ray(&self, pos: Pos2) -> Ray {
        self.camera.screen_ray(self.to_local(pos), self.size())
    }
}

/// What one frame of the viewport shows.
pub struct SceneFrame<'a> {
    pub plants: &'a [PlacedPlant],
    pub terrain: &'a HeightMap,
    pub environment: &'a EnvironmentState,
    pub palette: SkyPalette,
    pub grid: Option<&'a GridConfig>,
    pub lod: &'a LodConfig,
    pub hover: Option<Vec3>,
    pub ghost_spread: f32,
    /// Seconds since start, for weather animation.
    pub time: f32,
    pub rain: &'a [RainDrop],
}

struct Triangle {
    points: [Pos2; 3],
    depth: f32,
    color: Color32,
}

/// Paints terrain, grid, plants and overlays with the painter's algorithm.
pub fn paint_scene(painter: &egui::Painter, view: SceneView<'_>, frame: &SceneFrame<'_>, models: &mut ModelLibrary) {
    let sun = frame.environment.sun_direction();
    let eye = view.camera.eye();

    let mut ground = Vec::new();
    terrain_triangles(view, frame, sun, eye, &mut ground);
    painter.add(mesh_shape(ground));

    if let Some(grid) = frame.grid {
        paint_grid(painter, view, frame.terrain, grid);
    }

    let wind = frame.environment.wind_speed();
    let mut foliage = Vec::new();
    for plant in frame.plants {
        let sway = weather::sway(wind, frame.time, plant.id.0 as f32 * 0.37);
        let distance = plant.position.distance(eye);
        let chain = match models.get(&plant.definition.model_url) {
            Some(chain) if frame.lod.draws_mesh(distance) => chain,
            _ => {
                paint_marker(painter, view, plant, sway);
                continue;
            }
        };
        let level = frame.lod.level_for_distance(distance);
        let base = plant_color(plant);
        let model = plant_transform(plant, sway);
        for [a, b, c] in chain.level(level).triangles() {
            let (a, b, c) = (
                model.transform_point3(a),
                model.transform_point3(b),
                model.transform_point3(c),
            );
            let normal = (b - a).cross(c - a).normalize_or_zero();
            push_triangle(view, [a, b, c], shade(base, normal, sun, frame.palette.light), eye, &mut foliage);
        }
    }
    painter.add(mesh_shape(foliage));

    paint_rain(painter, view, frame);

    for plant in frame.plants.iter().filter(|p| p.selected) {
        paint_ring(painter, view, frame.terrain, plant.position, plant.spread() * 0.6, SELECTED);
    }
    if let Some(hover) = frame.hover {
        paint_ring(painter, view, frame.terrain, hover, frame.ghost_spread * 0.5, GHOST);
        if let Some(centre) = view.project(hover) {
            painter.circle_filled(centre, 3.0, GHOST);
        }
    }
}

/// Ground vertices, row-major with `side` per row. Each vertex sits at the
/// centre of one height-map cell, or of a block of cells on maps larger than
/// `MAX_TERRAIN_SIDE`, where it takes the block's highest sample.
pub fn terrain_vertices(terrain: &HeightMap) -> (usize, Vec<Vec3>) {
    let resolution = terrain.resolution();
    let stride = resolution.div_ceil(MAX_TERRAIN_SIDE).max(1);
    let side = resolution.div_ceil(stride);
    let cell = terrain.cell_size();
    let half = terrain.size() * 0.5;

    let mut vertices = Vec::with_capacity(side * side);
    for bz in 0..side {
        for bx in 0..side {
            let (x0, z0) = (bx * stride, bz * stride);
            let (x1, z1) = ((x0 + stride).min(resolution), (z0 + stride).min(resolution));
            let mut sample = 0.0f32;
            for iz in z0..z1 {
                for ix in x0..x1 {
                    sample = sample.max(terrain.sample(ix, iz));
                }
            }
            vertices.push(Vec3::new(
                -half + (x0 + x1) as f32 * 0.5 * cell,
                sample * terrain.height_scale(),
                -half + (z0 + z1) as f32 * 0.5 * cell,
            ));
        }
    }
    (side, vertices)
}

fn terrain_triangles(view: SceneView<'_>, frame: &SceneFrame<'_>, sun: Vec3, eye: Vec3, out: &mut Vec<Triangle>) {
    let (side, vertices) = terrain_vertices(frame.terrain);
    let [r, g, b] = frame.palette.ground;
    let base = Color32::from_rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8);
    let at = |i: usize, j: usize| vertices[j * side + i];

    for j in 0..side.saturating_sub(1) {
        for i in 0..side.saturating_sub(1) {
            let (p00, p10, p01, p11) = (at(i, j), at(i + 1, j), at(i, j + 1), at(i + 1, j + 1));
            for tri in [[p00, p01, p10], [p10, p01, p11]] {
                let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
                push_triangle(view, tri, shade(base, normal, sun, 1.0), eye, out);
            }
        }
    }
}

fn paint_rain(painter: &egui::Painter, view: SceneView<'_>, frame: &SceneFrame<'_>) {
    if frame.rain.is_empty() {
        return;
    }
    let extent = frame.terrain.size();
    let wind = frame.environment.wind_speed();
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(170, 170, 170, 150));
    for drop in frame.rain {
        let [head, tail] = drop.streak(frame.time, extent, wind);
        if let (Some(a), Some(b)) = (view.project(head), view.project(tail)) {
            painter.line_segment([a, b], stroke);
        }
    }
}

fn push_triangle(view: SceneView<'_>, tri: [Vec3; 3], color: Color32, eye: Vec3, out: &mut Vec<Triangle>) {
    let (Some(a), Some(b), Some(c)) = (view.project(tri[0]), view.project(tri[1]), view.project(tri[2])) else {
        return;
    };
    let centre = (tri[0] + tri[1] + tri[2]) / 3.0;
    out.push(Triangle {
        points: [a, b, c],
        depth: centre.distance_squared(eye),
        color,
    });
}

fn mesh_shape(mut triangles: Vec<Triangle>) -> Shape {
    triangles.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    let mut mesh = egui::Mesh::default();
    for tri in &triangles {
        let first = mesh.vertices.len() as u32;
        for p in tri.points {
            mesh.colored_vertex(p, tri.color);
        }
        mesh.add_triangle(first, first + 1, first + 2);
    }
    Shape::mesh(mesh)
}

fn shade(base: Color32, normal: Vec3, sun: Vec3, light: f32) -> Color32 {
    // two-sided so simplified meshes with flipped faces still read
    let lambert = normal.dot(sun).abs();
    let k = (0.35 + 0.65 * lambert * light.clamp(0.0, 1.0)).clamp(0.0, 1.0);
    Color32::from_rgb(
        (base.r() as f32 * k) as u8,
        (base.g() as f32 * k) as u8,
        (base.b() as f32 * k) as u8,
    )
}

fn paint_grid(painter: &egui::Painter, view: SceneView<'_>, terrain: &HeightMap, grid: &GridConfig) {
    let half = (grid.divisions as f32 * grid.cell_size * 0.5).min(terrain.size() * 0.5);
    let stroke = Stroke::new(1.0, Color32::from_rgba_premultiplied(255, 255, 255, 40));
    let lines = (2.0 * half / grid.cell_size.max(1e-3)).round() as usize;

    for line in 0..=lines {
        let offset = -half + line as f32 * grid.cell_size;
        for along_x in [true, false] {
            let points: Vec<Pos2> = (0..=GRID_SAMPLES)
                .filter_map(|s| {
                    let t = -half + 2.0 * half * s as f32 / GRID_SAMPLES as f32;
                    let (x, z) = if along_x { (t, offset) } else { (offset, t) };
                    view.project(Vec3::new(x, terrain.height_at(x, z) + 0.01, z))
                })
                .collect();
            for pair in points.windows(2) {
                painter.line_segment([pair[0], pair[1]], stroke);
            }
        }
    }
}

fn paint_ring(painter: &egui::Painter, view: SceneView<'_>, terrain: &HeightMap, centre: Vec3, radius: f32, color: Color32) {
    let radius = radius.max(0.2);
    let points: Vec<Pos2> = (0..=RING_SEGMENTS)
        .filter_map(|i| {
            let angle = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            let x = centre.x + radius * angle.cos();
            let z = centre.z + radius * angle.sin();
            view.project(Vec3::new(x, terrain.height_at(x, z) + 0.02, z))
        })
        .collect();
    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], Stroke::new(2.0, color));
    }
}

fn paint_marker(painter: &egui::Painter, view: SceneView<'_>, plant: &PlacedPlant, sway: Vec2) {
    let top = plant_transform(plant, sway).transform_point3(Vec3::Y * plant.definition.height.max(0.1));
    let (Some(base), Some(tip)) = (view.project(plant.position), view.project(top)) else {
        return;
    };
    let color = plant_color(plant);
    painter.line_segment([base, tip], Stroke::new(2.0, color));
    let radius = ((tip - base).length() * 0.25).clamp(3.0, 24.0);
    painter.circle_filled(tip, radius, color);
}

/// Model transform with the height and spread overrides applied on top of
/// the instance scale, tilted about the base by `sway` (radians about world
/// X and Z).
pub fn plant_transform(plant: &PlacedPlant, sway: Vec2) -> Mat4 {
    let ratio = |value: f32, nominal: f32| if nominal > 0.0 { value / nominal } else { 1.0 };
    let spread = ratio(plant.spread(), plant.definition.spread);
    let height = ratio(plant.height(), plant.definition.height);
    let scale = plant.scale * Vec3::new(spread, height, spread);
    let rotation = Quat::from_rotation_x(sway.x)
        * Quat::from_rotation_z(sway.y)
        * Quat::from_euler(EulerRot::XYZ, plant.rotation.x, plant.rotation.y, plant.rotation.z);
    Mat4::from_scale_rotation_translation(scale, rotation, plant.position)
}

pub fn plant_color(plant: &PlacedPlant) -> Color32 {
    plant
        .color()
        .and_then(named_color)
        .unwrap_or_else(|| category_color(plant.definition.category))
}

fn category_color(category: PlantCategory) -> Color32 {
    match category {
        PlantCategory::Tree => Color32::from_rgb(46, 110, 52),
        PlantCategory::Shrub => Color32::from_rgb(70, 130, 60),
        PlantCategory::Flower => Color32::from_rgb(210, 90, 140),
        PlantCategory::Groundcover => Color32::from_rgb(100, 150, 70),
        PlantCategory::Grass => Color32::from_rgb(130, 170, 80),
        PlantCategory::Other => Color32::from_rgb(120, 140, 110),
    }
}

/// Parses `#rrggbb` or one of a few common colour names.
pub fn named_color(name: &str) -> Option<Color32> {
    let name = name.trim();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        return Some(Color32::from_rgb((value >> 16) as u8, (value >> 8) as u8, value as u8));
    }
    let rgb = match name.to_ascii_lowercase().as_str() {
        "red" => (200, 40, 40),
        "pink" => (230, 130, 170),
        "orange" => (235, 140, 40),
        "yellow" => (235, 210, 60),
        "white" => (240, 240, 235),
        "purple" => (130, 70, 160),
        "blue" => (70, 110, 200),
        "green" => (60, 140, 60),
        "darkgreen" => (30, 90, 40),
        "brown" => (120, 80, 45),
        _ => return None,
    };
    Some(Color32::from_rgb(rgb.0, rgb.1, rgb.2))
}

/// Nearest plant whose base or crown projects within `radius` pixels of
/// `pointer`.
pub fn pick_instance(view: SceneView<'_>, plants: &[PlacedPlant], pointer: Pos2, radius: f32) -> Option<InstanceId> {
    plants
        .iter()
        .filter_map(|plant| {
            let crown = plant.position + Vec3::Y * plant.height() * plant.scale.y * 0.5;
            let distance = [plant.position, crown]
                .into_iter()
                .filter_map(|p| view.project(p))
                .map(|p| p.distance(pointer))
                .fold(f32::INFINITY, f32::min);
            (distance <= radius).then_some((distance, plant.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}
