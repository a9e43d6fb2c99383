use egui::{Color32, PointerButton, Pos2, Sense, Stroke};
use glam::Vec2;

use crate::assets::ModelLibrary;
use crate::garden_core::config::CameraConfig;
use crate::garden_core::instance::InstanceId;
use crate::garden_core::selection::ScreenRect;
use crate::garden_core::tool::ToolMode;
use crate::garden_runtime::GardenRuntime;
use crate::renderer_wgpu::camera::{OrbitCamera, OrbitController};
use crate::renderer_wgpu::scene::{self, SceneFrame, SceneView};
use crate::renderer_wgpu::sky::SkyPalette;
use crate::renderer_wgpu::weather::RainField;

const PICK_RADIUS: f32 = 14.0;
const MIN_MARQUEE: f32 = 4.0;

/// What the current primary-button drag is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Plants,
    Marquee(Pos2),
    Sculpt,
    Orbit,
}

/// The 3D garden, painted with egui shapes and driven by pointer input.
pub struct Viewport {
    camera: OrbitCamera,
    controller: OrbitController,
    gesture: Option<Gesture>,
    rain: RainField,
}

impl Viewport {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            camera: OrbitCamera::new(config),
            controller: OrbitController::new(config),
            gesture: None,
            rain: RainField::new(0x5eed),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn ui(&mut self, ctx: &egui::Context, runtime: &mut GardenRuntime, models: &mut ModelLibrary, palette: SkyPalette) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
                self.handle_input(ctx, &response, runtime);
                self.controller.update_camera(&mut self.camera);

                let view = SceneView::new(&self.camera, rect);
                let painter = ui.painter_at(rect);
                let ghost_spread = runtime.selected_plant().map_or(1.0, |p| p.spread);
                let grid = runtime.grid_visible().then_some(&runtime.config().grid);
                let time = ctx.input(|i| i.time) as f32;
                let rain = self.rain.sync(runtime.environment().rain_intensity());
                let frame = SceneFrame {
                    plants: &runtime.active_page().plants,
                    terrain: runtime.terrain(),
                    environment: runtime.environment(),
                    palette,
                    grid,
                    lod: &runtime.config().lod,
                    hover: runtime.hover_point(),
                    ghost_spread,
                    time,
                    rain,
                };
                scene::paint_scene(&painter, view, &frame, models);

                if let (Some(Gesture::Marquee(start)), Some(end)) = (self.gesture, response.interact_pointer_pos()) {
                    paint_marquee(&painter, start, end);
                }
                painter.text(
                    rect.left_bottom() + egui::vec2(8.0, -8.0),
                    egui::Align2::LEFT_BOTTOM,
                    hint(runtime.tool()),
                    egui::FontId::proportional(13.0),
                    Color32::from_white_alpha(180),
                );
            });
    }

    fn handle_input(&mut self, ctx: &egui::Context, response: &egui::Response, runtime: &mut GardenRuntime) {
        let view = SceneView::new(&self.camera, response.rect);
        let (modifiers, scroll) = ctx.input(|i| (i.modifiers, i.smooth_scroll_delta.y));
        let modifier = modifiers.shift || modifiers.command;

        let hover_ray = response.hover_pos().map(|pos| view.ray(pos));
        runtime.hover(hover_ray.as_ref());

        if response.hovered() && scroll != 0.0 {
            self.controller.scroll(scroll);
        }
        if response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle) {
            let delta = response.drag_delta();
            self.controller.drag(Vec2::new(delta.x, delta.y));
        }

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ctx
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            self.gesture = origin.and_then(|origin| self.start_gesture(view, origin, runtime));
        }

        if response.dragged_by(PointerButton::Primary) {
            let pos = response.interact_pointer_pos();
            match self.gesture {
                Some(Gesture::Plants) => {
                    if let Some(pos) = pos {
                        runtime.drag_to(&view.ray(pos));
                    }
                }
                Some(Gesture::Sculpt) => {
                    if let Some(hit) = pos.and_then(|p| runtime.terrain().raycast(&view.ray(p))) {
                        let steps = if modifiers.shift { -1.0 } else { 1.0 };
                        runtime.adjust_terrain(hit.x, hit.z, steps);
                    }
                }
                Some(Gesture::Orbit) => {
                    let delta = response.drag_delta();
                    self.controller.drag(Vec2::new(delta.x, delta.y));
                }
                Some(Gesture::Marquee(_)) | None => {}
            }
        }

        if response.drag_stopped_by(PointerButton::Primary) {
            let end = response
                .interact_pointer_pos()
                .filter(|p| response.rect.contains(*p));
            match self.gesture.take() {
                Some(Gesture::Plants) => {
                    let ray = end.map(|p| view.ray(p));
                    let outcome = runtime.end_drag(ray.as_ref());
                    log::debug!("drag finished: {outcome:?}");
                }
                Some(Gesture::Marquee(start)) => {
                    if let Some(end) = end {
                        let rect = ScreenRect::from_corners(view.to_local(start), view.to_local(end));
                        if rect.size().max_element() >= MIN_MARQUEE {
                            runtime.marquee_select(rect, modifier, |p| view.project_local(p));
                        }
                    }
                }
                _ => {}
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.click(view, pos, modifier, runtime);
            }
        }

        if runtime.tool() == ToolMode::Terrain {
            if let Some(hit) = hover_ray.and_then(|ray| runtime.terrain().raycast(&ray)) {
                let (raise, lower) = ctx.input(|i| (i.key_pressed(egui::Key::Q), i.key_pressed(egui::Key::E)));
                if raise && !ctx.wants_keyboard_input() {
                    runtime.adjust_terrain(hit.x, hit.z, 1.0);
                }
                if lower && !ctx.wants_keyboard_input() {
                    runtime.adjust_terrain(hit.x, hit.z, -1.0);
                }
            }
        }
    }

    fn start_gesture(&self, view: SceneView<'_>, origin: Pos2, runtime: &mut GardenRuntime) -> Option<Gesture> {
        let hit = self.pick(view, origin, runtime);
        match runtime.tool() {
            ToolMode::Move => match hit {
                Some(id) if runtime.begin_drag(id, &view.ray(origin)) => Some(Gesture::Plants),
                _ => Some(Gesture::Orbit),
            },
            ToolMode::Select => Some(Gesture::Marquee(origin)),
            ToolMode::Terrain => Some(Gesture::Sculpt),
            tool if tool.orbits_camera() => Some(Gesture::Orbit),
            _ => None,
        }
    }

    fn click(&self, view: SceneView<'_>, pos: Pos2, modifier: bool, runtime: &mut GardenRuntime) {
        match self.pick(view, pos, runtime) {
            Some(id) if runtime.tool() != ToolMode::Add => {
                if let Err(e) = runtime.click_instance(id, modifier) {
                    log::warn!("click on {id} ignored: {e}");
                }
            }
            _ => {
                runtime.click_ground(&view.ray(pos), modifier);
            }
        }
    }

    fn pick(&self, view: SceneView<'_>, pos: Pos2, runtime: &GardenRuntime) -> Option<InstanceId> {
        scene::pick_instance(view, &runtime.active_page().plants, pos, PICK_RADIUS)
    }
}

fn paint_marquee(painter: &egui::Painter, a: Pos2, b: Pos2) {
    let stroke = Stroke::new(1.0, Color32::from_rgb(120, 200, 255));
    let corners = [a, Pos2::new(b.x, a.y), b, Pos2::new(a.x, b.y)];
    for i in 0..4 {
        painter.line_segment([corners[i], corners[(i + 1) % 4]], stroke);
    }
}

fn hint(tool: ToolMode) -> &'static str {
    match tool {
        ToolMode::Select => "click to select, drag for a box, shift adds",
        ToolMode::Move => "drag plants to move the selection",
        ToolMode::Add => "click the ground to place the chosen plant",
        ToolMode::Delete => "click a plant to remove it",
        ToolMode::Edit => "click a plant to customise it",
        ToolMode::Terrain => "drag or press Q to raise, shift-drag or E to lower",
    }
}
