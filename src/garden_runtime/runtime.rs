use std::sync::mpsc::Receiver;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::garden_core::catalogue::{Catalogue, PlantDefinition, PlantId};
use crate::garden_core::config::GardenConfig;
use crate::garden_core::drag::{DragController, DragOutcome, DragPhase};
use crate::garden_core::environment::{EnvironmentState, Season};
use crate::garden_core::error::{GardenError, GardenResult};
use crate::garden_core::grid;
use crate::garden_core::growth::{self, GrowthClock, GrowthReport};
use crate::garden_core::heightmap::HeightMap;
use crate::garden_core::instance::{Customization, InstanceId, PlacedPlant};
use crate::garden_core::project::{Project, ProjectPage};
use crate::garden_core::save::{GridSave, ProjectFile, FORMAT_VERSION};
use crate::garden_core::selection::{self, ScreenRect, SelectionSet};
use crate::garden_core::terrain::Ray;
use crate::garden_core::tool::ToolMode;
use crate::garden_runtime::snapshot::{GardenSnapshot, SnapshotHub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeStats {
    pub revision: u64,
    pub pages: usize,
    pub plants: usize,
    pub selected: usize,
    pub hour: f32,
    pub season: Season,
}

/// Owns every piece of mutable editor state. All changes go through the
/// command methods below; each one leaves the selection pointing only at
/// plants on the active page and publishes a snapshot when something changed.
pub struct GardenRuntime {
    config: GardenConfig,
    catalogue: Catalogue,
    project: Project,
    selection: SelectionSet,
    tool: ToolMode,
    catalogue_open: bool,
    selected_plant: Option<PlantId>,
    editing: Option<InstanceId>,
    drag: DragController,
    hover: Option<Vec3>,
    environment: EnvironmentState,
    terrain: Arc<HeightMap>,
    grid_snap: bool,
    grid_visible: bool,
    growth_clock: GrowthClock,
    rng: StdRng,
    revision: u64,
    hub: SnapshotHub,
}

impl GardenRuntime {
    pub fn new(config: GardenConfig, catalogue: Catalogue) -> Self {
        Self::with_rng(config, catalogue, StdRng::from_os_rng())
    }

    pub fn with_seed(config: GardenConfig, catalogue: Catalogue, seed: u64) -> Self {
        Self::with_rng(config, catalogue, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GardenConfig, catalogue: Catalogue, rng: StdRng) -> Self {
        let selected_plant = catalogue.first().map(|p| p.id);
        Self {
            environment: EnvironmentState::from_config(&config.environment),
            terrain: Arc::new(HeightMap::from_config(&config.ground)),
            grid_snap: config.grid.snap,
            grid_visible: config.grid.visible,
            config,
            catalogue,
            project: Project::default(),
            selection: SelectionSet::default(),
            tool: ToolMode::default(),
            catalogue_open: false,
            selected_plant,
            editing: None,
            drag: DragController::default(),
            hover: None,
            growth_clock: GrowthClock::default(),
            rng,
            revision: 0,
            hub: SnapshotHub::default(),
        }
    }

    // -- queries ------------------------------------------------------------

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn active_page(&self) -> &ProjectPage {
        self.project.active_page()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn catalogue_open(&self) -> bool {
        self.catalogue_open
    }

    pub fn selected_plant(&self) -> Option<&PlantDefinition> {
        self.selected_plant.and_then(|id| self.catalogue.get(id))
    }

    pub fn editing(&self) -> Option<&PlacedPlant> {
        self.editing.and_then(|id| self.active_page().get(id))
    }

    pub fn hover_point(&self) -> Option<Vec3> {
        self.hover
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    pub fn environment(&self) -> &EnvironmentState {
        &self.environment
    }

    pub fn terrain(&self) -> &HeightMap {
        &self.terrain
    }

    pub fn grid_snap(&self) -> bool {
        self.grid_snap
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            revision: self.revision,
            pages: self.project.pages().len(),
            plants: self.active_page().plants.len(),
            selected: self.selection.len(),
            hour: self.environment.time_of_day(),
            season: self.environment.season(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<Arc<GardenSnapshot>> {
        self.hub.subscribe()
    }

    pub fn snapshot(&self) -> GardenSnapshot {
        GardenSnapshot {
            revision: self.revision,
            tool: self.tool,
            catalogue_open: self.catalogue_open,
            selected_plant: self.selected_plant,
            pages: self.project.pages().iter().map(|p| p.name.clone()).collect(),
            active_page: self.project.active_index(),
            plants: self.active_page().plants.clone(),
            selection: self.selection.iter().collect(),
            editing: self.editing,
            hover: self.hover,
            drag: self.drag.phase(),
            environment: self.environment.clone(),
            grid_snap: self.grid_snap,
            grid_visible: self.grid_visible,
            terrain: Arc::clone(&self.terrain),
        }
    }

    /// Ground point a placement or hover at `ray` would use: the terrain hit,
    /// snapped to the grid when enabled, resting on the ground.
    pub fn placement_point(&self, ray: &Ray) -> Option<Vec3> {
        let hit = self.terrain.raycast(ray)?;
        Some(self.ground_point(hit.x, hit.z))
    }

    fn ground_point(&self, x: f32, z: f32) -> Vec3 {
        let p = match self.snap_cell() {
            Some(cell) => grid::snap_xz(Vec3::new(x, 0.0, z), cell),
            None => Vec3::new(x, 0.0, z),
        };
        Vec3::new(p.x, self.terrain.height_at(p.x, p.z), p.z)
    }

    fn snap_cell(&self) -> Option<f32> {
        self.grid_snap.then_some(self.config.grid.cell_size)
    }

    // -- catalogue and tools ------------------------------------------------

    pub fn select_catalogue_entry(&mut self, id: Option<PlantId>) -> GardenResult<()> {
        if let Some(id) = id {
            if self.catalogue.get(id).is_none() {
                return Err(GardenError::UnknownPlant(id));
            }
        }
        if self.selected_plant != id {
            self.selected_plant = id;
            self.commit();
        }
        Ok(())
    }

    pub fn set_catalogue_open(&mut self, open: bool) {
        if self.catalogue_open != open {
            self.catalogue_open = open;
            self.commit();
        }
    }

    /// Swaps in a reloaded catalogue. Placed plants keep the definition they were created with.
    pub fn replace_catalogue(&mut self, catalogue: Catalogue) {
        self.catalogue = catalogue;
        if self.selected_plant.is_some_and(|id| self.catalogue.get(id).is_none()) {
            self.selected_plant = self.catalogue.first().map(|p| p.id);
        }
        self.commit();
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        if self.drag.is_active() {
            self.drag.cancel(self.project.active_page_mut());
        }
        self.tool = tool;
        self.catalogue_open = tool.keeps_catalogue_open();
        if !tool.keeps_selection() {
            self.selection.clear();
        }
        if tool != ToolMode::Edit {
            self.editing = None;
        }
        if tool != ToolMode::Add {
            self.hover = None;
        }
        log::debug!("tool set to {}", tool.label());
        self.commit();
    }

    pub fn set_grid_snap(&mut self, snap: bool) {
        self.grid_snap = snap;
        self.commit();
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid_visible = visible;
        self.commit();
    }

    // -- placement ----------------------------------------------------------

    /// Updates the placement ghost. Only the Add tool shows one.
    pub fn hover(&mut self, ray: Option<&Ray>) -> Option<Vec3> {
        let next = match ray {
            Some(ray) if self.tool == ToolMode::Add && self.selected_plant.is_some() => {
                self.placement_point(ray)
            }
            _ => None,
        };
        if next != self.hover {
            self.hover = next;
            self.commit();
        }
        next
    }

    pub fn place_plant(&mut self, ray: &Ray) -> Option<InstanceId> {
        if self.tool != ToolMode::Add {
            return None;
        }
        let point = self.placement_point(ray)?;
        self.place_at_point(point)
    }

    /// Places the selected catalogue entry at a ground coordinate without a
    /// pointer ray. Respects the tool and grid rules like `place_plant`.
    pub fn place_at(&mut self, x: f32, z: f32) -> Option<InstanceId> {
        if self.tool != ToolMode::Add || !self.terrain.contains(x, z) {
            return None;
        }
        let point = self.ground_point(x, z);
        self.place_at_point(point)
    }

    fn place_at_point(&mut self, position: Vec3) -> Option<InstanceId> {
        let definition = self.selected_plant().cloned()?;
        let jitter = self.config.placement.scale_jitter.clamp(0.0, 0.99);
        let mut factor = || {
            if jitter > 0.0 {
                self.rng.random_range(1.0 - jitter..=1.0 + jitter)
            } else {
                1.0
            }
        };
        let scale = definition.scale * Vec3::new(factor(), factor(), factor());
        let yaw = self.rng.random_range(0.0..std::f32::consts::TAU);

        let id = self.project.allocate_id();
        log::info!("placed {} {id} at {position}", definition.name);
        let plant = PlacedPlant::new(id, definition, position, yaw, scale);
        self.project.active_page_mut().plants.push(plant);
        self.commit();
        Some(id)
    }

    // -- selection ----------------------------------------------------------

    /// Pointer click on a plant; what it does depends on the tool.
    pub fn click_instance(&mut self, id: InstanceId, modifier: bool) -> GardenResult<()> {
        if !self.active_page().contains(id) {
            return Err(GardenError::UnknownInstance(id));
        }
        match self.tool {
            ToolMode::Select => self.selection.click(id, modifier),
            ToolMode::Move => {
                if !self.selection.contains(id) {
                    self.selection.click(id, false);
                }
            }
            ToolMode::Delete => {
                self.delete_instance(id)?;
                return Ok(());
            }
            ToolMode::Edit => {
                self.selection.click(id, false);
                self.editing = Some(id);
            }
            ToolMode::Add | ToolMode::Terrain => return Ok(()),
        }
        self.commit();
        Ok(())
    }

    /// Pointer click that hit no plant.
    pub fn click_ground(&mut self, ray: &Ray, modifier: bool) -> Option<InstanceId> {
        match self.tool {
            ToolMode::Add => self.place_plant(ray),
            ToolMode::Select if !modifier => {
                self.clear_selection();
                None
            }
            ToolMode::Edit => {
                if self.editing.take().is_some() {
                    self.commit();
                }
                None
            }
            _ => None,
        }
    }

    /// Selects every plant whose projected position lies inside `rect`.
    /// Returns the number of plants matched.
    pub fn marquee_select<F>(&mut self, rect: ScreenRect, additive: bool, project: F) -> usize
    where
        F: Fn(Vec3) -> Option<Vec2>,
    {
        if self.tool != ToolMode::Select {
            return 0;
        }
        let hits = selection::marquee(self.active_page(), rect, project);
        let count = hits.len();
        self.selection.replace(hits, additive);
        self.commit();
        count
    }

    /// Replaces the selection with the given ids; ids not on the active page are ignored.
    pub fn select_instances(&mut self, ids: &[InstanceId], additive: bool) {
        self.selection.replace(ids.iter().copied(), additive);
        self.commit();
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() && self.editing.is_none() {
            return;
        }
        self.selection.clear();
        self.editing = None;
        self.commit();
    }

    // -- drag ---------------------------------------------------------------

    /// Pointer-down on a plant with the Move tool. An unselected plant
    /// becomes the whole selection before the drag starts.
    pub fn begin_drag(&mut self, id: InstanceId, ray: &Ray) -> bool {
        if !self.tool.drags_plants() || self.drag.is_active() {
            return false;
        }
        let Some(plant) = self.active_page().get(id) else {
            return false;
        };
        let plant_y = plant.position.y;
        let Some(ground) = self
            .terrain
            .raycast(ray)
            .or_else(|| ray.intersect_plane_y(plant_y))
        else {
            return false;
        };

        if !self.selection.contains(id) {
            self.selection.click(id, false);
        }
        let snap = self.snap_cell();
        let started = self
            .drag
            .begin(self.project.active_page(), &self.selection, id, ground, snap);
        if started {
            self.commit();
        }
        started
    }

    pub fn drag_to(&mut self, ray: &Ray) -> Option<Vec3> {
        if !self.drag.is_active() {
            return None;
        }
        let point = self.terrain.raycast(ray);
        let snap = self.snap_cell();
        let delta = self
            .drag
            .update(self.project.active_page_mut(), point, snap)?;
        if delta != Vec3::ZERO {
            self.commit();
        }
        Some(delta)
    }

    /// Pointer release. `None` means the pointer left the viewport, which cancels.
    pub fn end_drag(&mut self, ray: Option<&Ray>) -> DragOutcome {
        let point = ray.and_then(|r| self.terrain.raycast(r));
        let snap = self.snap_cell();
        let outcome = self
            .drag
            .end(self.project.active_page_mut(), &self.terrain, point, snap);
        if outcome != DragOutcome::NotDragging {
            self.commit();
        }
        outcome
    }

    pub fn cancel_drag(&mut self) -> bool {
        let cancelled = self.drag.cancel(self.project.active_page_mut());
        if cancelled {
            self.commit();
        }
        cancelled
    }

    /// Moves the selection by a horizontal offset in one step, as a drag
    /// from the first selected plant would. Each moved plant rests on the ground.
    pub fn move_selected(&mut self, dx: f32, dz: f32) -> usize {
        let ids: Vec<InstanceId> = self.selection.iter().collect();
        let terrain = Arc::clone(&self.terrain);
        let page = self.project.active_page_mut();
        let mut moved = 0;
        for id in ids {
            if let Some(plant) = page.get_mut(id) {
                plant.position.x += dx;
                plant.position.z += dz;
                plant.position.y = terrain.height_at(plant.position.x, plant.position.z);
                moved += 1;
            }
        }
        if moved > 0 {
            self.commit();
        }
        moved
    }

    // -- instance edits -----------------------------------------------------

    pub fn delete_instance(&mut self, id: InstanceId) -> GardenResult<PlacedPlant> {
        if self.drag.is_active() {
            self.drag.cancel(self.project.active_page_mut());
        }
        let removed = self
            .project
            .active_page_mut()
            .remove(id)
            .ok_or(GardenError::UnknownInstance(id))?;
        log::info!("removed {} {id}", removed.definition.name);
        self.commit();
        Ok(removed)
    }

    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        if self.drag.is_active() {
            self.drag.cancel(self.project.active_page_mut());
        }
        let selected = self.selection.clone();
        let page = self.project.active_page_mut();
        let before = page.plants.len();
        page.plants.retain(|p| !selected.contains(p.id));
        let removed = before - page.plants.len();
        self.commit();
        removed
    }

    pub fn customize(&mut self, id: InstanceId, customization: Customization) -> GardenResult<()> {
        let plant = self
            .project
            .active_page_mut()
            .get_mut(id)
            .ok_or(GardenError::UnknownInstance(id))?;
        plant.customization = customization;
        self.commit();
        Ok(())
    }

    // -- environment --------------------------------------------------------

    pub fn set_time_of_day(&mut self, hour: f32) {
        self.environment.set_time_of_day(hour);
        self.commit();
    }

    pub fn set_season(&mut self, season: Season) {
        self.environment.set_season(season);
        self.commit();
    }

    pub fn set_rain_intensity(&mut self, value: f32) {
        self.environment.set_rain_intensity(value);
        self.commit();
    }

    pub fn set_wind_speed(&mut self, value: f32) {
        self.environment.set_wind_speed(value);
        self.commit();
    }

    pub fn set_cloud_cover(&mut self, value: f32) {
        self.environment.set_cloud_cover(value);
        self.commit();
    }

    pub fn set_time_speed(&mut self, value: f32) {
        self.environment.set_time_speed(value);
        self.commit();
    }

    pub fn set_day_speed(&mut self, value: f32) {
        self.environment.day_speed = if value.is_finite() { value } else { 0.0 };
        self.commit();
    }

    // -- terrain ------------------------------------------------------------

    /// One terrain stroke at `(x, z)`: `steps` multiples of the configured
    /// stroke delta, positive to raise. Plants near the stroke are re-seated
    /// on the new surface. Returns the number of samples changed.
    pub fn adjust_terrain(&mut self, x: f32, z: f32, steps: f32) -> usize {
        let delta = self.config.ground.stroke_delta * steps;
        let radius = self.config.ground.brush_radius;
        let changed = Arc::make_mut(&mut self.terrain).apply_stroke(x, z, delta, radius);
        if changed == 0 {
            return 0;
        }

        let reach = radius + self.terrain.cell_size() * std::f32::consts::SQRT_2;
        let terrain = Arc::clone(&self.terrain);
        for page in self.project.pages_mut() {
            for plant in &mut page.plants {
                let d = Vec2::new(plant.position.x - x, plant.position.z - z);
                if d.length() <= reach {
                    plant.position.y = terrain.height_at(plant.position.x, plant.position.z);
                }
            }
        }
        self.commit();
        changed
    }

    // -- pages --------------------------------------------------------------

    pub fn add_page(&mut self, name: impl Into<String>) -> usize {
        let index = self.project.add_page(name);
        self.commit();
        index
    }

    pub fn set_active_page(&mut self, index: usize) -> GardenResult<()> {
        if index == self.project.active_index() {
            return Ok(());
        }
        self.drag.cancel(self.project.active_page_mut());
        self.project.set_active(index)?;
        self.selection.clear();
        self.editing = None;
        self.commit();
        Ok(())
    }

    pub fn rename_page(&mut self, index: usize, name: impl Into<String>) -> GardenResult<()> {
        self.project.rename_page(index, name)?;
        self.commit();
        Ok(())
    }

    pub fn duplicate_page(&mut self, index: usize) -> GardenResult<usize> {
        let copy = self.project.duplicate_page(index)?;
        self.commit();
        Ok(copy)
    }

    pub fn remove_page(&mut self, index: usize) -> GardenResult<()> {
        let was_active = index == self.project.active_index();
        if was_active {
            self.drag.cancel(self.project.active_page_mut());
        }
        let removed = self.project.remove_page(index)?;
        log::info!("removed page {}", removed.name);
        if was_active {
            self.selection.clear();
            self.editing = None;
        }
        self.commit();
        Ok(())
    }

    // -- time ---------------------------------------------------------------

    /// Per-frame step: advances the clock and runs a growth tick once the
    /// growth interval has elapsed.
    pub fn update(&mut self, dt_seconds: f32) -> Option<GrowthReport> {
        let hour = self.environment.time_of_day();
        self.environment.advance(dt_seconds);
        let clock_moved = self.environment.time_of_day() != hour;

        let report = self
            .growth_clock
            .advance(dt_seconds, self.environment.time_speed(), &self.config.growth)
            .map(|elapsed| {
                growth::tick(
                    self.project.active_page_mut(),
                    &self.environment,
                    &self.config.growth,
                    elapsed,
                )
            });

        if clock_moved || report.is_some() {
            self.commit();
        }
        report
    }

    // -- persistence --------------------------------------------------------

    pub fn to_project_file(&self) -> ProjectFile {
        let mut project = self.project.clone();
        for page in project.pages_mut() {
            for plant in &mut page.plants {
                plant.selected = false;
            }
        }
        ProjectFile {
            format_version: FORMAT_VERSION,
            selected_plant: self.selected_plant,
            project,
            environment: self.environment.clone(),
            grid: GridSave {
                snap: self.grid_snap,
                visible: self.grid_visible,
            },
            terrain: Some(self.terrain.as_ref().clone()),
        }
    }

    pub fn export_project(&self) -> GardenResult<String> {
        self.to_project_file().to_json()
    }

    /// Replaces the whole editing state with a previously exported project.
    /// Nothing changes unless the text parses and validates.
    pub fn import_project(&mut self, json: &str) -> GardenResult<()> {
        let file = ProjectFile::from_json(json)?;
        self.apply_project_file(file);
        Ok(())
    }

    pub fn apply_project_file(&mut self, file: ProjectFile) {
        self.drag.reset();
        self.project = file.project;
        self.environment = file.environment;
        self.grid_snap = file.grid.snap;
        self.grid_visible = file.grid.visible;
        self.terrain = Arc::new(
            file.terrain
                .unwrap_or_else(|| HeightMap::from_config(&self.config.ground)),
        );
        if let Some(id) = file.selected_plant.filter(|id| self.catalogue.get(*id).is_some()) {
            self.selected_plant = Some(id);
        }
        self.selection.clear();
        self.editing = None;
        self.hover = None;
        self.growth_clock.reset();
        log::info!(
            "project loaded: {} pages, {} plants on the active page",
            self.project.pages().len(),
            self.active_page().plants.len()
        );
        self.commit();
    }

    // -- bookkeeping --------------------------------------------------------

    fn commit(&mut self) {
        let active = self.project.active_index();
        self.selection.retain_in(self.project.active_page());
        if self.editing.is_some_and(|id| !self.project.active_page().contains(id)) {
            self.editing = None;
        }
        for (index, page) in self.project.pages_mut().iter_mut().enumerate() {
            if index == active {
                self.selection.write_flags(page);
            } else {
                for plant in &mut page.plants {
                    plant.selected = false;
                }
            }
        }

        self.revision += 1;
        if self.hub.has_subscribers() {
            let snapshot = Arc::new(self.snapshot());
            self.hub.publish(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garden_core::instance::Override;

    fn runtime() -> GardenRuntime {
        GardenRuntime::with_seed(GardenConfig::default(), Catalogue::builtin(), 7)
    }

    fn down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 30.0, z), Vec3::NEG_Y)
    }

    fn place(rt: &mut GardenRuntime, x: f32, z: f32) -> InstanceId {
        rt.set_tool(ToolMode::Add);
        rt.place_plant(&down_at(x, z)).unwrap()
    }

    fn assert_selection_valid(rt: &GardenRuntime) {
        for id in rt.selection().iter() {
            assert!(rt.active_page().contains(id), "stale id {id}");
        }
        for plant in &rt.active_page().plants {
            assert_eq!(plant.selected, rt.selection().contains(plant.id));
        }
    }

    #[test]
    fn placement_snaps_and_rests_on_ground() {
        let mut rt = runtime();
        Arc::make_mut(&mut rt.terrain).apply_stroke(3.0, 8.0, 0.2, 0.0);
        let id = place(&mut rt, 3.4, 7.8);
        let plant = rt.active_page().get(id).unwrap();
        let ground = rt.terrain().height_at(3.0, 8.0);
        assert_eq!(plant.position, Vec3::new(3.0, ground, 8.0));
        assert!(ground > 0.0);
    }

    #[test]
    fn placement_jitters_scale_and_yaw() {
        let mut rt = runtime();
        rt.set_tool(ToolMode::Add);
        for i in 0..20 {
            let id = rt.place_plant(&down_at(i as f32, 0.0)).unwrap();
            let plant = rt.active_page().get(id).unwrap();
            let ratio = plant.scale / plant.definition.scale;
            assert!(ratio.cmpge(Vec3::splat(0.8 - 1e-5)).all());
            assert!(ratio.cmple(Vec3::splat(1.2 + 1e-5)).all());
            assert!((0.0..std::f32::consts::TAU).contains(&plant.rotation.y));
            assert_eq!(plant.rotation.x, 0.0);
        }
        assert_eq!(rt.active_page().plants.len(), 20);
    }

    #[test]
    fn no_placement_without_add_tool_plant_or_hit() {
        let mut rt = runtime();
        assert!(rt.place_plant(&down_at(0.0, 0.0)).is_none());

        rt.set_tool(ToolMode::Add);
        let up = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(rt.place_plant(&up).is_none());

        rt.select_catalogue_entry(None).unwrap();
        assert!(rt.place_plant(&down_at(0.0, 0.0)).is_none());
        assert!(rt.active_page().plants.is_empty());
    }

    #[test]
    fn unknown_catalogue_entry_is_rejected() {
        let mut rt = runtime();
        assert!(matches!(
            rt.select_catalogue_entry(Some(PlantId(999))),
            Err(GardenError::UnknownPlant(_))
        ));
        assert_eq!(rt.selected_plant().map(|p| p.id), Some(PlantId(1)));
    }

    #[test]
    fn tool_switching_rules() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        assert!(rt.catalogue_open());

        rt.set_tool(ToolMode::Select);
        assert!(!rt.catalogue_open());
        rt.click_instance(a, false).unwrap();
        rt.set_tool(ToolMode::Move);
        assert!(rt.selection().contains(a));
        rt.set_tool(ToolMode::Edit);
        assert!(rt.selection().contains(a));
        rt.set_tool(ToolMode::Terrain);
        assert!(rt.selection().is_empty());
    }

    #[test]
    fn click_empty_ground_clears_unless_modifier() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Select);
        rt.click_instance(a, false).unwrap();

        rt.click_ground(&down_at(10.0, 10.0), true);
        assert_eq!(rt.selection().len(), 1);
        rt.click_ground(&down_at(10.0, 10.0), false);
        assert!(rt.selection().is_empty());
    }

    #[test]
    fn dragging_moves_the_group_rigidly() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let b = place(&mut rt, 2.0, 2.0);
        rt.set_tool(ToolMode::Select);
        rt.select_instances(&[a, b], false);
        rt.set_tool(ToolMode::Move);

        assert!(rt.begin_drag(a, &down_at(0.0, 0.0)));
        rt.drag_to(&down_at(1.0, 1.0));
        let outcome = rt.end_drag(Some(&down_at(1.0, 1.0)));
        assert!(matches!(outcome, DragOutcome::Committed { .. }));

        let page = rt.active_page();
        assert_eq!(page.get(a).unwrap().position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(page.get(b).unwrap().position, Vec3::new(3.0, 0.0, 3.0));
        assert_eq!(rt.drag_phase(), DragPhase::Idle);
    }

    #[test]
    fn drag_of_unselected_plant_selects_only_it() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let b = place(&mut rt, 4.0, 0.0);
        rt.set_tool(ToolMode::Select);
        rt.click_instance(a, false).unwrap();
        rt.set_tool(ToolMode::Move);

        rt.begin_drag(b, &down_at(4.0, 0.0));
        assert_eq!(rt.selection().iter().collect::<Vec<_>>(), vec![b]);
        rt.drag_to(&down_at(6.0, 0.0));
        rt.cancel_drag();
        assert_eq!(rt.active_page().get(b).unwrap().position, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(rt.active_page().get(a).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn switching_tools_mid_drag_restores_positions() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let b = place(&mut rt, 2.0, 2.0);
        rt.set_tool(ToolMode::Select);
        rt.select_instances(&[a, b], false);
        rt.set_tool(ToolMode::Move);

        assert!(rt.begin_drag(a, &down_at(0.0, 0.0)));
        rt.drag_to(&down_at(5.0, -3.0));
        assert_eq!(rt.active_page().get(a).unwrap().position, Vec3::new(5.0, 0.0, -3.0));

        rt.set_tool(ToolMode::Select);
        assert_eq!(rt.drag_phase(), DragPhase::Idle);
        assert_eq!(rt.active_page().get(a).unwrap().position, Vec3::ZERO);
        assert_eq!(rt.active_page().get(b).unwrap().position, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(rt.end_drag(Some(&down_at(1.0, 1.0))), DragOutcome::NotDragging);
    }

    #[test]
    fn switching_pages_mid_drag_restores_positions() {
        let mut rt = runtime();
        let a = place(&mut rt, 1.0, 1.0);
        rt.set_tool(ToolMode::Move);
        let other = rt.add_page("Back garden");

        assert!(rt.begin_drag(a, &down_at(1.0, 1.0)));
        rt.drag_to(&down_at(-4.0, 6.0));
        rt.set_active_page(other).unwrap();
        assert_eq!(rt.drag_phase(), DragPhase::Idle);

        rt.set_active_page(0).unwrap();
        assert_eq!(rt.active_page().get(a).unwrap().position, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn select_mode_does_not_drag() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Select);
        assert!(!rt.begin_drag(a, &down_at(0.0, 0.0)));
    }

    #[test]
    fn selection_stays_valid_through_deletes() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let b = place(&mut rt, 3.0, 0.0);
        let c = place(&mut rt, 6.0, 0.0);
        rt.set_tool(ToolMode::Select);
        rt.select_instances(&[a, b, c], false);
        assert_selection_valid(&rt);

        rt.delete_instance(b).unwrap();
        assert_selection_valid(&rt);
        assert_eq!(rt.selection().len(), 2);

        assert_eq!(rt.delete_selected(), 2);
        assert_selection_valid(&rt);
        assert!(rt.active_page().plants.is_empty());
        assert!(matches!(rt.delete_instance(a), Err(GardenError::UnknownInstance(_))));
    }

    #[test]
    fn delete_tool_removes_clicked_plant() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Delete);
        rt.click_instance(a, false).unwrap();
        assert!(rt.active_page().plants.is_empty());
    }

    #[test]
    fn marquee_is_additive_with_modifier() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let b = place(&mut rt, 5.0, 5.0);
        rt.set_tool(ToolMode::Select);
        let top_down = |p: Vec3| Some(Vec2::new(p.x, p.z));

        let rect = ScreenRect::from_corners(Vec2::splat(-1.0), Vec2::splat(1.0));
        assert_eq!(rt.marquee_select(rect, false, top_down), 1);
        let rect = ScreenRect::from_corners(Vec2::splat(4.0), Vec2::splat(6.0));
        rt.marquee_select(rect, true, top_down);
        assert!(rt.selection().contains(a) && rt.selection().contains(b));
        assert_selection_valid(&rt);
    }

    #[test]
    fn switching_pages_clears_selection() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Select);
        rt.click_instance(a, false).unwrap();

        let second = rt.add_page("Front yard");
        rt.set_active_page(second).unwrap();
        assert!(rt.selection().is_empty());
        assert!(rt.project().pages()[0].plants.iter().all(|p| !p.selected));
        assert!(rt.click_instance(a, false).is_err());
    }

    #[test]
    fn edit_tool_opens_inspector_and_customize_applies() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Edit);
        rt.click_instance(a, false).unwrap();
        assert_eq!(rt.editing().map(|p| p.id), Some(a));

        rt.customize(
            a,
            Customization {
                height: Override::Set(4.0),
                ..Customization::default()
            },
        )
        .unwrap();
        assert_eq!(rt.editing().unwrap().height(), 4.0);
    }

    #[test]
    fn terrain_stroke_reseats_nearby_plants() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        rt.set_tool(ToolMode::Terrain);
        for _ in 0..10 {
            rt.adjust_terrain(0.0, 0.0, 1.0);
        }
        let expected = rt.terrain().height_at(0.0, 0.0);
        assert!((expected - 0.5).abs() < 1e-4);
        assert_eq!(rt.active_page().get(a).unwrap().position.y, expected);
    }

    #[test]
    fn growth_runs_once_per_interval() {
        let mut rt = runtime();
        let a = place(&mut rt, 0.0, 0.0);
        let start = rt.active_page().get(a).unwrap().scale;

        assert!(rt.update(0.5).is_none());
        let report = rt.update(0.5).unwrap();
        assert_eq!(report.plants, 1);
        let grown = rt.active_page().get(a).unwrap().scale;
        assert!(grown.x > start.x);
        assert!(grown.cmple(start * 2.0).all());
    }

    #[test]
    fn export_import_round_trip() {
        let mut rt = runtime();
        let a = place(&mut rt, 1.0, 1.0);
        rt.customize(
            a,
            Customization {
                color: Override::Set("purple".into()),
                ..Customization::default()
            },
        )
        .unwrap();
        rt.add_page("Second");
        rt.set_season(Season::Spring);
        let json = rt.export_project().unwrap();

        let mut other = runtime();
        other.import_project(&json).unwrap();
        assert_eq!(other.project(), rt.project());
        assert_eq!(other.environment(), rt.environment());
        assert_eq!(other.terrain(), rt.terrain());
    }

    #[test]
    fn failed_import_leaves_state_alone() {
        let mut rt = runtime();
        place(&mut rt, 1.0, 1.0);
        let before = rt.project().clone();
        assert!(rt.import_project("not json").is_err());
        assert_eq!(rt.project(), &before);
    }

    #[test]
    fn import_with_overflowing_terrain_leaves_state_alone() {
        let mut rt = runtime();
        place(&mut rt, 2.0, 3.0);
        let before = rt.project().clone();
        let terrain_before = rt.terrain().clone();
        let json = r#"{"terrain":{"resolution":4294967296,"size":100.0,"height_scale":5.0,"samples":[]}}"#;

        assert!(rt.import_project(json).is_err());
        assert_eq!(rt.project(), &before);
        assert_eq!(rt.terrain(), &terrain_before);
        assert_eq!(rt.terrain().height_at(2.0, 3.0), 0.0);
    }

    #[test]
    fn subscribers_get_snapshots_and_dropped_ones_are_pruned() {
        let mut rt = runtime();
        let rx = rt.subscribe();
        let dropped = rt.subscribe();
        drop(dropped);

        rt.set_tool(ToolMode::Add);
        let snap = rx.try_recv().unwrap();
        assert_eq!(snap.tool, ToolMode::Add);
        assert!(snap.catalogue_open);
        assert_eq!(rt.hub.len(), 1);

        let id = rt.place_plant(&down_at(2.0, 2.0)).unwrap();
        let snap = rx.try_recv().unwrap();
        assert!(snap.plant(id).is_some());
        assert_eq!(snap.revision, rt.revision());
    }
}
