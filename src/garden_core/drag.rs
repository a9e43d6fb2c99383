use glam::Vec3;

use crate::garden_core::grid;
use crate::garden_core::heightmap::HeightMap;
use crate::garden_core::instance::InstanceId;
use crate::garden_core::project::ProjectPage;
use crate::garden_core::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Pointer is down on a plant but has not moved yet.
    Started,
    Dragging,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub grabbed: InstanceId,
    /// Grabbed plant position minus the (snapped) ground point under the
    /// pointer at drag start. The grabbed plant is held at this offset from
    /// the pointer for the whole drag.
    pub grab_offset: Vec3,
    origins: Vec<(InstanceId, Vec3)>,
    moved: bool,
}

impl DragSession {
    pub fn group(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.origins.iter().map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Committed { moved: Vec<InstanceId> },
    Cancelled,
    NotDragging,
}

/// Rigid-group drag of the selected plants, driven by discrete pointer events.
///
/// Positions are written to the page on every confirmed move; cancelling
/// restores the positions captured at drag start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn phase(&self) -> DragPhase {
        match &self.session {
            None => DragPhase::Idle,
            Some(s) if !s.moved => DragPhase::Started,
            Some(_) => DragPhase::Dragging,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts dragging `grabbed` together with every selected plant. Returns
    /// false (and stays idle) if the plant is not on the page.
    pub fn begin(
        &mut self,
        page: &ProjectPage,
        selection: &SelectionSet,
        grabbed: InstanceId,
        ground_point: Vec3,
        snap_cell: Option<f32>,
    ) -> bool {
        let Some(plant) = page.get(grabbed) else {
            return false;
        };

        let mut origins: Vec<(InstanceId, Vec3)> = selection
            .iter()
            .filter_map(|id| page.get(id).map(|p| (id, p.position)))
            .collect();
        if !origins.iter().any(|(id, _)| *id == grabbed) {
            origins.push((grabbed, plant.position));
        }

        let start = snap_point(ground_point, snap_cell);
        self.session = Some(DragSession {
            grabbed,
            grab_offset: plant.position - start,
            origins,
            moved: false,
        });
        true
    }

    /// Moves the grabbed plant to the pointer plus its grab offset and shifts
    /// the rest of the group by the same horizontal delta, which is returned.
    /// A `None` point (pointer off the ground) leaves everything where it is.
    pub fn update(
        &mut self,
        page: &mut ProjectPage,
        ground_point: Option<Vec3>,
        snap_cell: Option<f32>,
    ) -> Option<Vec3> {
        let session = self.session.as_mut()?;
        let point = snap_point(ground_point?, snap_cell);
        let current = page.get(session.grabbed)?.position;
        let delta = point + session.grab_offset - current;
        let delta = Vec3::new(delta.x, 0.0, delta.z);
        if delta == Vec3::ZERO {
            return Some(delta);
        }

        session.moved = true;
        for (id, _) in &session.origins {
            if let Some(plant) = page.get_mut(*id) {
                plant.position += delta;
            }
        }
        Some(delta)
    }

    /// Finishes the drag. Releasing over the ground commits the move and rests
    /// the grabbed plant on the terrain; releasing anywhere else cancels it.
    pub fn end(
        &mut self,
        page: &mut ProjectPage,
        terrain: &HeightMap,
        ground_point: Option<Vec3>,
        snap_cell: Option<f32>,
    ) -> DragOutcome {
        if self.session.is_none() {
            return DragOutcome::NotDragging;
        }
        if ground_point.is_none() {
            self.cancel(page);
            return DragOutcome::Cancelled;
        }

        self.update(page, ground_point, snap_cell);
        let Some(session) = self.session.take() else {
            return DragOutcome::NotDragging;
        };

        if let Some(plant) = page.get_mut(session.grabbed) {
            plant.position.y = terrain.height_at(plant.position.x, plant.position.z);
        }

        DragOutcome::Committed {
            moved: session.group().collect(),
        }
    }

    /// Puts every dragged plant back where it was when the drag began.
    pub fn cancel(&mut self, page: &mut ProjectPage) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        for (id, origin) in session.origins {
            if let Some(plant) = page.get_mut(id) {
                plant.position = origin;
            }
        }
        true
    }

    /// Forgets a session without touching positions, e.g. after the page was replaced.
    pub fn reset(&mut self) {
        self.session = None;
    }
}

fn snap_point(point: Vec3, snap_cell: Option<f32>) -> Vec3 {
    match snap_cell {
        Some(cell) => grid::snap_xz(point, cell),
        None => point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garden_core::catalogue::Catalogue;
    use crate::garden_core::instance::PlacedPlant;

    fn page_with(positions: &[Vec3]) -> ProjectPage {
        let def = Catalogue::builtin().first().cloned().unwrap();
        let mut page = ProjectPage::new("drag");
        for (i, pos) in positions.iter().enumerate() {
            page.plants.push(PlacedPlant::new(
                InstanceId(i as u64 + 1),
                def.clone(),
                *pos,
                0.0,
                Vec3::ONE,
            ));
        }
        page
    }

    fn select_all(page: &ProjectPage) -> SelectionSet {
        let mut sel = SelectionSet::default();
        sel.replace(page.plants.iter().map(|p| p.id), false);
        sel
    }

    fn position(page: &ProjectPage, id: u64) -> Vec3 {
        page.get(InstanceId(id)).unwrap().position
    }

    #[test]
    fn group_moves_rigidly() {
        let mut page = page_with(&[Vec3::ZERO, Vec3::new(2.0, 0.0, 2.0)]);
        let sel = select_all(&page);
        let terrain = HeightMap::flat(100, 100.0, 5.0);
        let mut drag = DragController::default();

        assert!(drag.begin(&page, &sel, InstanceId(1), Vec3::ZERO, None));
        assert_eq!(drag.phase(), DragPhase::Started);
        let delta = drag.update(&mut page, Some(Vec3::new(1.0, 0.0, 1.0)), None);
        assert_eq!(delta, Some(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(drag.phase(), DragPhase::Dragging);

        let outcome = drag.end(&mut page, &terrain, Some(Vec3::new(1.0, 0.0, 1.0)), None);
        assert!(matches!(outcome, DragOutcome::Committed { .. }));
        assert_eq!(position(&page, 1), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(position(&page, 2), Vec3::new(3.0, 0.0, 3.0));
        assert_eq!(drag.phase(), DragPhase::Idle);
    }

    #[test]
    fn relative_offsets_survive_every_tick() {
        let start = [
            Vec3::new(-3.0, 0.0, 1.0),
            Vec3::new(4.0, 0.5, -2.0),
            Vec3::new(0.25, 1.0, 7.5),
        ];
        let mut page = page_with(&start);
        let sel = select_all(&page);
        let mut drag = DragController::default();
        drag.begin(&page, &sel, InstanceId(2), Vec3::new(4.0, 0.0, -2.0), None);

        let offsets = |page: &ProjectPage| {
            (
                position(page, 1) - position(page, 2),
                position(page, 3) - position(page, 2),
            )
        };
        let before = offsets(&page);
        for step in 1..20 {
            let t = step as f32;
            drag.update(&mut page, Some(Vec3::new(4.0 + t * 0.7, 0.0, -2.0 - t * 0.3)), None);
            let (a, b) = offsets(&page);
            assert!((a - before.0).length() < 1e-4);
            assert!((b - before.1).length() < 1e-4);
        }
    }

    #[test]
    fn grabbed_plant_keeps_its_offset_from_the_pointer() {
        let mut page = page_with(&[Vec3::new(1.0, 0.0, 1.0), Vec3::new(-2.0, 0.0, 0.0)]);
        let sel = select_all(&page);
        let mut drag = DragController::default();
        drag.begin(&page, &sel, InstanceId(1), Vec3::new(0.5, 0.0, 0.75), None);
        let offset = drag.session().unwrap().grab_offset;
        assert_eq!(offset, Vec3::new(0.5, 0.0, 0.25));

        drag.update(&mut page, Some(Vec3::new(6.0, 0.0, -3.0)), None);
        assert_eq!(position(&page, 1), Vec3::new(6.5, 0.0, -2.75));
        assert_eq!(position(&page, 2), Vec3::new(3.5, 0.0, -3.75));
    }

    #[test]
    fn release_off_ground_restores_positions() {
        let mut page = page_with(&[Vec3::ZERO, Vec3::X]);
        let sel = select_all(&page);
        let terrain = HeightMap::flat(100, 100.0, 5.0);
        let mut drag = DragController::default();
        drag.begin(&page, &sel, InstanceId(1), Vec3::ZERO, None);
        drag.update(&mut page, Some(Vec3::new(5.0, 0.0, 5.0)), None);

        assert_eq!(drag.end(&mut page, &terrain, None, None), DragOutcome::Cancelled);
        assert_eq!(position(&page, 1), Vec3::ZERO);
        assert_eq!(position(&page, 2), Vec3::X);
    }

    #[test]
    fn snapped_drag_moves_in_whole_cells() {
        let mut page = page_with(&[Vec3::ZERO]);
        let sel = select_all(&page);
        let mut drag = DragController::default();
        drag.begin(&page, &sel, InstanceId(1), Vec3::new(0.2, 0.0, 0.1), Some(1.0));
        drag.update(&mut page, Some(Vec3::new(0.4, 0.0, 0.3)), Some(1.0));
        assert_eq!(position(&page, 1), Vec3::ZERO);
        drag.update(&mut page, Some(Vec3::new(1.6, 0.0, 2.4)), Some(1.0));
        assert_eq!(position(&page, 1), Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn grabbed_plant_rests_on_terrain_after_drop() {
        let mut page = page_with(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]);
        let sel = select_all(&page);
        let mut terrain = HeightMap::flat(100, 100.0, 5.0);
        terrain.apply_stroke(3.5, 3.5, 0.5, 0.0);
        let mut drag = DragController::default();
        drag.begin(&page, &sel, InstanceId(1), Vec3::ZERO, None);
        drag.end(&mut page, &terrain, Some(Vec3::new(3.5, 0.0, 3.5)), None);

        assert_eq!(position(&page, 1), Vec3::new(3.5, 2.5, 3.5));
        assert_eq!(position(&page, 2), Vec3::new(4.5, 0.0, 3.5));
    }

    #[test]
    fn grabbing_an_unknown_plant_stays_idle() {
        let page = page_with(&[Vec3::ZERO]);
        let mut drag = DragController::default();
        assert!(!drag.begin(&page, &SelectionSet::default(), InstanceId(7), Vec3::ZERO, None));
        assert_eq!(drag.phase(), DragPhase::Idle);
    }

    #[test]
    fn unselected_grabbed_plant_still_moves() {
        let mut page = page_with(&[Vec3::ZERO]);
        let mut drag = DragController::default();
        drag.begin(&page, &SelectionSet::default(), InstanceId(1), Vec3::ZERO, None);
        drag.update(&mut page, Some(Vec3::new(2.0, 0.0, 0.0)), None);
        assert_eq!(position(&page, 1), Vec3::new(2.0, 0.0, 0.0));
    }
}
