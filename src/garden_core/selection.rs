use std::collections::BTreeSet;

use glam::{Vec2, Vec3};

use crate::garden_core::instance::InstanceId;
use crate::garden_core::project::ProjectPage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<InstanceId>,
}

impl SelectionSet {
    pub fn contains(&self, id: InstanceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.ids.iter().copied()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Click semantics: replace the selection with `id`, or toggle its
    /// membership when the modifier is held.
    pub fn click(&mut self, id: InstanceId, toggle: bool) {
        if toggle {
            if !self.ids.remove(&id) {
                self.ids.insert(id);
            }
        } else {
            self.ids.clear();
            self.ids.insert(id);
        }
    }

    /// Replaces (or, with `additive`, extends) the selection in one step.
    pub fn replace<I>(&mut self, ids: I, additive: bool)
    where
        I: IntoIterator<Item = InstanceId>,
    {
        let mut next: BTreeSet<InstanceId> = if additive {
            self.ids.clone()
        } else {
            BTreeSet::new()
        };
        next.extend(ids);
        self.ids = next;
    }

    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.ids.remove(&id)
    }

    /// Drops ids that no longer exist on `page`. Returns how many were dropped.
    pub fn retain_in(&mut self, page: &ProjectPage) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| page.contains(*id));
        before - self.ids.len()
    }

    /// Mirrors membership into each plant's `selected` flag.
    pub fn write_flags(&self, page: &mut ProjectPage) {
        for plant in &mut page.plants {
            plant.selected = self.ids.contains(&plant.id);
        }
    }
}

/// Axis-aligned screen rectangle spanned by two drag corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Ids of plants whose projected position falls inside `rect`. `project`
/// returns `None` for points behind the camera, which are never selected.
pub fn marquee<F>(page: &ProjectPage, rect: ScreenRect, project: F) -> Vec<InstanceId>
where
    F: Fn(Vec3) -> Option<Vec2>,
{
    page.plants
        .iter()
        .filter(|plant| project(plant.position).is_some_and(|p| rect.contains(p)))
        .map(|plant| plant.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garden_core::catalogue::Catalogue;
    use crate::garden_core::instance::PlacedPlant;

    fn page_with(positions: &[Vec3]) -> ProjectPage {
        let def = Catalogue::builtin().first().cloned().unwrap();
        let mut page = ProjectPage::new("test");
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

    fn top_down(p: Vec3) -> Option<Vec2> {
        Some(Vec2::new(p.x, p.z))
    }

    #[test]
    fn click_replaces_and_modifier_toggles() {
        let mut sel = SelectionSet::default();
        sel.click(InstanceId(1), false);
        sel.click(InstanceId(2), false);
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![InstanceId(2)]);

        sel.click(InstanceId(3), true);
        assert_eq!(sel.len(), 2);
        sel.click(InstanceId(2), true);
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![InstanceId(3)]);
    }

    #[test]
    fn marquee_uses_min_max_of_corners() {
        let page = page_with(&[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(5.0, 0.0, 5.0),
        ]);
        // corners given bottom-right to top-left
        let rect = ScreenRect::from_corners(Vec2::new(3.0, 3.0), Vec2::new(-1.0, -1.0));
        assert_eq!(
            marquee(&page, rect, top_down),
            vec![InstanceId(1), InstanceId(2)]
        );
    }

    #[test]
    fn marquee_skips_points_behind_camera() {
        let page = page_with(&[Vec3::ZERO]);
        let rect = ScreenRect::from_corners(Vec2::splat(-10.0), Vec2::splat(10.0));
        assert!(marquee(&page, rect, |_| None).is_empty());
    }

    #[test]
    fn retain_drops_missing_ids_and_flags_follow() {
        let mut page = page_with(&[Vec3::ZERO, Vec3::X]);
        let mut sel = SelectionSet::default();
        sel.replace([InstanceId(1), InstanceId(2), InstanceId(9)], false);
        assert_eq!(sel.retain_in(&page), 1);
        sel.write_flags(&mut page);
        assert!(page.plants.iter().all(|p| p.selected));

        page.remove(InstanceId(1));
        sel.retain_in(&page);
        assert!(sel.iter().all(|id| page.contains(id)));
    }

    #[test]
    fn additive_replace_keeps_previous_members() {
        let mut sel = SelectionSet::default();
        sel.replace([InstanceId(1)], false);
        sel.replace([InstanceId(2)], true);
        assert_eq!(sel.len(), 2);
        sel.replace([InstanceId(3)], false);
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![InstanceId(3)]);
    }
}
