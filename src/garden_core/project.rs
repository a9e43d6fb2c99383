use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::garden_core::error::{GardenError, GardenResult};
use crate::garden_core::instance::{InstanceId, PlacedPlant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectPage {
    pub name: String,
    #[serde(default)]
    pub plants: Vec<PlacedPlant>,
}

impl ProjectPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plants: Vec::new(),
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<&PlacedPlant> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut PlacedPlant> {
        self.plants.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<PlacedPlant> {
        let index = self.plants.iter().position(|p| p.id == id)?;
        Some(self.plants.remove(index))
    }
}

/// A garden layout made of named pages, one of which is being edited.
///
/// Instance ids come from a single project-wide counter, so they stay unique
/// across pages as well as within one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pages: Vec<ProjectPage>,
    active_page: usize,
    next_instance_id: u64,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            pages: vec![ProjectPage::new("Garden")],
            active_page: 0,
            next_instance_id: 1,
        }
    }
}

impl Project {
    pub fn pages(&self) -> &[ProjectPage] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [ProjectPage] {
        &mut self.pages
    }

    pub fn active_index(&self) -> usize {
        self.active_page
    }

    pub fn active_page(&self) -> &ProjectPage {
        &self.pages[self.active_page]
    }

    pub fn active_page_mut(&mut self) -> &mut ProjectPage {
        &mut self.pages[self.active_page]
    }

    pub fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_instance_id);
        self.next_instance_id += 1;
        id
    }

    pub fn add_page(&mut self, name: impl Into<String>) -> usize {
        self.pages.push(ProjectPage::new(name));
        self.pages.len() - 1
    }

    pub fn set_active(&mut self, index: usize) -> GardenResult<()> {
        if index >= self.pages.len() {
            return Err(GardenError::NoSuchPage(index));
        }
        self.active_page = index;
        Ok(())
    }

    pub fn rename_page(&mut self, index: usize, name: impl Into<String>) -> GardenResult<()> {
        let page = self
            .pages
            .get_mut(index)
            .ok_or(GardenError::NoSuchPage(index))?;
        page.name = name.into();
        Ok(())
    }

    /// Copies a page, giving every copied plant a fresh id. Returns the new page index.
    pub fn duplicate_page(&mut self, index: usize) -> GardenResult<usize> {
        let source = self
            .pages
            .get(index)
            .cloned()
            .ok_or(GardenError::NoSuchPage(index))?;
        let mut copy = ProjectPage::new(format!("{} (copy)", source.name));
        for mut plant in source.plants {
            plant.id = self.allocate_id();
            plant.selected = false;
            copy.plants.push(plant);
        }
        self.pages.push(copy);
        Ok(self.pages.len() - 1)
    }

    pub fn remove_page(&mut self, index: usize) -> GardenResult<ProjectPage> {
        if index >= self.pages.len() {
            return Err(GardenError::NoSuchPage(index));
        }
        if self.pages.len() == 1 {
            return Err(GardenError::LastPage);
        }
        let page = self.pages.remove(index);
        if self.active_page > index || self.active_page >= self.pages.len() {
            self.active_page = self.active_page.saturating_sub(1);
        }
        Ok(page)
    }

    /// Restores internal invariants after loading from disk: at least one page,
    /// an in-range active index, an id counter above every stored id, and no
    /// id used twice.
    pub fn repair(&mut self) {
        if self.pages.is_empty() {
            self.pages.push(ProjectPage::new("Garden"));
        }
        if self.active_page >= self.pages.len() {
            self.active_page = 0;
        }
        let max_id = self
            .pages
            .iter()
            .flat_map(|page| page.plants.iter())
            .map(|p| p.id.0)
            .max()
            .unwrap_or(0);
        self.next_instance_id = self.next_instance_id.max(max_id.saturating_add(1));

        let mut seen = HashSet::new();
        for page in 0..self.pages.len() {
            for slot in 0..self.pages[page].plants.len() {
                let id = self.pages[page].plants[slot].id;
                if !seen.insert(id) {
                    let fresh = self.allocate_id();
                    log::warn!("duplicate instance id {id} in project, reassigned to {fresh}");
                    self.pages[page].plants[slot].id = fresh;
                    seen.insert(fresh);
                }
                let plant = &mut self.pages[page].plants[slot];
                if plant.sanitize() {
                    log::warn!("plant {} had out-of-range health or scale, clamped", plant.id);
                }
            }
        }
    }
}
