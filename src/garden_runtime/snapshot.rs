use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use glam::Vec3;

use crate::garden_core::catalogue::PlantId;
use crate::garden_core::drag::DragPhase;
use crate::garden_core::environment::EnvironmentState;
use crate::garden_core::heightmap::HeightMap;
use crate::garden_core::instance::{InstanceId, PlacedPlant};
use crate::garden_core::tool::ToolMode;

/// Immutable view of the editor after a command, handed to observers.
#[derive(Debug, Clone)]
pub struct GardenSnapshot {
    pub revision: u64,
    pub tool: ToolMode,
    pub catalogue_open: bool,
    pub selected_plant: Option<PlantId>,
    pub pages: Vec<String>,
    pub active_page: usize,
    pub plants: Vec<PlacedPlant>,
    pub selection: Vec<InstanceId>,
    pub editing: Option<InstanceId>,
    pub hover: Option<Vec3>,
    pub drag: DragPhase,
    pub environment: EnvironmentState,
    pub grid_snap: bool,
    pub grid_visible: bool,
    pub terrain: Arc<HeightMap>,
}

impl GardenSnapshot {
    pub fn plant(&self, id: InstanceId) -> Option<&PlacedPlant> {
        self.plants.iter().find(|p| p.id == id)
    }
}

#[derive(Default)]
pub(crate) struct SnapshotHub {
    subscribers: Vec<Sender<Arc<GardenSnapshot>>>,
}

impl SnapshotHub {
    pub fn subscribe(&mut self) -> Receiver<Arc<GardenSnapshot>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    /// Sends to every live subscriber and forgets the ones whose receiver was dropped.
    pub fn publish(&mut self, snapshot: Arc<GardenSnapshot>) {
        self.subscribers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}
