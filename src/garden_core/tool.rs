use serde::{Deserialize, Serialize};

/// Interaction mode gating which pointer actions reach the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    #[default]
    Select,
    Move,
    Add,
    Delete,
    Edit,
    Terrain,
}

impl ToolMode {
    pub const ALL: [ToolMode; 6] = [
        ToolMode::Select,
        ToolMode::Move,
        ToolMode::Add,
        ToolMode::Delete,
        ToolMode::Edit,
        ToolMode::Terrain,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::Select => "Select",
            ToolMode::Move => "Move",
            ToolMode::Add => "Add Plant",
            ToolMode::Delete => "Delete Plant",
            ToolMode::Edit => "Edit Plant",
            ToolMode::Terrain => "Edit Terrain",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            ToolMode::Select => '1',
            ToolMode::Move => '2',
            ToolMode::Add => '3',
            ToolMode::Delete => '4',
            ToolMode::Edit => '5',
            ToolMode::Terrain => '6',
        }
    }

    /// The catalogue panel only stays open while adding plants.
    pub fn keeps_catalogue_open(self) -> bool {
        self == ToolMode::Add
    }

    /// Tools that act on the existing selection keep it when activated.
    pub fn keeps_selection(self) -> bool {
        matches!(self, ToolMode::Select | ToolMode::Move | ToolMode::Edit)
    }

    /// Pointer-down on a plant starts a drag only outside select mode.
    pub fn drags_plants(self) -> bool {
        self == ToolMode::Move
    }

    /// The camera orbits on primary drag only where no other drag gesture exists.
    pub fn orbits_camera(self) -> bool {
        matches!(self, ToolMode::Move | ToolMode::Edit | ToolMode::Delete)
    }
}
