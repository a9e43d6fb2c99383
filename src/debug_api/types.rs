use serde::{Deserialize, Serialize};

use crate::garden_core::environment::Season;
use crate::garden_core::tool::ToolMode;

pub const API_VERSION: &str = "v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_version: String,
    pub debug_api_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStateResponse {
    pub api_version: String,
    pub telemetry: Option<TelemetrySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub target: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSnapshot {
    pub id: u64,
    pub plant_id: u32,
    pub name: String,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub health: f32,
    pub growth_rate: f32,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub hour: f32,
    pub season: Season,
    pub rain_intensity: f32,
    pub wind_speed: f32,
    pub cloud_cover: f32,
    pub time_speed: f32,
    pub day_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frame: u64,
    pub frame_time_ms: f32,
    pub fps: f32,
    pub revision: u64,
    pub tool: ToolMode,
    pub selected_plant: Option<u32>,
    pub pages: Vec<String>,
    pub active_page: usize,
    pub plants: Vec<PlantSnapshot>,
    pub selection: Vec<u64>,
    pub environment: EnvironmentSnapshot,
    pub camera: CameraSnapshot,
    pub pending_lookups: usize,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub id: String,
    #[serde(flatten)]
    pub command: CommandKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    SetTool {
        tool: ToolMode,
    },
    SelectCatalogue {
        plant_id: Option<u32>,
    },
    PlaceAt {
        x: f32,
        z: f32,
    },
    SelectInstances {
        ids: Vec<u64>,
        #[serde(default)]
        additive: bool,
    },
    ClearSelection,
    MoveSelected {
        dx: f32,
        dz: f32,
    },
    DeleteInstance {
        id: u64,
    },
    DeleteSelected,
    /// Only the fields present are changed.
    SetEnvironment {
        #[serde(default)]
        hour: Option<f32>,
        #[serde(default)]
        season: Option<Season>,
        #[serde(default)]
        rain_intensity: Option<f32>,
        #[serde(default)]
        wind_speed: Option<f32>,
        #[serde(default)]
        cloud_cover: Option<f32>,
        #[serde(default)]
        time_speed: Option<f32>,
        #[serde(default)]
        day_speed: Option<f32>,
    },
    AdjustTerrain {
        x: f32,
        z: f32,
        #[serde(default = "one_step")]
        steps: f32,
    },
    SetGrid {
        #[serde(default)]
        snap: Option<bool>,
        #[serde(default)]
        visible: Option<bool>,
    },
    AddPage {
        name: String,
    },
    SetActivePage {
        index: usize,
    },
    SetCamera {
        #[serde(default)]
        yaw: Option<f32>,
        #[serde(default)]
        pitch: Option<f32>,
        #[serde(default)]
        distance: Option<f32>,
    },
    SaveProject,
    LoadProject,
}

fn one_step() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAcceptedResponse {
    pub api_version: String,
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub api_version: String,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAppliedEvent {
    pub id: String,
    pub frame: u64,
    pub ok: bool,
    pub message: String,
    pub revision: u64,
    /// Id of the plant created by a `place_at` command.
    pub placed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    Telemetry(TelemetrySnapshot),
    CommandApplied(CommandAppliedEvent),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn command_request_uses_flat_tag() {
        let request: CommandRequest = serde_json::from_value(json!({
            "id": "c1",
            "type": "place_at",
            "x": 3.4,
            "z": 7.8
        }))
        .unwrap();
        assert_eq!(request.id, "c1");
        assert!(matches!(request.command, CommandKind::PlaceAt { x, .. } if (x - 3.4).abs() < 1e-6));
    }

    #[test]
    fn environment_fields_are_optional() {
        let request: CommandRequest = serde_json::from_value(json!({
            "id": "c2",
            "type": "set_environment",
            "season": "winter"
        }))
        .unwrap();
        match request.command {
            CommandKind::SetEnvironment { season, hour, .. } => {
                assert_eq!(season, Some(Season::Winter));
                assert_eq!(hour, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tool_names_are_snake_case() {
        let request: CommandRequest =
            serde_json::from_value(json!({ "id": "c3", "type": "set_tool", "tool": "terrain" }))
                .unwrap();
        assert!(matches!(request.command, CommandKind::SetTool { tool: ToolMode::Terrain }));

        let unit: CommandRequest =
            serde_json::from_value(json!({ "id": "c4", "type": "delete_selected" })).unwrap();
        assert!(matches!(unit.command, CommandKind::DeleteSelected));
    }

    #[test]
    fn terrain_steps_default_to_one() {
        let request: CommandRequest = serde_json::from_value(json!({
            "id": "c5", "type": "adjust_terrain", "x": 0.0, "z": 0.0
        }))
        .unwrap();
        assert!(matches!(request.command, CommandKind::AdjustTerrain { steps, .. } if steps == 1.0));
    }
}
