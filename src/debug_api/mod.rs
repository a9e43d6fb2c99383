mod config;
mod server;
mod types;

pub use config::DebugApiConfig;
pub use server::{start_debug_api, DebugApiHandle};
pub use types::{
    CameraSnapshot, CommandAppliedEvent, CommandKind, CommandRequest, EnvironmentSnapshot,
    PlantSnapshot, TelemetrySnapshot,
};
