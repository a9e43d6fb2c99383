use std::time::{Duration, Instant};

use crate::debug_api::{
    CameraSnapshot, CommandAppliedEvent, CommandKind, EnvironmentSnapshot, PlantSnapshot,
    TelemetrySnapshot,
};
use crate::garden_core::catalogue::PlantId;
use crate::garden_core::instance::{InstanceId, PlacedPlant};

use super::AppState;

/// Result of one command before it is stamped with id, frame and revision.
struct Outcome {
    ok: bool,
    message: String,
    placed: Option<u64>,
}

impl Outcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            placed: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            placed: None,
        }
    }

    fn from_result<E: std::fmt::Display>(result: Result<(), E>, message: impl Into<String>) -> Self {
        match result {
            Ok(()) => Self::ok(message),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

impl AppState {
    pub(super) fn apply_debug_commands(&mut self) {
        let commands: Vec<_> = self
            .debug_api
            .as_mut()
            .map(|api| api.drain_commands())
            .unwrap_or_default();

        for command in commands {
            let outcome = self.apply_command(command.command);
            let applied = CommandAppliedEvent {
                id: command.id,
                frame: self.frame_index,
                ok: outcome.ok,
                message: outcome.message,
                revision: self.runtime.revision(),
                placed: outcome.placed,
            };
            if let Some(api) = &self.debug_api {
                api.publish_command_applied(applied);
            }
        }
    }

    fn apply_command(&mut self, command: CommandKind) -> Outcome {
        let runtime = &mut self.runtime;
        match command {
            CommandKind::SetTool { tool } => {
                runtime.set_tool(tool);
                Outcome::ok(format!("tool set to {}", tool.label()))
            }
            CommandKind::SelectCatalogue { plant_id } => Outcome::from_result(
                runtime.select_catalogue_entry(plant_id.map(PlantId)),
                "catalogue entry selected",
            ),
            CommandKind::PlaceAt { x, z } => match runtime.place_at(x, z) {
                Some(id) => Outcome {
                    placed: Some(id.0),
                    ..Outcome::ok(format!("placed {id}"))
                },
                None => Outcome::failed("nothing placed: needs the add tool, a catalogue entry and a point on the ground"),
            },
            CommandKind::SelectInstances { ids, additive } => {
                let ids: Vec<InstanceId> = ids.into_iter().map(InstanceId).collect();
                runtime.select_instances(&ids, additive);
                Outcome::ok(format!("{} selected", runtime.selection().len()))
            }
            CommandKind::ClearSelection => {
                runtime.clear_selection();
                Outcome::ok("selection cleared")
            }
            CommandKind::MoveSelected { dx, dz } => {
                let moved = runtime.move_selected(dx, dz);
                Outcome::ok(format!("moved {moved} plants"))
            }
            CommandKind::DeleteInstance { id } => {
                Outcome::from_result(runtime.delete_instance(InstanceId(id)).map(|_| ()), "plant removed")
            }
            CommandKind::DeleteSelected => {
                let removed = runtime.delete_selected();
                Outcome::ok(format!("removed {removed} plants"))
            }
            CommandKind::SetEnvironment {
                hour,
                season,
                rain_intensity,
                wind_speed,
                cloud_cover,
                time_speed,
                day_speed,
            } => {
                if let Some(hour) = hour {
                    runtime.set_time_of_day(hour);
                }
                if let Some(season) = season {
                    runtime.set_season(season);
                }
                if let Some(value) = rain_intensity {
                    runtime.set_rain_intensity(value);
                }
                if let Some(value) = wind_speed {
                    runtime.set_wind_speed(value);
                }
                if let Some(value) = cloud_cover {
                    runtime.set_cloud_cover(value);
                }
                if let Some(value) = time_speed {
                    runtime.set_time_speed(value);
                }
                if let Some(value) = day_speed {
                    runtime.set_day_speed(value);
                }
                Outcome::ok("environment updated")
            }
            CommandKind::AdjustTerrain { x, z, steps } => {
                let changed = runtime.adjust_terrain(x, z, steps);
                Outcome::ok(format!("{changed} terrain samples changed"))
            }
            CommandKind::SetGrid { snap, visible } => {
                if let Some(snap) = snap {
                    runtime.set_grid_snap(snap);
                }
                if let Some(visible) = visible {
                    runtime.set_grid_visible(visible);
                }
                Outcome::ok(format!(
                    "grid snap {} visible {}",
                    runtime.grid_snap(),
                    runtime.grid_visible()
                ))
            }
            CommandKind::AddPage { name } => {
                let index = runtime.add_page(name);
                Outcome::ok(format!("page {index} added"))
            }
            CommandKind::SetActivePage { index } => {
                Outcome::from_result(runtime.set_active_page(index), format!("page {index} active"))
            }
            CommandKind::SetCamera {
                yaw,
                pitch,
                distance,
            } => {
                let camera = self.viewport.camera_mut();
                camera.set(yaw, pitch, distance);
                Outcome::ok(format!(
                    "camera yaw={:.2} pitch={:.2} distance={:.1}",
                    camera.yaw, camera.pitch, camera.distance
                ))
            }
            CommandKind::SaveProject => match self.save_project() {
                Ok(()) => Outcome::ok("project saved"),
                Err(e) => Outcome::failed(format!("{e:#}")),
            },
            CommandKind::LoadProject => match self.load_project() {
                Ok(()) => Outcome::ok("project loaded"),
                Err(e) => Outcome::failed(format!("{e:#}")),
            },
        }
    }

    pub(super) fn publish_telemetry_if_due(&mut self) {
        let Some(api) = &self.debug_api else {
            return;
        };

        if self.last_telemetry_emit.elapsed() < Duration::from_millis(100) {
            return;
        }

        let runtime = &self.runtime;
        let env = runtime.environment();
        let camera = self.viewport.camera();
        let telemetry = TelemetrySnapshot {
            frame: self.frame_index,
            frame_time_ms: self.frame_time_ms,
            fps: 1000.0 / self.frame_time_ms.max(0.01),
            revision: runtime.revision(),
            tool: runtime.tool(),
            selected_plant: runtime.selected_plant().map(|p| p.id.0),
            pages: runtime.project().pages().iter().map(|p| p.name.clone()).collect(),
            active_page: runtime.project().active_index(),
            plants: runtime.active_page().plants.iter().map(plant_snapshot).collect(),
            selection: runtime.selection().iter().map(|id| id.0).collect(),
            environment: EnvironmentSnapshot {
                hour: env.time_of_day(),
                season: env.season(),
                rain_intensity: env.rain_intensity(),
                wind_speed: env.wind_speed(),
                cloud_cover: env.cloud_cover(),
                time_speed: env.time_speed(),
                day_speed: env.day_speed,
            },
            camera: CameraSnapshot {
                target: camera.target.to_array(),
                yaw: camera.yaw,
                pitch: camera.pitch,
                distance: camera.distance,
            },
            pending_lookups: self.lookup.pending_count(),
            timestamp_ms: now_timestamp_ms(),
        };
        api.publish_telemetry(telemetry);

        if self.last_published_revision != Some(runtime.revision()) {
            match runtime.export_project() {
                Ok(json) => api.publish_project(json),
                Err(e) => log::warn!("could not export project for the debug api: {e}"),
            }
            self.last_published_revision = Some(runtime.revision());
        }
        self.last_telemetry_emit = Instant::now();
    }
}

fn plant_snapshot(plant: &PlacedPlant) -> PlantSnapshot {
    PlantSnapshot {
        id: plant.id.0,
        plant_id: plant.definition.id.0,
        name: plant.definition.name.clone(),
        position: plant.position.to_array(),
        scale: plant.scale.to_array(),
        health: plant.health,
        growth_rate: plant.growth_rate,
        selected: plant.selected,
    }
}

fn now_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
