use anyhow::Result;
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::assets::{ModelLibrary, ASSET_ROOT};
use crate::garden_core::catalogue::Catalogue;
use crate::garden_core::config::GardenConfig;
use crate::garden_runtime::GardenRuntime;
use crate::lookup::MediaLookup;
use crate::renderer_wgpu::egui_bridge::EguiBridge;
use crate::renderer_wgpu::egui_pass::EguiPass;
use crate::renderer_wgpu::gpu_context::GpuContext;
use crate::renderer_wgpu::sky;
use crate::ui::{CataloguePanel, EnvironmentPanel, Inspector, Toolbar, ToolbarAction, Viewport};

#[cfg(not(target_arch = "wasm32"))]
use crate::assets::{AssetChange, AssetWatcher};
#[cfg(not(target_arch = "wasm32"))]
use crate::debug_api::{start_debug_api, DebugApiConfig, DebugApiHandle};
#[cfg(not(target_arch = "wasm32"))]
use crate::garden_core::save::{ProjectFile, DEFAULT_PATH};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

#[cfg(not(target_arch = "wasm32"))]
mod debug_commands;
mod event_loop;

pub use event_loop::run_event_loop;
#[cfg(target_arch = "wasm32")]
pub use event_loop::run_event_loop_web;

pub struct AppState {
    window: &'static Window,
    gpu: GpuContext,
    runtime: GardenRuntime,
    models: ModelLibrary,
    lookup: MediaLookup,
    egui_bridge: EguiBridge,
    egui_pass: EguiPass,
    toolbar: Toolbar,
    catalogue_panel: CataloguePanel,
    environment_panel: EnvironmentPanel,
    inspector: Inspector,
    viewport: Viewport,
    pending_action: Option<ToolbarAction>,
    started: Instant,
    last_frame: Instant,
    frame_time_ms: f32,
    frame_index: u64,
    #[cfg(not(target_arch = "wasm32"))]
    debug_api: Option<DebugApiHandle>,
    #[cfg(not(target_arch = "wasm32"))]
    last_telemetry_emit: Instant,
    #[cfg(not(target_arch = "wasm32"))]
    last_published_revision: Option<u64>,
    #[cfg(not(target_arch = "wasm32"))]
    asset_watcher: Option<AssetWatcher>,
}

impl AppState {
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn new(window: &'static Window, debug_api_config: DebugApiConfig) -> Result<Self> {
        let config = GardenConfig::load();
        let catalogue = Catalogue::load();
        let lookup = MediaLookup::from_config(&config.lookup);
        let mut runtime = GardenRuntime::new(config, catalogue);
        if let Some(file) = ProjectFile::load(std::path::Path::new(DEFAULT_PATH)) {
            runtime.apply_project_file(file);
        }

        let gpu = GpuContext::new(window).await?;

        let debug_api = start_debug_api(&debug_api_config)?;
        if let Some(api) = &debug_api {
            log::info!("debug api listening on {}", api.bind_addr());
        }

        let asset_watcher = AssetWatcher::start();

        let mut app = Self::assemble(window, gpu, runtime, lookup, debug_api);
        app.asset_watcher = asset_watcher;
        Ok(app)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn assemble(
        window: &'static Window,
        gpu: GpuContext,
        runtime: GardenRuntime,
        lookup: MediaLookup,
        debug_api: Option<DebugApiHandle>,
    ) -> Self {
        let now = Instant::now();
        Self {
            egui_bridge: EguiBridge::new(window.scale_factor() as f32, gpu.config.width, gpu.config.height),
            egui_pass: EguiPass::new(&gpu.device, gpu.config.format),
            models: ModelLibrary::new(ASSET_ROOT, runtime.config().lod.clone()),
            viewport: Viewport::new(&runtime.config().camera),
            toolbar: Toolbar::new(),
            catalogue_panel: CataloguePanel::new(),
            environment_panel: EnvironmentPanel::new(),
            inspector: Inspector::new(),
            pending_action: None,
            window,
            gpu,
            runtime,
            lookup,
            started: now,
            last_frame: now,
            frame_time_ms: 0.0,
            frame_index: 0,
            debug_api,
            last_telemetry_emit: now - Duration::from_secs(1),
            last_published_revision: None,
            asset_watcher: None,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub async fn new_web(window: &'static Window) -> Result<Self> {
        let config = GardenConfig::default();
        let lookup = MediaLookup::from_config(&config.lookup);
        let runtime = GardenRuntime::new(config, Catalogue::builtin());
        let gpu = GpuContext::new(window).await?;

        let now = Instant::now();
        Ok(Self {
            egui_bridge: EguiBridge::new(window.scale_factor() as f32, gpu.config.width, gpu.config.height),
            egui_pass: EguiPass::new(&gpu.device, gpu.config.format),
            models: ModelLibrary::new(ASSET_ROOT, runtime.config().lod.clone()),
            viewport: Viewport::new(&runtime.config().camera),
            toolbar: Toolbar::new(),
            catalogue_panel: CataloguePanel::new(),
            environment_panel: EnvironmentPanel::new(),
            inspector: Inspector::new(),
            pending_action: None,
            window,
            gpu,
            runtime,
            lookup,
            started: now,
            last_frame: now,
            frame_time_ms: 0.0,
            frame_index: 0,
        })
    }

    fn process_window_event(&mut self, event: &WindowEvent) {
        let _ = self.egui_bridge.on_window_event(event);
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.egui_bridge
            .resize(self.gpu.config.width, self.gpu.config.height);
    }

    fn update(&mut self) {
        self.frame_index = self.frame_index.saturating_add(1);

        #[cfg(not(target_arch = "wasm32"))]
        self.apply_debug_commands();
        #[cfg(not(target_arch = "wasm32"))]
        self.apply_asset_changes();

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_time_ms = self.frame_time_ms * 0.94 + (dt * 1000.0) * 0.06;

        if let Some(report) = self.runtime.update(dt) {
            log::debug!(
                "growth tick over {} plants ({:.0} ms)",
                report.plants,
                report.elapsed_ms
            );
        }
        self.lookup.poll();

        if let Some(action) = self.pending_action.take() {
            self.apply_toolbar_action(action);
        }

        #[cfg(not(target_arch = "wasm32"))]
        self.publish_telemetry_if_due();

        let stats = self.runtime.stats();
        self.window.set_title(&format!(
            "Garden Designer | {} | {} plants | {:02.0}:00 {} | {:.1}ms",
            self.runtime.active_page().name,
            stats.plants,
            stats.hour.floor(),
            stats.season.as_str(),
            self.frame_time_ms,
        ));
    }

    fn apply_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::ToggleEnvironment => self.environment_panel.toggle(),
            ToolbarAction::Save => {
                if let Err(e) = self.save_project() {
                    log::warn!("save failed: {e:#}");
                }
            }
            ToolbarAction::Load => {
                if let Err(e) = self.load_project() {
                    log::warn!("load failed: {e:#}");
                }
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn apply_asset_changes(&mut self) {
        let Some(watcher) = &self.asset_watcher else {
            return;
        };
        for change in watcher.drain() {
            match change {
                AssetChange::Model { model_url, bytes } => {
                    if self.models.reload(&model_url, &bytes) {
                        log::info!("reloaded model {model_url}");
                    }
                }
                AssetChange::Catalogue(contents) => match Catalogue::from_json(&contents) {
                    Ok(catalogue) if !catalogue.is_empty() => {
                        log::info!("catalogue reloaded with {} plants", catalogue.len());
                        self.runtime.replace_catalogue(catalogue);
                    }
                    Ok(_) => log::warn!("ignoring empty catalogue.json"),
                    Err(e) => log::warn!("ignoring catalogue.json: {e}"),
                },
            }
        }
    }

    fn render(&mut self) -> Result<(), SurfaceError> {
        let output = self.gpu.acquire()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("garden-designer-encoder"),
            });

        let palette = sky::sky_palette(self.runtime.environment());
        let raw_input = self
            .egui_bridge
            .take_raw_input(self.started.elapsed().as_secs_f64());
        let ctx = self.egui_bridge.ctx().clone();
        let full_output = ctx.run(raw_input, |ctx| {
            if let Some(action) = self.toolbar.ui(ctx, &mut self.runtime) {
                self.pending_action = Some(action);
            }
            self.catalogue_panel.ui(ctx, &mut self.runtime);
            self.environment_panel.ui(ctx, &mut self.runtime);
            self.inspector.ui(ctx, &mut self.runtime, &mut self.lookup);
            self.viewport.ui(ctx, &mut self.runtime, &mut self.models, palette);
        });

        self.egui_bridge
            .handle_platform_output(self.window, &full_output.platform_output);

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
            pixels_per_point: self.egui_bridge.pixels_per_point(),
        };
        self.egui_pass.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &view,
            screen,
            full_output,
            &ctx,
            palette.clear_color(),
        );

        self.gpu.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save_project(&self) -> Result<()> {
        self.runtime
            .to_project_file()
            .save(std::path::Path::new(DEFAULT_PATH))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_project(&mut self) -> Result<()> {
        use anyhow::Context;

        let json = std::fs::read_to_string(DEFAULT_PATH)
            .with_context(|| format!("reading {DEFAULT_PATH}"))?;
        self.runtime
            .import_project(&json)
            .with_context(|| format!("importing {DEFAULT_PATH}"))
    }

    #[cfg(target_arch = "wasm32")]
    fn save_project(&self) -> Result<()> {
        let json = self.runtime.export_project()?;
        log::info!("project exported ({} bytes); the browser build keeps no files", json.len());
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn load_project(&mut self) -> Result<()> {
        anyhow::bail!("the browser build has no saved project to load")
    }
}
