pub mod assets;
#[cfg(not(target_arch = "wasm32"))]
pub mod debug_api;
pub mod garden_core;
pub mod garden_runtime;
pub mod lookup;
pub mod renderer_wgpu;
pub mod ui;

pub mod app;

#[cfg(target_arch = "wasm32")]
mod web_entry {
    use wasm_bindgen::prelude::*;
    use winit::window::WindowBuilder;

    use crate::app;

    #[wasm_bindgen(start)]
    pub fn wasm_main() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("garden-designer-canvas"))
        else {
            log::error!("canvas element #garden-designer-canvas not found");
            return;
        };

        use winit::platform::web::WindowBuilderExtWebSys;
        let event_loop = match winit::event_loop::EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                log::error!("failed to create event loop: {e}");
                return;
            }
        };
        let window = match WindowBuilder::new()
            .with_canvas(Some(canvas.unchecked_into()))
            .build(&event_loop)
        {
            Ok(window) => Box::leak(Box::new(window)),
            Err(e) => {
                log::error!("failed to create window: {e}");
                return;
            }
        };

        app::run_event_loop_web(window, event_loop);
    }
}
