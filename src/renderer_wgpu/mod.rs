pub mod camera;
pub mod egui_bridge;
pub mod egui_pass;
pub mod gpu_context;
pub mod scene;
pub mod sky;
pub mod weather;
