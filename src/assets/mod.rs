mod library;
mod model;
#[cfg(not(target_arch = "wasm32"))]
mod watcher;

pub use library::{ModelEntry, ModelLibrary};
pub use model::{load_glb, LodChain, ModelGeometry};
#[cfg(not(target_arch = "wasm32"))]
pub use watcher::{AssetChange, AssetWatcher};

/// Directory that catalogue `model_url`s are resolved against.
pub const ASSET_ROOT: &str = "assets";
