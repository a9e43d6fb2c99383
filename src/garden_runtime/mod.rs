mod runtime;
mod snapshot;

pub use runtime::{GardenRuntime, RuntimeStats};
pub use snapshot::GardenSnapshot;
