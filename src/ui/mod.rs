mod catalogue_panel;
mod environment_panel;
mod inspector;
mod toolbar;
mod viewport;

pub use catalogue_panel::CataloguePanel;
pub use environment_panel::EnvironmentPanel;
pub use inspector::Inspector;
pub use toolbar::{Toolbar, ToolbarAction};
pub use viewport::Viewport;
