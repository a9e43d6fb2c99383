pub mod catalogue;
pub mod config;
pub mod drag;
pub mod environment;
pub mod error;
pub mod grid;
pub mod growth;
pub mod heightmap;
pub mod instance;
pub mod lod;
pub mod project;
pub mod save;
pub mod selection;
pub mod terrain;
pub mod tool;
