use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::model::{load_glb, LodChain};
use crate::garden_core::config::LodConfig;

#[derive(Debug, Clone)]
pub enum ModelEntry {
    Ready(Arc<LodChain>),
    /// The model could not be loaded; plants using it are drawn as markers.
    Missing(String),
}

/// Loads each model URL once and keeps its LOD chain for every plant that uses it.
pub struct ModelLibrary {
    root: String,
    lod: LodConfig,
    entries: HashMap<String, ModelEntry>,
}

impl ModelLibrary {
    pub fn new(root: impl Into<String>, lod: LodConfig) -> Self {
        Self {
            root: root.into(),
            lod,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, model_url: &str) -> Option<Arc<LodChain>> {
        if !self.entries.contains_key(model_url) {
            let entry = self.fetch(model_url);
            self.entries.insert(model_url.to_string(), entry);
        }
        match self.entries.get(model_url) {
            Some(ModelEntry::Ready(chain)) => Some(Arc::clone(chain)),
            _ => None,
        }
    }

    pub fn entry(&self, model_url: &str) -> Option<&ModelEntry> {
        self.entries.get(model_url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces a cached model with freshly read bytes.
    pub fn reload(&mut self, model_url: &str, bytes: &[u8]) -> bool {
        let entry = self.decode(model_url, bytes);
        let ok = matches!(entry, ModelEntry::Ready(_));
        self.entries.insert(model_url.to_string(), entry);
        ok
    }

    fn decode(&self, model_url: &str, bytes: &[u8]) -> ModelEntry {
        match load_glb(bytes) {
            Ok(geometry) => {
                log::info!(
                    "loaded model {model_url}: {} vertices, {} triangles",
                    geometry.vertex_count(),
                    geometry.triangle_count()
                );
                ModelEntry::Ready(Arc::new(LodChain::build(&geometry, &self.lod)))
            }
            Err(e) => {
                log::warn!("failed to load model {model_url}: {e:#}");
                ModelEntry::Missing(format!("{e:#}"))
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn fetch(&self, model_url: &str) -> ModelEntry {
        let path = std::path::Path::new(&self.root).join(model_url);
        match std::fs::read(&path) {
            Ok(bytes) => self.decode(model_url, &bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no model file at {}, drawing markers", path.display());
                ModelEntry::Missing(format!("{} not found", path.display()))
            }
            Err(e) => {
                log::warn!("failed to read {}: {e}", path.display());
                ModelEntry::Missing(e.to_string())
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn fetch(&self, model_url: &str) -> ModelEntry {
        ModelEntry::Missing(format!("{}/{model_url} is not bundled", self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_cached_as_missing() {
        let mut library = ModelLibrary::new("no-such-asset-root", LodConfig::default());
        assert!(library.get("models/oak_tree.glb").is_none());
        assert!(matches!(
            library.entry("models/oak_tree.glb"),
            Some(ModelEntry::Missing(_))
        ));
        assert!(library.get("models/oak_tree.glb").is_none());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn broken_reload_marks_entry_missing() {
        let mut library = ModelLibrary::new("assets", LodConfig::default());
        assert!(!library.reload("models/fern.glb", b"glTF?"));
        assert!(matches!(
            library.entry("models/fern.glb"),
            Some(ModelEntry::Missing(_))
        ));
    }
}
