use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

pub const MODELS_DIR: &str = "assets/models";
pub const CATALOGUE_FILE: &str = "catalogue.json";

pub enum AssetChange {
    /// `model_url` is relative to the asset root, e.g. `models/fern.glb`.
    Model { model_url: String, bytes: Vec<u8> },
    Catalogue(String),
}

pub struct AssetWatcher {
    rx: Receiver<AssetChange>,
    _watchers: Vec<RecommendedWatcher>,
}

impl AssetWatcher {
    /// Watches `assets/models/` for `.glb` changes and the working directory
    /// for edits to `catalogue.json`. Returns `None` if neither can be watched.
    pub fn start() -> Option<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watchers = Vec::new();

        let models_dir = Path::new(MODELS_DIR);
        if models_dir.is_dir() {
            let tx = tx.clone();
            let watcher = watch(models_dir, move |path| {
                if path.extension().and_then(|e| e.to_str()) != Some("glb") {
                    return;
                }
                let Some(file) = path.file_name().and_then(|s| s.to_str()) else {
                    return;
                };
                match std::fs::read(path) {
                    Ok(bytes) => {
                        log::info!("asset watcher: detected change in {}", path.display());
                        let _ = tx.send(AssetChange::Model {
                            model_url: format!("models/{file}"),
                            bytes,
                        });
                    }
                    Err(e) => log::warn!("asset watcher: failed to read {}: {e}", path.display()),
                }
            });
            watchers.extend(watcher);
        } else {
            log::info!("asset watcher: {models_dir:?} not found, skipping models");
        }

        let watcher = watch(Path::new("."), move |path| {
            if path.file_name().and_then(|s| s.to_str()) != Some(CATALOGUE_FILE) {
                return;
            }
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    log::info!("asset watcher: {CATALOGUE_FILE} changed");
                    let _ = tx.send(AssetChange::Catalogue(contents));
                }
                Err(e) => log::warn!("asset watcher: failed to read {}: {e}", path.display()),
            }
        });
        watchers.extend(watcher);

        if watchers.is_empty() {
            return None;
        }
        log::info!("asset watcher started ({} paths)", watchers.len());
        Some(Self {
            rx,
            _watchers: watchers,
        })
    }

    /// Drains all pending changes without blocking.
    pub fn drain(&self) -> Vec<AssetChange> {
        let mut changes = Vec::new();
        while let Ok(change) = self.rx.try_recv() {
            changes.push(change);
        }
        changes
    }
}

fn watch<F>(dir: &Path, on_change: F) -> Option<RecommendedWatcher>
where
    F: Fn(&PathBuf) + Send + 'static,
{
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        let event = match res {
            Ok(e) => e,
            Err(e) => {
                log::warn!("asset watcher error: {e}");
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        for path in &event.paths {
            on_change(path);
        }
    })
    .ok()?;

    if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        log::warn!("asset watcher: failed to watch {dir:?}: {e}");
        return None;
    }
    Some(watcher)
}
