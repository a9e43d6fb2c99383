//! Encyclopedia media for plants: a representative image and related
//! articles, fetched off the event-loop thread and polled once per frame.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::garden_core::config::LookupConfig;

#[cfg(not(target_arch = "wasm32"))]
pub mod wikimedia;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantMedia {
    pub image_url: Option<String>,
    pub links: Vec<RelatedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Pending,
    Ready(PlantMedia),
    Unavailable(String),
}

pub trait MediaSource: Send + Sync {
    fn fetch(&self, key: &str) -> anyhow::Result<PlantMedia>;
}

struct LookupResult {
    key: String,
    outcome: Result<PlantMedia, String>,
}

/// Caches one lookup per key. Fetches run on a small thread pool and their
/// results arrive through a channel; nothing is shared with the workers
/// beyond the source itself.
pub struct MediaLookup {
    source: Option<Arc<dyn MediaSource>>,
    #[cfg(not(target_arch = "wasm32"))]
    pool: Option<rayon::ThreadPool>,
    disabled_reason: String,
    sender: Sender<LookupResult>,
    receiver: Receiver<LookupResult>,
    states: HashMap<String, LookupState>,
}

impl MediaLookup {
    /// Lookups against `source`, at most `workers` of them running at once.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_source(source: Arc<dyn MediaSource>, workers: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("media-lookup-{i}"))
            .build();
        let pool = match pool {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("media lookup pool failed to start: {e}");
                return Self::disabled(format!("could not start lookup workers: {e}"));
            }
        };
        let (sender, receiver) = mpsc::channel();
        Self {
            source: Some(source),
            pool: Some(pool),
            disabled_reason: String::new(),
            sender,
            receiver,
            states: HashMap::new(),
        }
    }

    /// Every request resolves immediately to `Unavailable(reason)`.
    pub fn disabled(reason: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source: None,
            #[cfg(not(target_arch = "wasm32"))]
            pool: None,
            disabled_reason: reason.into(),
            sender,
            receiver,
            states: HashMap::new(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &LookupConfig) -> Self {
        if !config.enabled {
            return Self::disabled("media lookups are disabled");
        }
        match wikimedia::WikimediaSource::new(config) {
            Ok(source) => Self::with_source(Arc::new(source), config.workers),
            Err(e) => {
                log::warn!("media lookup unavailable: {e:#}");
                Self::disabled(format!("{e:#}"))
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_config(_config: &LookupConfig) -> Self {
        Self::disabled("media lookups are not available in the browser build")
    }

    /// Current state for `key`, starting a lookup the first time it is asked for.
    pub fn request(&mut self, key: &str) -> &LookupState {
        if !self.states.contains_key(key) {
            let state = self.dispatch(key);
            self.states.insert(key.to_string(), state);
        }
        &self.states[key]
    }

    pub fn state(&self, key: &str) -> Option<&LookupState> {
        self.states.get(key)
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, LookupState::Pending))
            .count()
    }

    /// Collects finished lookups. Returns how many arrived.
    pub fn poll(&mut self) -> usize {
        let mut arrived = 0;
        while let Ok(result) = self.receiver.try_recv() {
            let state = match result.outcome {
                Ok(media) => LookupState::Ready(media),
                Err(reason) => {
                    log::warn!("media lookup for {} failed: {reason}", result.key);
                    LookupState::Unavailable(reason)
                }
            };
            self.states.insert(result.key, state);
            arrived += 1;
        }
        arrived
    }

    /// Forgets a failed lookup so the next request tries again.
    pub fn retry(&mut self, key: &str) {
        if matches!(self.states.get(key), Some(LookupState::Unavailable(_))) {
            self.states.remove(key);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn dispatch(&self, key: &str) -> LookupState {
        let (Some(source), Some(pool)) = (self.source.as_ref().map(Arc::clone), self.pool.as_ref()) else {
            return LookupState::Unavailable(self.disabled_reason.clone());
        };
        let tx = self.sender.clone();
        let job_key = key.to_string();
        pool.spawn(move || {
            let outcome = source.fetch(&job_key).map_err(|e| format!("{e:#}"));
            let _ = tx.send(LookupResult {
                key: job_key,
                outcome,
            });
        });
        log::debug!("media lookup queued for {key}");
        LookupState::Pending
    }

    #[cfg(target_arch = "wasm32")]
    fn dispatch(&self, _key: &str) -> LookupState {
        LookupState::Unavailable(self.disabled_reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;

    struct FakeSource;

    impl MediaSource for FakeSource {
        fn fetch(&self, key: &str) -> anyhow::Result<PlantMedia> {
            if key == "Unknown plant" {
                anyhow::bail!("no such article");
            }
            Ok(PlantMedia {
                image_url: Some(format!("https://img.example/{key}.jpg")),
                links: Vec::new(),
            })
        }
    }

    fn settle(lookup: &mut MediaLookup) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while lookup.pending_count() > 0 && Instant::now() < deadline {
            lookup.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn lookups_resolve_through_the_channel() {
        let mut lookup = MediaLookup::with_source(Arc::new(FakeSource), 2);
        assert_eq!(lookup.request("Rosa"), &LookupState::Pending);
        lookup.request("Unknown plant");
        settle(&mut lookup);

        match lookup.state("Rosa") {
            Some(LookupState::Ready(media)) => {
                assert_eq!(media.image_url.as_deref(), Some("https://img.example/Rosa.jpg"))
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert!(matches!(
            lookup.state("Unknown plant"),
            Some(LookupState::Unavailable(reason)) if reason.contains("no such article")
        ));
    }

    /// Counts how many fetches overlap.
    struct SlowSource {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MediaSource for SlowSource {
        fn fetch(&self, key: &str) -> anyhow::Result<PlantMedia> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(PlantMedia {
                image_url: Some(key.to_string()),
                links: Vec::new(),
            })
        }
    }

    #[test]
    fn many_requests_share_a_bounded_pool() {
        let source = Arc::new(SlowSource {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let mut lookup = MediaLookup::with_source(source.clone(), 2);
        for i in 0..12 {
            assert_eq!(lookup.request(&format!("plant {i}")), &LookupState::Pending);
        }
        settle(&mut lookup);

        assert_eq!(lookup.pending_count(), 0);
        assert!(source.peak.load(Ordering::SeqCst) <= 2);
        assert!(matches!(lookup.state("plant 11"), Some(LookupState::Ready(_))));
    }

    #[test]
    fn disabled_lookup_is_unavailable_immediately() {
        let mut lookup = MediaLookup::disabled("offline");
        assert_eq!(
            lookup.request("Rosa"),
            &LookupState::Unavailable("offline".to_string())
        );
        assert_eq!(lookup.pending_count(), 0);
    }

    #[test]
    fn retry_forgets_failures_only() {
        let mut lookup = MediaLookup::with_source(Arc::new(FakeSource), 2);
        lookup.request("Rosa");
        lookup.request("Unknown plant");
        settle(&mut lookup);
        lookup.retry("Rosa");
        lookup.retry("Unknown plant");
        assert!(lookup.state("Rosa").is_some());
        assert!(lookup.state("Unknown plant").is_none());
    }
}
