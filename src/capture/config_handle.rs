//! Tear-free detector configuration handoff
//!
//! A settings thread stores whole [`DetectorConfig`] snapshots; the capture
//! worker loads the current snapshot once per block. Readers never see a
//! half-written configuration because the only shared state is one
//! atomically swapped `Arc`.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::DetectorConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<DetectorConfig>>,
}

impl ConfigHandle {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<DetectorConfig> {
        self.current.load_full()
    }

    /// Validate and publish a new snapshot; takes effect on the next block
    pub fn store(&self, config: DetectorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        tracing::info!(
            "[Config] Detector configuration updated: threshold={:.3} noise_floor={:.3} gain={:.2}",
            config.threshold,
            config.noise_floor,
            config.mic_gain_multiplier
        );
        self.current.store(Arc::new(config));
        Ok(())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Worker-side view that reports when the snapshot has changed
pub(crate) struct ConfigWatcher {
    handle: ConfigHandle,
    seen: Option<Arc<DetectorConfig>>,
}

impl ConfigWatcher {
    pub(crate) fn new(handle: ConfigHandle) -> Self {
        Self { handle, seen: None }
    }

    /// The snapshot if it differs from the last one returned
    ///
    /// The first call always returns the current snapshot.
    pub(crate) fn changed(&mut self) -> Option<DetectorConfig> {
        let latest = self.handle.load();
        if let Some(seen) = &self.seen {
            if Arc::ptr_eq(&latest, seen) {
                return None;
            }
        }
        let config = *latest;
        self.seen = Some(latest);
        Some(config)
    }
}
