//! RecordingSession - runs the onset detector over one recording
//!
//! Blocks arrive in capture order with their elapsed-time stamps; every
//! accepted onset is appended to the session's hit list and broadcast as a
//! [`CaptureEvent`]. Consumers subscribe to the channel, the session never
//! needs to know who is listening.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::level::LevelMeter;
use crate::analysis::{DetectedHit, EnergyOnsetDetector, OnsetDetector};
use crate::config::DetectorConfig;
use crate::error::AudioError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events published while recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureEvent {
    Hit(DetectedHit),
    Level { timestamp: f64, level: f32 },
}

pub struct RecordingSession<D = EnergyOnsetDetector> {
    detector: D,
    hits: Vec<DetectedHit>,
    recording: bool,
    last_timestamp: Option<f64>,
    events: broadcast::Sender<CaptureEvent>,
    level: LevelMeter,
}

impl RecordingSession<EnergyOnsetDetector> {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_detector(EnergyOnsetDetector::new(config))
    }
}

impl<D: OnsetDetector> RecordingSession<D> {
    pub fn with_detector(detector: D) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            detector,
            hits: Vec::new(),
            recording: false,
            last_timestamp: None,
            events,
            level: LevelMeter::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    pub fn level_meter(&self) -> LevelMeter {
        self.level.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn configuration(&self) -> &DetectorConfig {
        self.detector.configuration()
    }

    /// Takes effect on the next block, detector state is kept
    pub fn set_configuration(&mut self, config: DetectorConfig) {
        self.detector.set_configuration(config);
    }

    /// Hits accepted so far, in time order
    pub fn hits(&self) -> &[DetectedHit] {
        &self.hits
    }

    /// Begin a recording with a fresh detector state and empty hit list
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.recording {
            return Err(AudioError::AlreadyRunning);
        }
        self.detector.reset();
        self.hits.clear();
        self.last_timestamp = None;
        self.level.set(0.0);
        self.recording = true;
        tracing::info!("[Capture] Recording started");
        Ok(())
    }

    /// Run detection on one block
    ///
    /// `timestamp` is seconds since recording start. A timestamp earlier
    /// than the previous block's is clamped to it so hits stay ordered.
    pub fn process_block(
        &mut self,
        block: &[f32],
        timestamp: f64,
    ) -> Result<Option<DetectedHit>, AudioError> {
        if !self.recording {
            return Err(AudioError::NotRunning);
        }

        let timestamp = self.monotonic(timestamp);
        let hit = self.detector.detect_onset(block, timestamp);

        let level = self.detector.current_level();
        self.level.set(level);
        let _ = self.events.send(CaptureEvent::Level { timestamp, level });

        if let Some(hit) = hit {
            self.hits.push(hit);
            let _ = self.events.send(CaptureEvent::Hit(hit));
        }
        Ok(hit)
    }

    /// End the recording and hand back the accumulated hits
    pub fn stop(&mut self) -> Result<Vec<DetectedHit>, AudioError> {
        if !self.recording {
            return Err(AudioError::NotRunning);
        }
        self.recording = false;
        tracing::info!("[Capture] Recording stopped with {} hits", self.hits.len());
        Ok(std::mem::take(&mut self.hits))
    }

    fn monotonic(&mut self, timestamp: f64) -> f64 {
        let clamped = match self.last_timestamp {
            Some(last) if !(timestamp >= last) => {
                tracing::warn!(
                    "[Capture] Block timestamp {:.6}s went backwards (previous {:.6}s), clamping",
                    timestamp,
                    last
                );
                last
            }
            None if !timestamp.is_finite() => 0.0,
            _ => timestamp,
        };
        self.last_timestamp = Some(clamped);
        clamped
    }
}

/// Run a complete recording through a fresh session in fixed-size blocks
///
/// Block `i` is stamped `i * block_size / sample_rate`. A trailing partial
/// block is analysed as it is.
pub fn detect_offline(
    samples: &[f32],
    config: DetectorConfig,
    block_size: usize,
) -> Result<Vec<DetectedHit>, AudioError> {
    if block_size == 0 {
        return Err(AudioError::InvalidBlockSize { size: block_size });
    }

    let mut session = RecordingSession::with_detector(
        EnergyOnsetDetector::new(config).with_block_capacity(block_size),
    );
    session.start()?;
    for (index, block) in samples.chunks(block_size).enumerate() {
        let timestamp = (index * block_size) as f64 / config.sample_rate;
        session.process_block(block, timestamp)?;
    }
    session.stop()
}
