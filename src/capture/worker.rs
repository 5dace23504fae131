//! Capture worker thread
//!
//! Drains filled blocks from the data queue, runs them through a
//! [`RecordingSession`], and returns each block to the pool. The loop exits
//! once the `running` flag is cleared *and* the queue is empty, so every
//! block the device delivered is analysed before the hits are returned.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::config_handle::{ConfigHandle, ConfigWatcher};
use super::session::RecordingSession;
use crate::analysis::{DetectedHit, OnsetDetector};
use crate::audio::WorkerChannels;
use crate::error::AudioError;
use crate::telemetry;

const IDLE_SLEEP: Duration = Duration::from_millis(1);

pub struct CaptureWorker<D> {
    channels: WorkerChannels,
    session: RecordingSession<D>,
    config: ConfigWatcher,
    running: Arc<AtomicBool>,
    dropped_blocks: Option<Arc<AtomicU64>>,
    reported_drops: u64,
}

impl<D: OnsetDetector + 'static> CaptureWorker<D> {
    pub fn new(
        channels: WorkerChannels,
        session: RecordingSession<D>,
        config: ConfigHandle,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            channels,
            session,
            config: ConfigWatcher::new(config),
            running,
            dropped_blocks: None,
            reported_drops: 0,
        }
    }

    /// Report the device side's dropped-block counter to telemetry
    pub fn with_drop_counter(mut self, dropped_blocks: Arc<AtomicU64>) -> Self {
        self.dropped_blocks = Some(dropped_blocks);
        self
    }

    pub fn spawn(self) -> JoinHandle<Result<Vec<DetectedHit>, AudioError>> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) -> Result<Vec<DetectedHit>, AudioError> {
        self.session.start()?;
        tracing::info!("[Capture] Worker started");

        loop {
            let block = match self.channels.data_consumer.pop() {
                Ok(block) => block,
                Err(_) => {
                    if !self.running.load(Ordering::SeqCst) {
                        // A block may have landed between the pop and the flag load
                        if self.channels.data_consumer.slots() > 0 {
                            continue;
                        }
                        tracing::info!("[Capture] Running flag cleared and queue empty, exiting");
                        break;
                    }
                    self.report_drops();
                    thread::sleep(IDLE_SLEEP);
                    continue;
                }
            };

            self.apply_config_update();
            let result = self.session.process_block(&block.samples, block.timestamp);

            if self.channels.pool_producer.push(block).is_err() {
                tracing::warn!("[Capture] Pool queue full, dropping block");
            }

            if let Some(hit) = result? {
                tracing::debug!(
                    "[Capture] Onset at {:.3}s amplitude={:.3} confidence={:.2}",
                    hit.timestamp,
                    hit.amplitude,
                    hit.confidence
                );
                telemetry::hub().record_onset(&hit);
            }
        }

        self.report_drops();
        self.session.stop()
    }

    fn apply_config_update(&mut self) {
        if let Some(config) = self.config.changed() {
            // The device rate stamped at start-up wins over whatever the
            // settings side last saw
            let sample_rate = self.session.configuration().sample_rate;
            self.session
                .set_configuration(config.with_sample_rate(sample_rate));
        }
    }

    fn report_drops(&mut self) {
        if let Some(counter) = &self.dropped_blocks {
            let total = counter.load(Ordering::Relaxed);
            if total > self.reported_drops {
                tracing::warn!(
                    "[Capture] {} blocks dropped (pool exhausted)",
                    total - self.reported_drops
                );
                telemetry::hub().record_dropped_blocks(total - self.reported_drops);
                self.reported_drops = total;
            }
        }
    }
}

/// Start a capture worker with no drop reporting
pub fn spawn_capture_worker<D: OnsetDetector + 'static>(
    channels: WorkerChannels,
    session: RecordingSession<D>,
    config: ConfigHandle,
    running: Arc<AtomicBool>,
) -> JoinHandle<Result<Vec<DetectedHit>, AudioError>> {
    CaptureWorker::new(channels, session, config, running).spawn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BlockAssembler, BufferPool};
    use crate::config::DetectorConfig;

    const RATE: f64 = 44_100.0;

    fn signal_with_bursts(burst_blocks: &[usize], total_blocks: usize) -> Vec<f32> {
        let mut samples = vec![0.0; total_blocks * 512];
        for &index in burst_blocks {
            samples[index * 512..(index + 1) * 512].fill(0.8);
        }
        samples
    }

    #[test]
    fn test_worker_detects_every_delivered_block() {
        let (device, worker_channels) = BufferPool::new(128, 512).split_for_threads();
        let mut assembler = BlockAssembler::new(device, 512, 1, RATE);
        let running = Arc::new(AtomicBool::new(true));
        let config = ConfigHandle::default();

        // Fill the queue before the worker starts, then stop immediately
        assembler.push_interleaved(&signal_with_bursts(&[2, 50, 100], 120));
        let handle = spawn_capture_worker(
            worker_channels,
            RecordingSession::new(DetectorConfig::default()),
            config,
            Arc::clone(&running),
        );
        running.store(false, Ordering::SeqCst);

        let hits = handle.join().unwrap().unwrap();
        let timestamps: Vec<f64> = hits.iter().map(|hit| hit.timestamp).collect();
        assert_eq!(
            timestamps,
            vec![
                (2 * 512) as f64 / RATE,
                (50 * 512) as f64 / RATE,
                (100 * 512) as f64 / RATE
            ]
        );
    }

    #[test]
    fn test_worker_applies_config_before_first_block() {
        let (device, worker_channels) = BufferPool::new(16, 512).split_for_threads();
        let mut assembler = BlockAssembler::new(device, 512, 1, RATE);
        let running = Arc::new(AtomicBool::new(true));

        // 0.8 never clears a 0.9 threshold
        let config = ConfigHandle::new(DetectorConfig {
            threshold: 0.9,
            ..DetectorConfig::default()
        });
        assembler.push_interleaved(&signal_with_bursts(&[1], 4));

        let handle = spawn_capture_worker(
            worker_channels,
            RecordingSession::new(DetectorConfig::default()),
            config,
            Arc::clone(&running),
        );
        running.store(false, Ordering::SeqCst);
        assert!(handle.join().unwrap().unwrap().is_empty());
    }
}
