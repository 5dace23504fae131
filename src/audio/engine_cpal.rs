//! Desktop microphone capture through cpal
//!
//! The input callback only feeds a [`BlockAssembler`]; detection runs on a
//! [`CaptureWorker`] thread fed through the block pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::broadcast;

use super::block::BlockAssembler;
use super::buffer_pool::BufferPool;
use crate::analysis::{DetectedHit, EnergyOnsetDetector};
use crate::capture::{CaptureEvent, CaptureWorker, ConfigHandle, LevelMeter, RecordingSession};
use crate::config::CaptureConfig;
use crate::error::{log_audio_error, AudioError};

type WorkerHandle = JoinHandle<Result<Vec<DetectedHit>, AudioError>>;

/// A running recording from the default input device
pub struct CpalInput {
    stream: Option<cpal::Stream>,
    worker: Option<WorkerHandle>,
    running: Arc<AtomicBool>,
    sample_rate: f64,
    level: LevelMeter,
    events: broadcast::Receiver<CaptureEvent>,
}

impl CpalInput {
    /// Open the default input device and start recording
    ///
    /// The detector configuration in `config` is re-stamped with the
    /// device's sample rate before the first block is analysed.
    pub fn start(capture: &CaptureConfig, config: ConfigHandle) -> Result<Self, AudioError> {
        capture.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::StreamOpenFailed {
                reason: "No default input device found".to_string(),
            })?;

        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default input config: {:?}", e),
            })?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::StreamOpenFailed {
                reason: "Only F32 sample format is currently supported for input".to_string(),
            });
        }

        let stream_config: cpal::StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0 as f64;
        let channel_count = stream_config.channels as usize;

        let detector = config.load().with_sample_rate(sample_rate);
        config.store(detector).map_err(|e| AudioError::StreamOpenFailed {
            reason: e.to_string(),
        })?;

        let (device_channels, worker_channels) =
            BufferPool::new(capture.pool_size(), capture.block_size).split_for_threads();
        let mut assembler =
            BlockAssembler::new(device_channels, capture.block_size, channel_count, sample_rate);
        let dropped_blocks = assembler.dropped_blocks();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    assembler.push_interleaved(data);
                },
                |err| tracing::error!("[Capture] Input stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("{:?}", e),
            })?;

        let session = RecordingSession::with_detector(
            EnergyOnsetDetector::new(detector).with_block_capacity(capture.block_size),
        );
        let events = session.subscribe();
        let level = session.level_meter();
        let running = Arc::new(AtomicBool::new(true));
        let worker = CaptureWorker::new(worker_channels, session, config, Arc::clone(&running))
            .with_drop_counter(dropped_blocks)
            .spawn();

        let mut input = Self {
            stream: None,
            worker: Some(worker),
            running,
            sample_rate,
            level,
            events,
        };

        if let Err(e) = stream.play() {
            let err = AudioError::HardwareError {
                details: format!("Input start failed: {}", e),
            };
            log_audio_error(&err, "CpalInput::start");
            // Join the worker so its thread does not outlive the failure
            let _ = input.finish();
            return Err(err);
        }
        input.stream = Some(stream);

        tracing::info!(
            "[Capture] Input started: {} Hz, {} channel(s), block size {}",
            sample_rate,
            channel_count,
            capture.block_size
        );
        Ok(input)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn level_meter(&self) -> LevelMeter {
        self.level.clone()
    }

    /// Hit and level events; lagging receivers skip old events
    pub fn events(&mut self) -> &mut broadcast::Receiver<CaptureEvent> {
        &mut self.events
    }

    /// Stop the device, drain the queue, and return the recording's hits
    pub fn stop(mut self) -> Result<Vec<DetectedHit>, AudioError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<Vec<DetectedHit>, AudioError> {
        // Dropping the stream stops callbacks before the worker drains
        drop(self.stream.take());
        self.running.store(false, Ordering::SeqCst);

        let worker = self.worker.take().ok_or(AudioError::NotRunning)?;
        worker.join().map_err(|_| AudioError::StreamFailure {
            reason: "capture worker panicked".to_string(),
        })?
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(err) = self.finish() {
                log_audio_error(&err, "CpalInput::drop");
            }
        }
    }
}
