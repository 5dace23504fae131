//! Fixed-size audio blocks and the assembler that cuts them from device callbacks
//!
//! Devices deliver callbacks of whatever length they like, interleaved
//! across channels. Detection wants mono blocks of exactly `block_size`
//! samples, each stamped with the elapsed time of its first frame on the
//! sample clock. [`BlockAssembler`] does that conversion on the device
//! thread using only blocks borrowed from the [`BufferPool`](super::BufferPool).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::buffer_pool::DeviceChannels;

/// One block of mono samples plus its capture timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBlock {
    pub samples: Vec<f32>,
    /// Seconds since recording start
    pub timestamp: f64,
}

impl AudioBlock {
    pub fn with_capacity(block_size: usize) -> Self {
        Self {
            samples: Vec::with_capacity(block_size),
            timestamp: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Re-chunks interleaved device data into timestamped mono blocks
pub struct BlockAssembler {
    channels: DeviceChannels,
    block_size: usize,
    channel_count: usize,
    sample_rate: f64,
    /// Block being filled; `None` while the pool is exhausted
    current: Option<AudioBlock>,
    filled: usize,
    frames_seen: u64,
    dropped_blocks: Arc<AtomicU64>,
}

impl BlockAssembler {
    pub fn new(
        channels: DeviceChannels,
        block_size: usize,
        channel_count: usize,
        sample_rate: f64,
    ) -> Self {
        Self {
            channels,
            block_size: block_size.max(1),
            channel_count: channel_count.max(1),
            sample_rate,
            current: None,
            filled: 0,
            frames_seen: 0,
            dropped_blocks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of blocks lost to pool exhaustion
    pub fn dropped_blocks(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped_blocks)
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Feed one device callback worth of interleaved frames
    ///
    /// Only the first channel of each frame is kept. A trailing partial
    /// frame is treated as a frame.
    pub fn push_interleaved(&mut self, data: &[f32]) {
        for frame in data.chunks(self.channel_count) {
            self.push_sample(frame[0]);
        }
    }

    fn push_sample(&mut self, sample: f32) {
        if self.filled == 0 {
            self.begin_block();
        }

        if let Some(block) = self.current.as_mut() {
            block.samples.push(sample);
        }
        self.filled += 1;
        self.frames_seen += 1;

        if self.filled == self.block_size {
            self.filled = 0;
            if let Some(block) = self.current.take() {
                if self.channels.data_producer.push(block).is_err() {
                    self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    fn begin_block(&mut self) {
        let timestamp = self.frames_seen as f64 / self.sample_rate;
        match self.channels.pool_consumer.pop() {
            Ok(mut block) => {
                block.samples.clear();
                block.timestamp = timestamp;
                self.current = Some(block);
            }
            Err(_) => {
                // Frames still advance the clock so later blocks stay aligned
                self.current = None;
                self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
