//! Diagnostics telemetry collector and helpers.
//!
//! The collector keeps a bounded history of metric events and re-publishes
//! every event on a broadcast channel for live consumers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::analysis::DetectedHit;
use crate::scoring::SessionResult;

pub mod events;

pub use events::MetricEvent;

static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity: history_capacity.max(1),
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = lock_recovering(&self.history);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = lock_recovering(&self.history);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Rolling window of absolute timing offsets.
struct OffsetTracker {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl OffsetTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    fn observe(&mut self, value: f64) -> (f64, f64, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value.abs());

        let count = self.samples.len();
        let sum: f64 = self.samples.iter().sum();
        let max = self.samples.iter().copied().fold(0.0_f64, f64::max);
        (sum / count as f64, max, count)
    }
}

/// Top-level hub wrapping the collector plus derived gauges.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    offsets: Mutex<OffsetTracker>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, offset_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            offsets: Mutex::new(OffsetTracker::new(offset_window)),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_onset(&self, hit: &DetectedHit) {
        self.collector.publish(MetricEvent::Onset {
            timestamp: hit.timestamp,
            amplitude: hit.amplitude,
            confidence: hit.confidence,
        });
    }

    /// Publish the score, then one offset-window update per matched hit
    pub fn record_session(&self, result: &SessionResult) {
        self.collector.publish(MetricEvent::SessionScored {
            score: result.overall_score,
            stars: result.star_rating,
            matched: result.matched_hits,
            expected: result.expected_hits,
        });

        for offset in result.hit_matches.iter().filter_map(|m| m.offset_ms) {
            let (avg, max, count) = lock_recovering(&self.offsets).observe(offset);
            self.collector.publish(MetricEvent::TimingOffset {
                avg_abs_ms: avg,
                max_abs_ms: max,
                sample_count: count,
            });
        }
    }

    pub fn record_dropped_blocks(&self, count: u64) {
        if count > 0 {
            self.collector.publish(MetricEvent::BlocksDropped { count });
        }
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 32)
    }
}

// Telemetry must keep working after a panicking publisher
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{score, ToleranceWindow};

    fn onset(timestamp: f64) -> MetricEvent {
        MetricEvent::Onset {
            timestamp,
            amplitude: 0.5,
            confidence: 1.0,
        }
    }

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(onset(1.0));
        collector.publish(onset(2.0));
        collector.publish(MetricEvent::BlocksDropped { count: 1 });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::Onset { timestamp, .. } if timestamp == 1.0
        ));
        assert!(matches!(
            snapshot.recent[2],
            MetricEvent::BlocksDropped { .. }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        collector.publish(onset(1.0));
        collector.publish(onset(2.0));
        collector.publish(onset(3.0));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::Onset { timestamp, .. } if timestamp == 2.0
        ));
    }

    #[test]
    fn hub_tracks_offsets_of_scored_sessions() {
        let hub = TelemetryHub::new(16, 16, 4);
        let detected: Vec<DetectedHit> = [0.52, 1.05].into_iter().map(DetectedHit::at).collect();
        let tolerance = ToleranceWindow::new(150.0).unwrap();
        hub.record_session(&score(&detected, &[0.5, 1.0], tolerance));

        let snapshot = hub.snapshot();
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::SessionScored { matched: 2, expected: 2, .. }
        ));
        match &snapshot.recent[2] {
            MetricEvent::TimingOffset {
                avg_abs_ms,
                max_abs_ms,
                sample_count,
            } => {
                assert!((avg_abs_ms - 35.0).abs() < 1e-6);
                assert!((max_abs_ms - 50.0).abs() < 1e-6);
                assert_eq!(*sample_count, 2);
            }
            other => panic!("expected timing offset, got {:?}", other),
        }
    }

    #[test]
    fn hub_skips_zero_drop_reports() {
        let hub = TelemetryHub::new(8, 8, 4);
        hub.record_dropped_blocks(0);
        hub.record_dropped_blocks(3);

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.total_events, 1);
        assert_eq!(snapshot.recent[0], MetricEvent::BlocksDropped { count: 3 });
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = TelemetryHub::new(8, 8, 4);
        let mut rx = hub.subscribe();
        hub.record_onset(&DetectedHit::at(0.25));
        assert_eq!(rx.try_recv().unwrap(), onset_at_full_amplitude(0.25));
    }

    fn onset_at_full_amplitude(timestamp: f64) -> MetricEvent {
        MetricEvent::Onset {
            timestamp,
            amplitude: 1.0,
            confidence: 1.0,
        }
    }
}
