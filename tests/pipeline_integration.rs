//! End-to-end tests: synthetic audio -> blocks -> detector -> scoring
//!
//! Signals come from `drum_buddy::testing::HitTrain`, so every run sees the
//! same samples. Detected timestamps are block starts, so each hit lands
//! within one block (~11.6ms at 44.1kHz) of its true onset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use drum_buddy::audio::{BlockAssembler, BufferPool};
use drum_buddy::capture::{detect_offline, spawn_capture_worker, ConfigHandle, RecordingSession};
use drum_buddy::scoring::star_rating;
use drum_buddy::testing::HitTrain;
use drum_buddy::{
    score, score_pattern, Beat, DetectedHit, DetectorConfig, DifficultyTier, RhythmPattern,
    ToleranceWindow,
};

const RATE: u32 = 44_100;
const BLOCK: usize = 512;
const BLOCK_SECS: f64 = BLOCK as f64 / RATE as f64;

fn detector() -> DetectorConfig {
    DetectorConfig::default().with_sample_rate(RATE as f64)
}

fn assert_near_onsets(hits: &[DetectedHit], onsets: &[f64]) {
    assert_eq!(
        hits.len(),
        onsets.len(),
        "expected {} hits, got {:?}",
        onsets.len(),
        hits
    );
    for (hit, onset) in hits.iter().zip(onsets) {
        assert!(
            (hit.timestamp - onset).abs() <= BLOCK_SECS + 1e-9,
            "hit at {:.4}s too far from onset {:.4}s",
            hit.timestamp,
            onset
        );
    }
}

#[test]
fn offline_detection_finds_each_synthetic_hit() {
    let onsets = [0.5, 1.0, 1.5, 2.0];
    let samples = HitTrain::new(&onsets, RATE).render();

    let hits = detect_offline(&samples, detector(), BLOCK).unwrap();
    assert_near_onsets(&hits, &onsets);
    assert!(hits.iter().all(|hit| hit.confidence == 1.0));
}

#[test]
fn noise_below_floor_produces_no_false_hits() {
    let onsets = [0.3, 0.9];
    let samples = HitTrain::new(&onsets, RATE)
        .with_noise(0.005, 42)
        .with_duration(3.0)
        .render();

    let hits = detect_offline(&samples, detector(), BLOCK).unwrap();
    assert_near_onsets(&hits, &onsets);
}

#[test]
fn quiet_hits_need_gain() {
    let onsets = [0.4, 1.2];
    let samples = HitTrain::new(&onsets, RATE).with_amplitude(0.2).render();

    assert!(detect_offline(&samples, detector(), BLOCK).unwrap().is_empty());

    let boosted = DetectorConfig {
        mic_gain_multiplier: 3.0,
        ..detector()
    };
    let hits = detect_offline(&samples, boosted, BLOCK).unwrap();
    assert_near_onsets(&hits, &onsets);
}

#[test]
fn restarting_a_session_reproduces_identical_hits() {
    let samples = HitTrain::new(&[0.25, 0.7, 1.1], RATE)
        .with_noise(0.004, 9)
        .render();
    let mut session = RecordingSession::new(detector());

    let mut runs = Vec::new();
    for _ in 0..2 {
        session.start().unwrap();
        for (index, block) in samples.chunks(BLOCK).enumerate() {
            session
                .process_block(block, index as f64 * BLOCK_SECS)
                .unwrap();
        }
        runs.push(session.stop().unwrap());
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 3);
}

#[test]
fn threaded_capture_matches_offline_detection() {
    let onsets = [0.2, 0.8, 1.4, 2.0];
    let mono = HitTrain::new(&onsets, RATE).render();

    // Stereo device with a silent second channel
    let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, 0.0]).collect();

    let total_blocks = mono.len() / BLOCK + 1;
    let (device, worker) = BufferPool::new(total_blocks, BLOCK).split_for_threads();
    let mut assembler = BlockAssembler::new(device, BLOCK, 2, RATE as f64);
    let dropped = assembler.dropped_blocks();
    let running = Arc::new(AtomicBool::new(true));

    let handle = spawn_capture_worker(
        worker,
        RecordingSession::new(detector()),
        ConfigHandle::new(detector()),
        Arc::clone(&running),
    );

    // Device callbacks of 441 frames (10ms) each
    for callback in interleaved.chunks(441 * 2) {
        assembler.push_interleaved(callback);
    }
    running.store(false, Ordering::SeqCst);

    let threaded = handle.join().unwrap().unwrap();
    assert_eq!(dropped.load(Ordering::Relaxed), 0);

    // The worker never sees the trailing partial block; it holds no onset
    let offline = detect_offline(&mono, detector(), BLOCK).unwrap();
    assert_eq!(threaded, offline);
    assert_near_onsets(&threaded, &onsets);
}

#[test]
fn synthetic_performance_scores_three_stars() {
    let pattern = RhythmPattern::new(
        "Four on the floor",
        DifficultyTier::GettingGood,
        vec![Beat::hit(0.0), Beat::hit(1.0), Beat::hit(2.0), Beat::hit(3.0)],
    );
    let bpm = 90;
    let expected = pattern.hit_times(bpm).unwrap();

    // Drummer starts half a second into the take
    let lead_in = 0.5;
    let onsets: Vec<f64> = expected.iter().map(|t| t + lead_in).collect();
    let samples = HitTrain::new(&onsets, RATE).render();
    let hits: Vec<DetectedHit> = detect_offline(&samples, detector(), BLOCK)
        .unwrap()
        .into_iter()
        .map(|hit| DetectedHit {
            timestamp: hit.timestamp - lead_in,
            ..hit
        })
        .collect();

    let tolerance = ToleranceWindow::for_tier(pattern.difficulty);
    let result = score_pattern(&hits, &pattern, bpm, tolerance).unwrap();

    assert_eq!(result.matched_hits, 4);
    assert_eq!(result.extra_hits, 0);
    assert!(result.overall_score >= 95, "score {}", result.overall_score);
    assert_eq!(result.star_rating, 3);
    assert!(result.is_perfect());
}

#[test]
fn missing_and_extra_hits_lower_the_score() {
    let expected = [0.5, 1.0, 1.5, 2.0];
    // Third beat skipped, a stray hit between the first two
    let onsets = [0.5, 0.75, 1.0, 2.0];
    let samples = HitTrain::new(&onsets, RATE).render();
    let hits = detect_offline(&samples, detector(), BLOCK).unwrap();

    let result = score(&hits, &expected, ToleranceWindow::new(110.0).unwrap());
    assert_eq!(result.matched_hits, 3);
    assert_eq!(result.missed_hits, 1);
    assert_eq!(result.extra_hits, 1);
    assert_eq!(result.hit_accuracy_score, 70.0);
    assert_eq!(result.star_rating, star_rating(result.overall_score));
    assert!(result.star_rating < 3);
}
