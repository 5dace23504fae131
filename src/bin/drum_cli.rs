use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use drum_buddy::audio::CpalInput;
use drum_buddy::capture::{detect_offline, CaptureEvent, ConfigHandle};
use drum_buddy::testing::{read_wav_mono, write_wav_mono, HitTrain};
use drum_buddy::{telemetry, AppConfig, DetectedHit, RhythmPattern, ToleranceWindow};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Parser, Debug)]
#[command(name = "drum_cli", about = "Onset detection and rhythm scoring harness for Drum Buddy")]
struct Cli {
    /// JSON configuration file (defaults to assets/drum_buddy.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at DEBUG instead of INFO
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect onsets in a WAV file, one JSON hit per line
    Detect {
        #[arg(long)]
        wav: PathBuf,
    },
    /// Detect onsets in a WAV file and score them against a pattern
    Score {
        #[arg(long)]
        wav: PathBuf,
        /// Pattern JSON file
        #[arg(long)]
        pattern: PathBuf,
        /// Tempo (defaults to the pattern's suggested BPM)
        #[arg(long)]
        bpm: Option<u32>,
        /// Override the difficulty tier's tolerance window
        #[arg(long)]
        tolerance_ms: Option<f64>,
    },
    /// Record from the default microphone and print hits as they happen
    Listen {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
    /// Write a synthetic hit-train WAV
    Synth {
        #[arg(long)]
        out: PathBuf,
        /// Hit times in seconds, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        times: Vec<f64>,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        /// Peak amplitude of background noise
        #[arg(long, default_value_t = 0.0)]
        noise: f32,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    drum_buddy::init_logging_with_level(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    });

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Detect { wav } => run_detect(&config, &wav),
        Commands::Score {
            wav,
            pattern,
            bpm,
            tolerance_ms,
        } => run_score(&config, &wav, &pattern, bpm, tolerance_ms),
        Commands::Listen { seconds } => run_listen(&config, seconds),
        Commands::Synth {
            out,
            times,
            sample_rate,
            noise,
        } => run_synth(&out, &times, sample_rate, noise),
    }
}

fn detect_wav(config: &AppConfig, wav: &Path) -> Result<Vec<DetectedHit>> {
    let (samples, sample_rate) =
        read_wav_mono(wav).with_context(|| format!("reading {}", wav.display()))?;
    let detector = config.detector.with_sample_rate(sample_rate as f64);
    detector
        .validate()
        .with_context(|| format!("detector configuration for {}", wav.display()))?;
    let hits = detect_offline(&samples, detector, config.capture.block_size)
        .with_context(|| format!("detecting onsets in {}", wav.display()))?;
    tracing::info!(
        "[Detect] {} hits in {:.2}s of audio",
        hits.len(),
        samples.len() as f64 / sample_rate as f64
    );
    Ok(hits)
}

fn run_detect(config: &AppConfig, wav: &Path) -> Result<ExitCode> {
    for hit in detect_wav(config, wav)? {
        println!("{}", serde_json::to_string(&hit)?);
    }
    Ok(ExitCode::from(0))
}

fn run_score(
    config: &AppConfig,
    wav: &Path,
    pattern_path: &Path,
    bpm: Option<u32>,
    tolerance_ms: Option<f64>,
) -> Result<ExitCode> {
    let json = fs::read_to_string(pattern_path)
        .with_context(|| format!("reading {}", pattern_path.display()))?;
    let pattern = RhythmPattern::from_json(&json)
        .with_context(|| format!("parsing pattern {}", pattern_path.display()))?;

    let bpm = bpm.unwrap_or_else(|| pattern.suggested_bpm());
    let override_ms = tolerance_ms.unwrap_or(config.scoring.tolerance_override_ms);
    let tolerance = ToleranceWindow::resolve(pattern.difficulty, override_ms)?;

    let hits = detect_wav(config, wav)?;
    let result = drum_buddy::score_pattern(&hits, &pattern, bpm, tolerance)?;
    telemetry::hub().record_session(&result);

    let report = ScoreReport {
        pattern: &pattern.name,
        bpm,
        tolerance_ms: tolerance.ms(),
        detected: &hits,
        result: &result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_listen(config: &AppConfig, seconds: u64) -> Result<ExitCode> {
    if seconds == 0 {
        bail!("--seconds must be at least 1");
    }

    let handle = ConfigHandle::new(config.detector);
    let mut input = CpalInput::start(&config.capture, handle).context("starting microphone")?;
    eprintln!(
        "Listening for {}s at {} Hz, hit something...",
        seconds,
        input.sample_rate()
    );

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        match input.events().try_recv() {
            Ok(CaptureEvent::Hit(hit)) => println!("{}", serde_json::to_string(&hit)?),
            Ok(CaptureEvent::Level { .. }) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("[Listen] Skipped {} capture events", skipped)
            }
            Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
            Err(TryRecvError::Closed) => break,
        }
    }

    let hits = input.stop().context("stopping microphone")?;
    eprintln!("Recorded {} hits", hits.len());
    Ok(ExitCode::from(0))
}

fn run_synth(out: &Path, times: &[f64], sample_rate: u32, noise: f32) -> Result<ExitCode> {
    if sample_rate == 0 {
        bail!("--sample-rate must be positive");
    }
    let mut train = HitTrain::new(times, sample_rate);
    if noise > 0.0 {
        let seed = train.seed;
        train = train.with_noise(noise, seed);
    }
    let samples = train.render();
    write_wav_mono(out, &samples, sample_rate)
        .with_context(|| format!("writing {}", out.display()))?;
    eprintln!(
        "Wrote {} hits ({} samples) to {}",
        times.len(),
        samples.len(),
        out.display()
    );
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    pattern: &'a str,
    bpm: u32,
    tolerance_ms: f64,
    detected: &'a [DetectedHit],
    result: &'a drum_buddy::SessionResult,
}
