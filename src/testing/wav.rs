//! WAV file helpers built on hound

use std::path::Path;

use crate::error::AudioError;

/// Read a WAV file as mono f32 samples plus its sample rate
///
/// Multi-channel files are averaged down to one channel.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let read_error = |err: hound::Error| AudioError::StreamFailure {
        reason: format!("error reading {}: {err}", path.display()),
    };

    let mut reader = hound::WavReader::open(path).map_err(|err| AudioError::StreamFailure {
        reason: format!("failed to open {}: {err}", path.display()),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::StreamFailure {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(read_error))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / scale).map_err(read_error))
                .collect::<Result<Vec<f32>, _>>()?
        }
    };

    let channels = spec.channels as usize;
    if channels == 1 {
        return Ok((samples, spec.sample_rate));
    }

    let mono = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Write mono f32 samples as a 32-bit float WAV file
pub fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let write_error = |err: hound::Error| AudioError::StreamFailure {
        reason: format!("error writing {}: {err}", path.display()),
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(write_error)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(write_error)?;
    }
    writer.finalize().map_err(write_error)
}
