//! Test and harness support: synthetic recordings and WAV I/O

pub mod signals;
pub mod wav;

pub use signals::HitTrain;
pub use wav::{read_wav_mono, write_wav_mono};
