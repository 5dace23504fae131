// Capture module - block delivery to the onset detector
//
// Device callback -> BlockAssembler -> data queue -> CaptureWorker
//   -> RecordingSession (detector + hit list) -> CaptureEvent broadcast

pub mod config_handle;
pub mod level;
pub mod session;
pub mod worker;

pub use config_handle::ConfigHandle;
pub use level::LevelMeter;
pub use session::{detect_offline, CaptureEvent, RecordingSession};
pub use worker::{spawn_capture_worker, CaptureWorker};
