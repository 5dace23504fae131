// Audio module - block delivery from input devices

pub mod block;
pub mod buffer_pool;
pub mod engine_cpal;

pub use block::{AudioBlock, BlockAssembler};
pub use buffer_pool::{BufferPool, BufferPoolChannels, DeviceChannels, WorkerChannels};
pub use engine_cpal::CpalInput;
