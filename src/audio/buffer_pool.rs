// BufferPool - pre-allocated AudioBlocks circulating over two SPSC queues
//
// - data queue: device side pushes filled blocks, capture worker consumes
// - pool queue: capture worker returns drained blocks, device side recycles
//
// Every block is allocated here; neither side allocates afterwards.

use rtrb::{Consumer, Producer, RingBuffer};

use super::block::AudioBlock;

/// Both ends of both queues, as created
pub struct BufferPoolChannels {
    pub data_producer: Producer<AudioBlock>,
    pub data_consumer: Consumer<AudioBlock>,
    pub pool_producer: Producer<AudioBlock>,
    pub pool_consumer: Consumer<AudioBlock>,
}

/// Ends owned by the device callback
pub struct DeviceChannels {
    pub pool_consumer: Consumer<AudioBlock>,
    pub data_producer: Producer<AudioBlock>,
}

/// Ends owned by the capture worker
pub struct WorkerChannels {
    pub data_consumer: Consumer<AudioBlock>,
    pub pool_producer: Producer<AudioBlock>,
}

impl BufferPoolChannels {
    pub fn split_for_threads(self) -> (DeviceChannels, WorkerChannels) {
        (
            DeviceChannels {
                pool_consumer: self.pool_consumer,
                data_producer: self.data_producer,
            },
            WorkerChannels {
                data_consumer: self.data_consumer,
                pool_producer: self.pool_producer,
            },
        )
    }
}

pub struct BufferPool;

impl BufferPool {
    /// Allocate `block_count` blocks of `block_size` samples into the pool queue
    ///
    /// # Panics
    /// Panics if either argument is 0. Capture configuration is validated
    /// before a pool is built.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(block_count: usize, block_size: usize) -> BufferPoolChannels {
        assert!(block_count > 0, "block_count must be greater than 0");
        assert!(block_size > 0, "block_size must be greater than 0");

        let (mut pool_producer, pool_consumer) = RingBuffer::new(block_count);
        let (data_producer, data_consumer) = RingBuffer::new(block_count);

        for _ in 0..block_count {
            // Capacity equals block_count, so this cannot fill up
            if pool_producer.push(AudioBlock::with_capacity(block_size)).is_err() {
                break;
            }
        }

        BufferPoolChannels {
            data_producer,
            data_consumer,
            pool_producer,
            pool_consumer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_starts_full() {
        let mut channels = BufferPool::new(8, 512);

        let mut available = 0;
        while let Ok(block) = channels.pool_consumer.pop() {
            assert!(block.samples.capacity() >= 512);
            assert!(block.is_empty());
            available += 1;
        }
        assert_eq!(available, 8);
        assert!(channels.data_consumer.pop().is_err());
    }

    #[test]
    fn test_block_circulation_after_split() {
        let (mut device, mut worker) = BufferPool::new(2, 4).split_for_threads();

        for i in 0..2 {
            let mut block = device.pool_consumer.pop().unwrap();
            block.samples.extend_from_slice(&[i as f32; 4]);
            block.timestamp = i as f64;
            device.data_producer.push(block).unwrap();
        }
        assert!(device.pool_consumer.pop().is_err(), "pool should be exhausted");

        for i in 0..2 {
            let block = worker.data_consumer.pop().unwrap();
            assert_eq!(block.timestamp, i as f64);
            assert_eq!(block.samples[0], i as f32);
            worker.pool_producer.push(block).unwrap();
        }

        assert!(device.pool_consumer.pop().is_ok());
        assert!(device.pool_consumer.pop().is_ok());
        assert!(device.pool_consumer.pop().is_err());
    }

    #[test]
    fn test_halves_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DeviceChannels>();
        assert_send::<WorkerChannels>();
    }

    #[test]
    #[should_panic(expected = "block_size must be greater than 0")]
    fn test_zero_block_size_panics() {
        BufferPool::new(4, 0);
    }
}
