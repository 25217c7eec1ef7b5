//! Lock-free SPSC ring buffer for time-domain audio samples.
//!
//! Uses `ringbuf::HeapRb<f32>` which provides a wait-free `push_slice`
//! safe to call from the real-time audio callback. The consumer half is
//! drained by the spectral front end, one analysis block per tick.

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Observer, Producer};

/// Type alias for the producer half; held by the audio callback thread.
pub type SampleProducer = ringbuf::HeapProd<f32>;

/// Type alias for the consumer half; held by the spectral frame source.
pub type SampleConsumer = ringbuf::HeapCons<f32>;

/// Buffer capacity: 2^19 = 524 288 f32 samples ≈ 11.9 s at 44.1 kHz.
/// Enough to ride out a slow inference burst without dropping callbacks.
pub const RING_CAPACITY: usize = 1 << 19;

/// Create a matched producer/consumer pair backed by a heap-allocated ring buffer.
pub fn create_sample_ring() -> (SampleProducer, SampleConsumer) {
    HeapRb::<f32>::new(RING_CAPACITY).split()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_round_trips_samples_in_order() {
        let (mut producer, mut consumer) = create_sample_ring();
        let written = producer.push_slice(&[0.1, 0.2, 0.3]);
        assert_eq!(written, 3);

        let mut out = [0f32; 3];
        let read = consumer.pop_slice(&mut out);
        assert_eq!(read, 3);
        assert_eq!(out, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn occupied_len_tracks_pending_samples() {
        let (mut producer, consumer) = create_sample_ring();
        assert_eq!(consumer.occupied_len(), 0);
        producer.push_slice(&[0.0; 128]);
        assert_eq!(consumer.occupied_len(), 128);
    }
}
