//! Frame acquisition abstraction.
//!
//! A `Frame` is one tick's worth of frequency-bin magnitudes (dB scale).
//! The `FrameSource` trait is the acquisition seam: the engine pulls one
//! frame per tick and never cares whether it came from a live microphone,
//! a wav file, or a scripted test source.

pub mod capture;
pub mod spectral;
pub mod wav;

pub use spectral::{SpectralAnalyzer, SpectralFrameSource};
pub use wav::WavFrameSource;

#[cfg(feature = "audio-cpal")]
pub use capture::MicCapture;

use std::time::Duration;

use crate::error::Result;

/// One tick's frequency-bin magnitude vector.
///
/// Values are dB-scale magnitudes; a frame whose first bin is negative
/// infinity is the sentinel for an invalid or unavailable read (spectral
/// underflow, source exhausted, no signal yet).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frequency-bin magnitudes in dB, lowest bin first.
    pub bins: Vec<f32>,
}

impl Frame {
    pub fn new(bins: Vec<f32>) -> Self {
        Self { bins }
    }

    /// An explicitly-invalid frame of the given width.
    pub fn sentinel(len: usize) -> Self {
        Self {
            bins: vec![f32::NEG_INFINITY; len],
        }
    }

    /// True when this frame signals an invalid read. An empty frame carries
    /// no data and counts as invalid too.
    pub fn is_sentinel(&self) -> bool {
        self.bins
            .first()
            .map_or(true, |v| *v == f32::NEG_INFINITY)
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Trait for all frame sources.
///
/// Implementors are pulled synchronously from the tick loop, so `next_frame`
/// must not block: a source with nothing ready returns a sentinel frame and
/// the tick is dropped, leaving patch accumulation untouched.
pub trait FrameSource: Send + 'static {
    /// Width of every frame this source produces.
    fn frequency_bins(&self) -> usize;

    /// Native sample rate of the underlying audio, in Hz.
    fn sample_rate(&self) -> u32;

    /// Time-domain samples consumed per frame.
    fn block_size(&self) -> usize;

    /// Pull the frame for the current tick.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Tick cadence derived from the source's native rate: one frame per
    /// `block_size / sample_rate` seconds.
    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.block_size() as f64 / f64::from(self.sample_rate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource;

    impl FrameSource for FixedSource {
        fn frequency_bins(&self) -> usize {
            232
        }
        fn sample_rate(&self) -> u32 {
            44_100
        }
        fn block_size(&self) -> usize {
            1024
        }
        fn next_frame(&mut self) -> Result<Frame> {
            Ok(Frame::sentinel(232))
        }
    }

    #[test]
    fn sentinel_frame_is_detected() {
        let frame = Frame::sentinel(4);
        assert!(frame.is_sentinel());
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn valid_frame_is_not_sentinel() {
        let frame = Frame::new(vec![-42.0, -60.0]);
        assert!(!frame.is_sentinel());
    }

    #[test]
    fn empty_frame_counts_as_sentinel() {
        assert!(Frame::new(vec![]).is_sentinel());
    }

    #[test]
    fn negative_infinity_first_bin_marks_sentinel_even_with_finite_tail() {
        let frame = Frame::new(vec![f32::NEG_INFINITY, -30.0]);
        assert!(frame.is_sentinel());
    }

    #[test]
    fn tick_interval_follows_block_over_rate() {
        let interval = FixedSource.tick_interval();
        // 1024 samples at 44.1 kHz ≈ 23.22 ms
        let ms = interval.as_secs_f64() * 1000.0;
        assert!((ms - 23.22).abs() < 0.01, "interval {ms} ms");
    }
}
