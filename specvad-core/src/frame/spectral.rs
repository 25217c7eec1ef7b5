//! Spectral front end: time-domain blocks → dB magnitude frames.
//!
//! ## Analysis parameters
//!
//! | Parameter      | Value                            |
//! |----------------|----------------------------------|
//! | Window         | Hann, `block_size` samples       |
//! | FFT size       | `block_size`                     |
//! | Bins kept      | first `frequency_bins` of `N/2`  |
//! | Magnitude      | `20·log10(|X[k]| / block_size)`  |
//!
//! A silent block has zero magnitude in every bin, so the log maps it to
//! negative infinity; exactly the sentinel convention the assembler skips.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::debug;

use crate::buffering::{Consumer, Observer, SampleConsumer};
use crate::error::{Result, VadError};
use crate::frame::{Frame, FrameSource};

/// Hann-windowed FFT magnitude extractor for one fixed block size.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    block_size: usize,
    frequency_bins: usize,
}

impl SpectralAnalyzer {
    /// # Errors
    /// `frequency_bins` must fit inside the half spectrum (`block_size / 2`).
    pub fn new(block_size: usize, frequency_bins: usize) -> Result<Self> {
        if block_size == 0 || frequency_bins == 0 || frequency_bins > block_size / 2 {
            return Err(VadError::FrameSource(format!(
                "cannot keep {frequency_bins} bins from a {block_size}-sample block"
            )));
        }

        let fft = FftPlanner::new().plan_fft_forward(block_size);
        let window: Vec<f32> = (0..block_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / block_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Ok(Self {
            fft,
            window,
            block_size,
            frequency_bins,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn frequency_bins(&self) -> usize {
        self.frequency_bins
    }

    /// Transform one `block_size`-sample block into a dB magnitude frame.
    pub fn analyze(&self, samples: &[f32]) -> Frame {
        debug_assert_eq!(samples.len(), self.block_size);

        let mut buf: Vec<Complex<f32>> = samples
            .iter()
            .zip(&self.window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buf);

        let scale = 1.0 / self.block_size as f32;
        let bins = buf[..self.frequency_bins]
            .iter()
            .map(|c| 20.0 * (c.norm() * scale).log10())
            .collect();
        Frame::new(bins)
    }
}

/// Frame source draining time-domain samples from a ring buffer.
///
/// Pairs with [`MicCapture`](crate::frame::MicCapture): the capture callback
/// produces into the ring, this side consumes one analysis block per tick.
/// An underrun (fewer than `block_size` samples pending) yields a sentinel
/// frame without consuming anything, so no samples straddle two blocks.
pub struct SpectralFrameSource {
    consumer: SampleConsumer,
    analyzer: SpectralAnalyzer,
    sample_rate: u32,
    block: Vec<f32>,
    underruns: u64,
}

impl SpectralFrameSource {
    pub fn new(
        consumer: SampleConsumer,
        sample_rate: u32,
        block_size: usize,
        frequency_bins: usize,
    ) -> Result<Self> {
        let analyzer = SpectralAnalyzer::new(block_size, frequency_bins)?;
        Ok(Self {
            consumer,
            analyzer,
            sample_rate,
            block: vec![0f32; block_size],
            underruns: 0,
        })
    }

    /// Ticks that found no complete block pending.
    pub fn underruns(&self) -> u64 {
        self.underruns
    }
}

impl FrameSource for SpectralFrameSource {
    fn frequency_bins(&self) -> usize {
        self.analyzer.frequency_bins()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn block_size(&self) -> usize {
        self.analyzer.block_size()
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if self.consumer.occupied_len() < self.block.len() {
            self.underruns += 1;
            debug!(underruns = self.underruns, "spectral underrun");
            return Ok(Frame::sentinel(self.analyzer.frequency_bins()));
        }

        let read = self.consumer.pop_slice(&mut self.block);
        debug_assert_eq!(read, self.block.len());
        Ok(self.analyzer.analyze(&self.block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffering::{create_sample_ring, Producer};

    #[test]
    fn rejects_bins_beyond_half_spectrum() {
        assert!(SpectralAnalyzer::new(256, 200).is_err());
        assert!(SpectralAnalyzer::new(256, 128).is_ok());
    }

    #[test]
    fn silent_block_produces_sentinel_frame() {
        let analyzer = SpectralAnalyzer::new(256, 64).expect("analyzer");
        let frame = analyzer.analyze(&vec![0.0; 256]);
        assert!(frame.is_sentinel());
        assert_eq!(frame.len(), 64);
    }

    #[test]
    fn sine_energy_lands_in_the_matching_bin() {
        let block = 512;
        let analyzer = SpectralAnalyzer::new(block, 128).expect("analyzer");

        // 16 cycles across the block → bin 16; small DC offset keeps bin 0
        // finite so the frame is unambiguously valid.
        let samples: Vec<f32> = (0..block)
            .map(|i| 0.05 + (2.0 * std::f32::consts::PI * 16.0 * i as f32 / block as f32).sin())
            .collect();
        let frame = analyzer.analyze(&samples);

        let peak = frame
            .bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
        assert!(!frame.is_sentinel());
    }

    #[test]
    fn underrun_returns_sentinel_without_consuming() {
        let (mut producer, consumer) = create_sample_ring();
        producer.push_slice(&[0.5; 100]);

        let mut source = SpectralFrameSource::new(consumer, 44_100, 256, 64).expect("source");
        let frame = source.next_frame().expect("frame");
        assert!(frame.is_sentinel());
        assert_eq!(source.underruns(), 1);

        // Top the ring up past a full block; the 100 buffered samples must
        // still be there.
        producer.push_slice(&vec![0.5; 156]);
        let frame = source.next_frame().expect("frame");
        assert!(!frame.is_sentinel());
    }

    #[test]
    fn tick_interval_uses_block_and_rate() {
        let (_producer, consumer) = create_sample_ring();
        let source = SpectralFrameSource::new(consumer, 16_000, 512, 128).expect("source");
        let ms = source.tick_interval().as_secs_f64() * 1000.0;
        assert!((ms - 32.0).abs() < 1e-6);
    }
}
