//! Offline frame source backed by a wav file.
//!
//! Decodes the whole file up front (mono downmix, f32 in [-1, 1]) and feeds
//! it through the same spectral front end as live capture, one block per
//! tick. Once the file is exhausted every further pull yields a sentinel
//! frame, so a downstream consumer can keep ticking and simply stops seeing
//! valid data.

use std::path::Path;

use tracing::info;

use crate::error::{Result, VadError};
use crate::frame::spectral::SpectralAnalyzer;
use crate::frame::{Frame, FrameSource};

pub struct WavFrameSource {
    samples: Vec<f32>,
    pos: usize,
    sample_rate: u32,
    analyzer: SpectralAnalyzer,
}

impl WavFrameSource {
    /// Open a wav file and prepare the spectral front end.
    ///
    /// # Errors
    /// Decode failures and unusable analysis geometry are fatal; there is
    /// no sensible degraded mode for a corrupt input file.
    pub fn open(path: impl AsRef<Path>, block_size: usize, frequency_bins: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut reader =
            hound::WavReader::open(path).map_err(|e| VadError::FrameSource(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| VadError::FrameSource(e.to_string()))?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| VadError::FrameSource(e.to_string()))?
            }
        };

        let samples = downmix(&interleaved, channels);
        info!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels,
            samples = samples.len(),
            "wav frame source opened"
        );

        Self::from_samples(samples, spec.sample_rate, block_size, frequency_bins)
    }

    /// Build a source from already-decoded mono samples.
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        block_size: usize,
        frequency_bins: usize,
    ) -> Result<Self> {
        let analyzer = SpectralAnalyzer::new(block_size, frequency_bins)?;
        Ok(Self {
            samples,
            pos: 0,
            sample_rate,
            analyzer,
        })
    }

    /// True once every complete block has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos + self.analyzer.block_size() > self.samples.len()
    }

    /// Complete blocks remaining, i.e. valid frames still to come.
    pub fn frames_remaining(&self) -> usize {
        (self.samples.len() - self.pos) / self.analyzer.block_size()
    }
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

impl FrameSource for WavFrameSource {
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
        if self.is_exhausted() {
            return Ok(Frame::sentinel(self.analyzer.frequency_bins()));
        }
        let block = &self.samples[self.pos..self.pos + self.analyzer.block_size()];
        self.pos += self.analyzer.block_size();
        Ok(self.analyzer.analyze(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, cycles_per_block: f32, block: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                0.05 + (2.0 * std::f32::consts::PI * cycles_per_block * i as f32 / block as f32)
                    .sin()
            })
            .collect()
    }

    #[test]
    fn yields_one_frame_per_block_then_sentinels() {
        let samples = sine(256 * 3, 8.0, 256);
        let mut source = WavFrameSource::from_samples(samples, 16_000, 256, 64).expect("source");

        assert_eq!(source.frames_remaining(), 3);
        for _ in 0..3 {
            let frame = source.next_frame().expect("frame");
            assert!(!frame.is_sentinel());
            assert_eq!(frame.len(), 64);
        }
        assert!(source.is_exhausted());
        assert!(source.next_frame().expect("frame").is_sentinel());
    }

    #[test]
    fn trailing_partial_block_is_never_emitted() {
        let samples = sine(256 + 100, 8.0, 256);
        let mut source = WavFrameSource::from_samples(samples, 16_000, 256, 64).expect("source");
        assert!(!source.next_frame().expect("frame").is_sentinel());
        assert!(source.next_frame().expect("frame").is_sentinel());
    }

    #[test]
    fn downmix_averages_channels() {
        assert_eq!(downmix(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.25, 0.75], 1), vec![0.25, 0.75]);
    }

    #[test]
    fn open_missing_file_is_an_error() {
        assert!(WavFrameSource::open("/nonexistent.wav", 256, 64).is_err());
    }
}
