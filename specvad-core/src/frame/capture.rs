//! Live microphone capture via cpal.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated priority.
//! It **must not** allocate, block on a mutex, or perform I/O. This module
//! satisfies that contract by writing directly into the SPSC ring buffer
//! producer whose `push_slice` is lock-free and allocation-free.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio on
//! macOS). `MicCapture` therefore must be created and dropped on the same
//! thread. The [`SpectralFrameSource`](crate::frame::SpectralFrameSource)
//! holding the consumer half is `Send` and is what crosses into the engine.

#[cfg(feature = "audio-cpal")]
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SampleRate, Stream, StreamConfig,
};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[cfg(feature = "audio-cpal")]
use tracing::{error, info, warn};

use crate::buffering::SampleProducer;
#[cfg(feature = "audio-cpal")]
use crate::buffering::Producer;
use crate::error::Result;
#[cfg(not(feature = "audio-cpal"))]
use crate::error::VadError;

/// Handle to an active audio capture stream.
///
/// **Not `Send`**: create and drop this type on the same OS thread.
pub struct MicCapture {
    /// Kept alive so the stream is not dropped prematurely.
    #[cfg(feature = "audio-cpal")]
    _stream: Stream,
    /// Shared flag; set to `false` to signal the callback to no-op.
    running: Arc<AtomicBool>,
    /// Actual capture sample rate reported by the device (Hz).
    pub sample_rate: u32,
}

#[cfg(feature = "audio-cpal")]
impl MicCapture {
    /// Open the system default microphone and push mono f32 samples into
    /// `producer`.
    ///
    /// # Errors
    /// Returns `VadError::NoDefaultInputDevice` when no microphone is
    /// available, or `VadError::AudioStream` if cpal fails to build the
    /// stream.
    pub fn open_default(producer: SampleProducer, running: Arc<AtomicBool>) -> Result<Self> {
        use crate::error::VadError;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(VadError::NoDefaultInputDevice)?;

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening input device"
        );

        let supported = device
            .default_input_config()
            .map_err(|e| VadError::AudioStream(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();

        info!(sample_rate, channels, "audio config selected");

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let running_f32 = Arc::clone(&running);
        let running_i16 = Arc::clone(&running);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let ch = channels as usize;
                let mut producer = producer;
                let mut mix_buf: Vec<f32> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _info| {
                        if !running_f32.load(Ordering::Relaxed) {
                            return;
                        }
                        if ch == 1 {
                            let written = producer.push_slice(data);
                            if written < data.len() {
                                warn!("ring buffer full: dropped {} frames", data.len() - written);
                            }
                            return;
                        }
                        let frames = data.len() / ch;
                        mix_buf.resize(frames, 0.0);
                        for (f, out) in mix_buf.iter_mut().enumerate() {
                            let base = f * ch;
                            *out = data[base..base + ch].iter().sum::<f32>() / ch as f32;
                        }
                        let written = producer.push_slice(&mix_buf);
                        if written < mix_buf.len() {
                            warn!("ring buffer full: dropped {} frames", mix_buf.len() - written);
                        }
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }

            SampleFormat::I16 => {
                let ch = channels as usize;
                let mut producer = producer;
                let mut mix_buf: Vec<f32> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _info| {
                        if !running_i16.load(Ordering::Relaxed) {
                            return;
                        }
                        let frames = data.len() / ch;
                        mix_buf.resize(frames, 0.0);
                        for (f, out) in mix_buf.iter_mut().enumerate() {
                            let base = f * ch;
                            *out = data[base..base + ch]
                                .iter()
                                .map(|s| *s as f32 / 32768.0)
                                .sum::<f32>()
                                / ch as f32;
                        }
                        let written = producer.push_slice(&mix_buf);
                        if written < mix_buf.len() {
                            warn!("ring buffer full: dropped {} frames", mix_buf.len() - written);
                        }
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }

            fmt => {
                return Err(VadError::AudioStream(format!(
                    "unsupported sample format: {fmt:?}"
                )))
            }
        }
        .map_err(|e| VadError::AudioStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VadError::AudioStream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            running,
            sample_rate,
        })
    }

    /// Stop: signal the callback to no-op on its next invocation.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Stub when the `audio-cpal` feature is disabled.
#[cfg(not(feature = "audio-cpal"))]
impl MicCapture {
    pub fn open_default(_producer: SampleProducer, _running: Arc<AtomicBool>) -> Result<Self> {
        Err(VadError::AudioStream(
            "compiled without audio-cpal feature".into(),
        ))
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}
