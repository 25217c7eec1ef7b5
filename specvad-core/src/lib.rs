//! # specvad-core
//!
//! Streaming patch-based voice activity detection engine.
//!
//! ## Architecture
//!
//! ```text
//! Microphone → MicCapture → SPSC RingBuffer → SpectralFrameSource (FFT → dB bins)
//!                                                    │  one Frame per tick
//!                                              PatchAssembler
//!                                                    │  Complete(patch)
//!                                     shape [1, T, F, 1] + z-score normalize
//!                                                    │
//!                                   SpeechClassifier::predict (spawn_blocking)
//!                                                    │
//!                                         decide(prob, threshold)
//!                                                    │
//!                                 broadcast::Sender<ClassificationEvent>
//! ```
//!
//! The tick loop is non-blocking; only classifier inference runs off-loop.
//! Inference for consecutive patches may overlap; events carry `seq` for
//! downstream ordering, and a session epoch so results from a stopped
//! session are never delivered.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod classify;
pub mod decision;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod metadata;
pub mod patch;
pub mod tensor;

// Convenience re-exports for downstream crates
pub use classify::{ClassifierHandle, SpeechClassifier, StubClassifier};
pub use decision::{decide, ClassificationResult};
pub use engine::{EngineConfig, VadEngine};
pub use error::VadError;
pub use events::{ClassificationEvent, EngineStatus, EngineStatusEvent};
pub use frame::{Frame, FrameSource};
pub use metadata::ModelMetadata;

#[cfg(feature = "onnx")]
pub use classify::OnnxClassifier;
