//! Speech classifier abstraction.
//!
//! The `SpeechClassifier` trait decouples the pipeline from any specific
//! backend (development stub, ONNX CNN, future quantized export). The model
//! internals are opaque to the core: a normalized patch tensor goes in, a
//! scalar speech probability comes out.
//!
//! `&mut self` on `predict` intentionally expresses that backends may be
//! stateful (session scratch buffers, IO bindings). All mutation is
//! serialised through `ClassifierHandle`'s `parking_lot::Mutex`.

pub mod stub;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use stub::StubClassifier;

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use std::sync::Arc;

use ndarray::Array4;
use parking_lot::Mutex;

use crate::error::Result;

/// Contract for speech/non-speech patch classifiers.
pub trait SpeechClassifier: Send + 'static {
    /// One-time warm-up: load weights, run a dummy inference to populate
    /// kernels and caches. Called once at engine startup.
    ///
    /// # Errors
    /// Returns an error if model files are missing or corrupt; fatal to
    /// session start.
    fn warm_up(&mut self) -> Result<()>;

    /// Map one normalized `[1, T, F, 1]` patch tensor to a speech
    /// probability in [0, 1].
    fn predict(&mut self, input: &Array4<f32>) -> Result<f32>;
}

/// Thread-safe reference-counted handle to any `SpeechClassifier` implementor.
///
/// `parking_lot::Mutex` for non-poisoning on panic and a cheaper
/// uncontended lock than `std::sync::Mutex`.
#[derive(Clone)]
pub struct ClassifierHandle(pub Arc<Mutex<dyn SpeechClassifier>>);

impl ClassifierHandle {
    /// Wrap any `SpeechClassifier` in a `ClassifierHandle`.
    pub fn new<C: SpeechClassifier>(classifier: C) -> Self {
        Self(Arc::new(Mutex::new(classifier)))
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle").finish_non_exhaustive()
    }
}
