//! Classifier input shaping and per-patch z-score normalization.
//!
//! The classifier expects a 4-D tensor `[1, frames_in_patch, frequency_bins,
//! 1]` (batch, time, frequency, channel) normalized to zero mean and unit
//! variance over the whole patch. The statistics are global scalars, not
//! per-frame or per-bin; that is what the classifier was trained against,
//! and a mismatch degrades accuracy silently.

use ndarray::Array4;

use crate::error::{Result, VadError};

/// Numeric floor added to the standard deviation so a constant (silent)
/// patch divides by something finite. Matches the f32 backend precision
/// floor of the training runtime.
pub const DEFAULT_EPSILON: f32 = 1e-7;

/// Shape a flat time-major patch into the `[1, T, F, 1]` classifier layout.
///
/// Raw data shorter than the tensor is right-aligned: zeros pad the FRONT
/// and the real data occupies the tail. This padding convention is load
/// bearing; the classifier was trained with it.
///
/// # Errors
/// Raw data longer than the tensor cannot be represented.
pub fn patch_tensor(
    raw: &[f32],
    frames_in_patch: usize,
    frequency_bins: usize,
) -> Result<Array4<f32>> {
    let size = frames_in_patch * frequency_bins;
    if raw.len() > size {
        return Err(VadError::PatchShape(format!(
            "{} values do not fit a [1, {frames_in_patch}, {frequency_bins}, 1] tensor",
            raw.len()
        )));
    }

    let mut vals = vec![0f32; size];
    let offset = size - raw.len();
    vals[offset..].copy_from_slice(raw);

    Array4::from_shape_vec((1, frames_in_patch, frequency_bins, 1), vals)
        .map_err(|e| VadError::PatchShape(e.to_string()))
}

/// Z-score normalizer with an instance-held numeric floor.
///
/// The floor is fixed at construction, so two pipelines with different
/// configurations never share hidden state. `normalize` is deterministic
/// and side-effect free; it consumes its input and rescales in place, so no
/// temporary tensor outlives the call.
#[derive(Debug, Clone)]
pub struct Normalizer {
    epsilon: f32,
}

impl Normalizer {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// `y[i] = (x[i] - mean) / (sqrt(variance) + epsilon)` with scalar mean
    /// and population variance over all elements.
    pub fn normalize(&self, mut x: Array4<f32>) -> Array4<f32> {
        let n = x.len();
        if n == 0 {
            return x;
        }

        let mean = x.sum() / n as f32;
        let variance = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n as f32;
        let denom = variance.sqrt() + self.epsilon;

        x.mapv_inplace(|v| (v - mean) / denom);
        x
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}
