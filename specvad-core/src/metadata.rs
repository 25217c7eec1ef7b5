//! Model companion metadata: patch geometry and decision threshold.
//!
//! A trained classifier ships with a small JSON record describing the input
//! it expects and the decision threshold it was calibrated for:
//!
//! ```json
//! { "frequencyBins": 232, "frames": 43, "threshold": 0.3656232953071594 }
//! ```
//!
//! The threshold is calibration output, not a universal constant; published
//! models carry values anywhere in the 0.32–0.37 range. The compiled-in
//! defaults below exist only so the pipeline can run without a metadata
//! file; a loaded file always wins.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VadError};

/// Frequency bins per frame when no metadata file is supplied.
pub const DEFAULT_FREQUENCY_BINS: usize = 232;

/// Frames per patch when no metadata file is supplied.
pub const DEFAULT_FRAMES_IN_PATCH: usize = 43;

/// Speech probability threshold when no metadata file is supplied.
pub const DEFAULT_THRESHOLD: f32 = 0.365_623_3;

/// Patch geometry and threshold for one trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// Frequency bins per frame (and per patch column).
    pub frequency_bins: usize,
    /// Frames accumulated into one classifier input patch.
    #[serde(rename = "frames")]
    pub frames_in_patch: usize,
    /// Speech decision threshold in [0, 1]; comparison is strict `>`.
    pub threshold: f32,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            frequency_bins: DEFAULT_FREQUENCY_BINS,
            frames_in_patch: DEFAULT_FRAMES_IN_PATCH,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ModelMetadata {
    /// Load metadata from a JSON file.
    ///
    /// # Errors
    /// IO and parse failures are returned as-is; a session must not start
    /// with half-applied metadata, so callers treat this as fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| VadError::Metadata(format!("{}: {e}", path.display())))
    }

    /// Total element count of one flattened patch.
    pub fn patch_len(&self) -> usize {
        self.frames_in_patch * self.frequency_bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_field_names() {
        let raw = r#"{ "frequencyBins": 232, "frames": 43, "threshold": 0.329 }"#;
        let meta: ModelMetadata = serde_json::from_str(raw).expect("parse metadata");
        assert_eq!(meta.frequency_bins, 232);
        assert_eq!(meta.frames_in_patch, 43);
        assert!((meta.threshold - 0.329).abs() < 1e-6);
    }

    #[test]
    fn serializes_back_to_wire_names() {
        let json = serde_json::to_value(ModelMetadata::default()).expect("serialize");
        assert_eq!(json["frequencyBins"], 232);
        assert_eq!(json["frames"], 43);
        assert!(json["threshold"].is_number());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = serde_json::from_str::<ModelMetadata>(r#"{ "frames": "many" }"#);
        assert!(err.is_err());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let err = ModelMetadata::load("/nonexistent/metadata.json");
        assert!(err.is_err());
    }

    #[test]
    fn patch_len_is_product_of_geometry() {
        let meta = ModelMetadata::default();
        assert_eq!(meta.patch_len(), 232 * 43);
    }
}
