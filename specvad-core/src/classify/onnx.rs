//! ONNX classifier backend via the `ort` crate.
//!
//! Runs a single-input / single-output convolutional classifier exported to
//! ONNX:
//!
//! | Name     | Shape            | DType | Direction |
//! |----------|------------------|-------|-----------|
//! | `input`  | `[1, T, F, 1]`   | f32   | in        |
//! | `output` | `[1, 1]`         | f32   | out       |
//!
//! where `T` is `frames_in_patch` and `F` is `frequency_bins` from the model
//! metadata. The output is a sigmoid speech probability. Tensor names are
//! resolved tolerantly because exporters disagree on them.

use std::path::Path;

use ndarray::Array4;
use ort::session::builder::SessionBuilder;
use ort::session::SessionInputValue;
use ort::value::Value;
use tracing::info;

use crate::classify::SpeechClassifier;
use crate::error::{Result, VadError};

pub struct OnnxClassifier {
    session: ort::session::Session,
    input_name: String,
    output_name: String,
    frames_in_patch: usize,
    frequency_bins: usize,
}

impl OnnxClassifier {
    /// Load the classifier from `path` for the given patch geometry.
    pub fn new(
        path: impl AsRef<Path>,
        frames_in_patch: usize,
        frequency_bins: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VadError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / 1_048_576.0)
            .unwrap_or(0.0);

        let session = SessionBuilder::new()
            .map_err(|e| VadError::OnnxSession(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| VadError::OnnxSession(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();

        info!("=== OnnxClassifier Startup Report ===");
        info!("  path: {:?}", path);
        info!("  size: {:.2} MB", size_mb);
        info!("  patch: [1, {}, {}, 1]", frames_in_patch, frequency_bins);
        info!("  inputs: {:?}", input_names);
        info!("  outputs: {:?}", output_names);

        let input_name = resolve_name(&input_names, &["input", "patch", "x"])
            .or_else(|| input_names.first().cloned())
            .ok_or_else(|| VadError::OnnxSession("classifier model has no inputs".into()))?;
        let output_name = resolve_name(&output_names, &["output", "prob", "speech_prob"])
            .or_else(|| output_names.first().cloned())
            .ok_or_else(|| VadError::OnnxSession("classifier model has no outputs".into()))?;

        info!("=== OnnxClassifier ready ===");

        Ok(Self {
            session,
            input_name,
            output_name,
            frames_in_patch,
            frequency_bins,
        })
    }
}

fn resolve_name(candidates: &[String], preferred: &[&str]) -> Option<String> {
    preferred.iter().find_map(|needle| {
        candidates
            .iter()
            .find(|name| name.eq_ignore_ascii_case(needle))
            .cloned()
    })
}

impl SpeechClassifier for OnnxClassifier {
    fn warm_up(&mut self) -> Result<()> {
        let dummy = Array4::<f32>::zeros((1, self.frames_in_patch, self.frequency_bins, 1));
        let _ = self.predict(&dummy)?;
        info!("classifier warm-up inference complete");
        Ok(())
    }

    fn predict(&mut self, input: &Array4<f32>) -> Result<f32> {
        let expected = [1, self.frames_in_patch, self.frequency_bins, 1];
        if input.shape() != expected {
            return Err(VadError::Inference(format!(
                "input shape {:?} does not match model geometry {:?}",
                input.shape(),
                expected
            )));
        }

        let input_val = Value::from_array(input.clone())
            .map_err(|e: ort::Error| VadError::OnnxSession(e.to_string()))?;
        let input_values: Vec<(String, SessionInputValue<'_>)> =
            vec![(self.input_name.clone(), input_val.into())];

        let outputs = self
            .session
            .run(input_values)
            .map_err(|e| VadError::OnnxSession(e.to_string()))?;

        let prob_output = outputs
            .get(self.output_name.as_str())
            .unwrap_or(&outputs[0]);
        let (_, prob_data) = prob_output
            .try_extract_tensor::<f32>()
            .map_err(|e| VadError::OnnxSession(e.to_string()))?;

        let prob = prob_data.first().copied().unwrap_or(0.0);
        Ok(prob.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_reports_its_path() {
        let err = OnnxClassifier::new("/nonexistent/model.onnx", 43, 232).unwrap_err();
        match err {
            VadError::ModelNotFound { path } => {
                assert!(path.ends_with("model.onnx"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_name_is_case_insensitive_and_ordered() {
        let names = vec!["Output".to_string(), "logits".to_string()];
        assert_eq!(
            resolve_name(&names, &["output", "logits"]),
            Some("Output".to_string())
        );
        assert_eq!(resolve_name(&names, &["prob"]), None);
    }
}
