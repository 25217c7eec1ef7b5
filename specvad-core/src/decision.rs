//! Threshold decision: classifier probability → speech/non-speech.

use serde::{Deserialize, Serialize};

/// Decision for one classified patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// `confidence > threshold` (strict).
    pub is_speech: bool,
    /// Raw classifier probability in [0, 1].
    pub confidence: f32,
}

/// Threshold a classifier probability.
///
/// The comparison is strict `>`: a probability exactly equal to the
/// threshold is classified non-speech. Pure and stateless, safe from any
/// context.
pub fn decide(probability: f32, threshold: f32) -> ClassificationResult {
    ClassificationResult {
        is_speech: probability > threshold,
        confidence: probability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_equal_to_threshold_is_not_speech() {
        let result = decide(0.5, 0.5);
        assert!(!result.is_speech);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn probability_just_above_threshold_is_speech() {
        assert!(decide(0.50001, 0.5).is_speech);
    }

    #[test]
    fn probability_below_threshold_is_not_speech() {
        assert!(!decide(0.1, 0.5).is_speech);
    }

    #[test]
    fn confidence_passes_through_unchanged() {
        assert_eq!(decide(0.937, 0.3).confidence, 0.937);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(decide(0.8, 0.5)).expect("serialize");
        assert_eq!(json["isSpeech"], true);
        assert!(json["confidence"].is_number());
    }
}
