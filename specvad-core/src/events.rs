//! Event types broadcast to the consuming (UI) layer.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` with camelCase
//! field names, so they can be forwarded over any JSON event bus unchanged.

use serde::{Deserialize, Serialize};

/// Emitted once per completed patch, in inference-completion order.
///
/// Inference for consecutive patches may overlap, so events can arrive out
/// of collection order; `seq` is assigned at patch completion time and lets
/// a consumer reorder if it cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationEvent {
    /// Monotonic patch index within the session.
    pub seq: u64,
    /// Session epoch the patch was collected in.
    pub session: u64,
    /// `confidence > threshold` (strict).
    pub is_speech: bool,
    /// Raw classifier probability in [0, 1].
    pub confidence: f32,
}

/// Emitted when the engine state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusEvent {
    pub status: EngineStatus,
    /// Optional human-readable detail (e.g. error message).
    pub detail: Option<String>,
}

/// Current state of the VAD engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Engine created but `start()` not yet called.
    Idle,
    /// Warming up the classifier (loading weights, dummy inference).
    WarmingUp,
    /// Actively sampling frames and classifying patches.
    Listening,
    /// Sampling stopped; the engine may be restarted.
    Stopped,
    /// Unrecoverable error; restart required.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_event_serializes_with_camel_case() {
        let event = ClassificationEvent {
            seq: 12,
            session: 3,
            is_speech: true,
            confidence: 0.74,
        };

        let json = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(json["seq"], 12);
        assert_eq!(json["session"], 3);
        assert_eq!(json["isSpeech"], true);
        let conf = json["confidence"].as_f64().expect("number");
        assert!((conf - 0.74).abs() < 1e-5);

        let round_trip: ClassificationEvent =
            serde_json::from_value(json).expect("deserialize event");
        assert_eq!(round_trip.seq, 12);
        assert!(round_trip.is_speech);
    }

    #[test]
    fn engine_status_serializes_lowercase() {
        let event = EngineStatusEvent {
            status: EngineStatus::WarmingUp,
            detail: Some("loading model".into()),
        };

        let json = serde_json::to_value(&event).expect("serialize status");
        assert_eq!(json["status"], "warmingup");
        assert_eq!(json["detail"], "loading model");

        let round_trip: EngineStatusEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(round_trip.status, EngineStatus::WarmingUp);
    }

    #[test]
    fn engine_status_rejects_non_lowercase_values() {
        assert!(serde_json::from_str::<EngineStatus>(r#""Listening""#).is_err());
    }
}
