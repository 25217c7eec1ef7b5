use thiserror::Error;

/// All errors produced by specvad-core.
#[derive(Debug, Error)]
pub enum VadError {
    #[error("frame source error: {0}")]
    FrameSource(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("frame has {actual} bins, expected {expected}")]
    FrameLength { expected: usize, actual: usize },

    #[error("patch shape error: {0}")]
    PatchShape(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VadError>;
