//! Error types for the inference bridge

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing Python dependencies: {0}")]
    MissingDependencies(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Failed to load input audio: {0}")]
    AudioLoad(String),

    #[error("DiffusionSVC inference failed: {0}")]
    InferenceFailed(String),

    #[error("Failed to save output: {0}")]
    SaveFailed(String),

    #[error("Inference command exited with code {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("Inference timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Failed to encode inference parameters: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout(_))
    }
}
