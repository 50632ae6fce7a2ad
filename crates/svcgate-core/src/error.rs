//! Error types for svcgate-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SvcGateError>;

#[derive(Error, Debug)]
pub enum SvcGateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Processing failed: {0}")]
    Inference(#[from] svcgate_infer::InferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Model {0} not found in configuration.")]
    UnknownPreset(String),

    #[error("combine_model is required when model_name is not provided")]
    MissingModelPath,
}

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Failed to save input file: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to clean up temporary files: {0}")]
    Cleanup(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("output_wav must not be empty")]
    Empty,

    #[error("Output path {} is outside the output root", .0.display())]
    OutsideRoot(PathBuf),

    #[error("Failed to create output directory: {0}")]
    CreateDir(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Failed to read presets from {}: {source}", path.display())]
    PresetFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid presets in {}: {source}", path.display())]
    PresetParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
