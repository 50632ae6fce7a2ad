//! DiffusionSVC inference bridge for svcgate
//!
//! Two ways of reaching the external toolkit:
//! - Library: an inline Python program driving `tools.infer_tools.DiffusionSVC`
//! - Command: the toolkit's own `main.py` command line

mod command;
mod error;
mod job;
mod library;
mod process;

pub use command::CommandEngine;
pub use error::InferenceError;
pub use job::{InferenceJob, InferenceParams, SpeakerMix};
pub use library::LibraryEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Inference strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Python API of DiffusionSVC
    Library,
    /// `main.py` subprocess
    Command,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Library => write!(f, "library"),
            EngineKind::Command => write!(f, "command"),
        }
    }
}

/// Where and how to launch the toolkit
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub python: PathBuf,
    /// DiffusionSVC checkout; the child runs with this as its working directory
    pub workdir: PathBuf,
    /// Inference script, relative to `workdir`
    pub script: PathBuf,
    /// Compute device override ("cuda", "cpu", ...)
    pub device: Option<String>,
    pub timeout: Option<Duration>,
}

impl EngineOptions {
    pub fn new(python: PathBuf) -> Self {
        Self {
            python,
            workdir: PathBuf::from("."),
            script: PathBuf::from("main.py"),
            device: None,
            timeout: None,
        }
    }
}

/// Something that turns a staged input into converted audio at `job.output`
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    async fn convert(&self, job: &InferenceJob) -> Result<(), InferenceError>;
}

/// Build the engine selected at startup
pub fn build_engine(kind: EngineKind, options: EngineOptions) -> Arc<dyn InferenceEngine> {
    match kind {
        EngineKind::Library => Arc::new(LibraryEngine::new(options)),
        EngineKind::Command => Arc::new(CommandEngine::new(options)),
    }
}
