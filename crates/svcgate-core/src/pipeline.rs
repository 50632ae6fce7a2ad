//! Conversion orchestration: resolve, stage, prepare, infer, clean up

use crate::error::{Result, StagingError};
use crate::output::OutputPolicy;
use crate::presets::PresetCatalog;
use crate::resolve::ConversionOverrides;
use crate::staging::StagingArea;
use crate::Config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use svcgate_infer::{build_engine, EngineKind, InferenceEngine, InferenceJob, InferenceParams};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// One upload plus the parameters to convert it with
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Original filename of the upload
    pub filename: String,
    pub data: Vec<u8>,
    /// Requested destination (`output_wav`)
    pub output: String,
    pub model_name: Option<String>,
    pub overrides: ConversionOverrides,
}

/// Shared, read-only conversion front end
pub struct ConversionService {
    catalog: Arc<PresetCatalog>,
    engine: Arc<dyn InferenceEngine>,
    staging: StagingArea,
    output: OutputPolicy,
    permits: Option<Arc<Semaphore>>,
}

impl ConversionService {
    pub fn new(
        catalog: Arc<PresetCatalog>,
        engine: Arc<dyn InferenceEngine>,
        staging: StagingArea,
    ) -> Self {
        Self {
            catalog,
            engine,
            staging,
            output: OutputPolicy::default(),
            permits: None,
        }
    }

    pub fn with_output_policy(mut self, output: OutputPolicy) -> Self {
        self.output = output;
        self
    }

    /// Bound the number of engine runs in flight
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// Load presets and build the configured engine
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = PresetCatalog::load(&config.presets.path)?;
        let engine = build_engine(config.inference.engine, config.engine_options()?);
        info!("Using {} inference engine", engine.kind());

        let mut service = Self::new(Arc::new(catalog), engine, StagingArea::new(config.staging_dir()))
            .with_output_policy(OutputPolicy::new(config.output.root.clone()));
        if let Some(limit) = config.max_concurrent()? {
            service = service.with_max_concurrent(limit);
        }
        Ok(service)
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Run one conversion and return the path of the converted audio.
    ///
    /// Unknown presets fail before anything touches the filesystem. The staged
    /// input is removed on every path; a removal failure is logged and never
    /// replaces the conversion result.
    pub async fn convert(&self, request: ConversionRequest) -> Result<PathBuf> {
        let start_time = Instant::now();
        let params = self
            .catalog
            .resolve(request.model_name.as_deref(), &request.overrides)?;

        info!(
            "Converting {} -> {} (preset={}, model={})",
            request.filename,
            request.output,
            params.preset.as_deref().unwrap_or("-"),
            params.model_path.display()
        );

        let artifact = self.staging.stage(&request.filename, &request.data).await?;
        let result = self.run_staged(artifact.path(), &request.output, params).await;

        if let Err(cleanup) = artifact.remove() {
            report_cleanup_failure(&cleanup, result.is_ok());
        }

        if let Ok(ref output) = result {
            info!(
                "Conversion complete: {} ({:.1}s)",
                output.display(),
                start_time.elapsed().as_secs_f32()
            );
        }
        result
    }

    async fn run_staged(&self, input: &Path, output: &str, params: InferenceParams) -> Result<PathBuf> {
        let output = self.output.prepare(output).await?;

        let _permit = match self.permits {
            Some(ref permits) => {
                debug!("Waiting for an inference slot ({} free)", permits.available_permits());
                permits.acquire().await.ok()
            }
            None => None,
        };

        let job = InferenceJob {
            input: input.to_path_buf(),
            output: output.clone(),
            params,
        };
        self.engine.convert(&job).await?;

        Ok(output)
    }
}

fn report_cleanup_failure(err: &StagingError, conversion_succeeded: bool) {
    if conversion_succeeded {
        error!("{} (conversion itself succeeded)", err);
    } else {
        warn!("{} (after a failed conversion)", err);
    }
}
