//! Configuration management for svcgate

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use svcgate_infer::{EngineKind, EngineOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub presets: PresetsConfig,
    pub inference: InferenceConfig,
    pub staging: StagingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// What a successful conversion returns
    pub response: ResponseMode,
    /// Upper bound on the multipart request body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Stream the converted audio back
    File,
    /// Acknowledge with the output path
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsConfig {
    /// JSON document with a `models` mapping
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub engine: EngineKind,
    /// Python interpreter (auto-detected if not set)
    pub python: Option<PathBuf>,
    /// DiffusionSVC checkout
    pub workdir: PathBuf,
    /// Command-line entry point, relative to `workdir`
    pub script: PathBuf,
    /// Compute device; CUDA when available, else CPU, if not set
    pub device: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Simultaneous inference runs (unbounded if not set)
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Custom temp directory (uses system temp if not set)
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Confine `output_wav` under this directory (any path accepted if not set)
    pub root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                response: ResponseMode::File,
                max_upload_bytes: 100 * 1024 * 1024,
            },
            presets: PresetsConfig {
                path: PathBuf::from("config.json"),
            },
            inference: InferenceConfig {
                engine: EngineKind::Library,
                python: None,
                workdir: PathBuf::from("."),
                script: PathBuf::from("main.py"),
                device: None,
                timeout_secs: Some(1800),
                max_concurrent: None,
            },
            staging: StagingConfig { directory: None },
            output: OutputConfig { root: None },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(config_dir) = dirs::config_dir() {
            let default_config = config_dir.join("svcgate/config.toml");
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // SVCGATE_INFERENCE__TIMEOUT_SECS=600
        figment = figment.merge(Env::prefixed("SVCGATE_").split("__"));

        figment.extract().map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Get Python path, preferring a venv inside the toolkit checkout
    pub fn python_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.inference.python {
            return Ok(path.clone());
        }

        let workdir = &self.inference.workdir;
        let venv_paths = [
            Some(workdir.join("venv/bin/python")),
            Some(workdir.join(".venv/bin/python")),
            dirs::data_dir().map(|d| d.join("svcgate/venv/bin/python")),
        ];

        for path in venv_paths.into_iter().flatten() {
            if path.exists() {
                return Ok(path);
            }
        }

        // Fall back to system Python
        which::which("python3")
            .map_err(|_| ConfigError::InvalidValue("python3 not found in PATH".to_string()))
    }

    /// Launch options for the configured engine
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        if self.inference.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "inference.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(EngineOptions {
            python: self.python_path()?,
            workdir: self.inference.workdir.clone(),
            script: self.inference.script.clone(),
            device: self.inference.device.clone(),
            timeout: self.inference.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Engine slot limit; zero would block every request
    pub fn max_concurrent(&self) -> Result<Option<usize>, ConfigError> {
        match self.inference.max_concurrent {
            Some(0) => Err(ConfigError::InvalidValue(
                "inference.max_concurrent must be greater than zero".to_string(),
            )),
            limit => Ok(limit),
        }
    }

    /// Get staging directory
    pub fn staging_dir(&self) -> PathBuf {
        self.staging.directory.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.response, ResponseMode::File);
        assert_eq!(config.inference.engine, EngineKind::Library);
        assert_eq!(config.inference.timeout_secs, Some(1800));
        assert_eq!(config.presets.path, PathBuf::from("config.json"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("svcgate.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100
response = "json"

[inference]
engine = "command"
python = "/opt/svc/bin/python"
max_concurrent = 2
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.response, ResponseMode::Json);
        assert_eq!(config.inference.engine, EngineKind::Command);
        assert_eq!(config.inference.max_concurrent, Some(2));
        assert_eq!(config.python_path().unwrap(), PathBuf::from("/opt/svc/bin/python"));
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/svcgate.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.inference.python = Some(PathBuf::from("python3"));
        config.inference.timeout_secs = Some(0);
        assert!(config.engine_options().is_err());
    }

    #[test]
    fn zero_max_concurrent_is_rejected() {
        let mut config = Config::default();
        config.inference.max_concurrent = Some(0);
        assert!(matches!(config.max_concurrent(), Err(ConfigError::InvalidValue(_))));

        config.inference.max_concurrent = Some(3);
        assert_eq!(config.max_concurrent().unwrap(), Some(3));

        config.inference.max_concurrent = None;
        assert_eq!(config.max_concurrent().unwrap(), None);
    }
}
