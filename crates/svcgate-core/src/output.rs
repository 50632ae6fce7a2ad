//! Output path preparation

use crate::error::OutputError;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Decides where a requested `output_wav` lands
#[derive(Debug, Clone, Default)]
pub struct OutputPolicy {
    root: Option<PathBuf>,
}

impl OutputPolicy {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn resolve(&self, requested: &str) -> Result<PathBuf, OutputError> {
        if requested.trim().is_empty() {
            return Err(OutputError::Empty);
        }

        let requested = Path::new(requested);
        let Some(ref root) = self.root else {
            return Ok(requested.to_path_buf());
        };

        let escapes = requested
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(OutputError::OutsideRoot(requested.to_path_buf()));
        }

        Ok(root.join(requested))
    }

    /// Resolve the path and create its parent directories
    pub async fn prepare(&self, requested: &str) -> Result<PathBuf, OutputError> {
        let path = self.resolve(requested)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(OutputError::CreateDir)?;
            debug!("Output directory ready: {}", parent.display());
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_root_paths_pass_through() {
        let policy = OutputPolicy::default();
        assert_eq!(policy.resolve("/srv/out/a.wav").unwrap(), PathBuf::from("/srv/out/a.wav"));
        assert_eq!(policy.resolve("../a.wav").unwrap(), PathBuf::from("../a.wav"));
    }

    #[test]
    fn with_root_relative_paths_are_joined() {
        let policy = OutputPolicy::new(Some(PathBuf::from("/srv/out")));
        assert_eq!(
            policy.resolve("singerA/take1.wav").unwrap(),
            PathBuf::from("/srv/out/singerA/take1.wav")
        );
    }

    #[test]
    fn with_root_escaping_paths_are_rejected() {
        let policy = OutputPolicy::new(Some(PathBuf::from("/srv/out")));
        assert!(matches!(policy.resolve("../etc/x.wav"), Err(OutputError::OutsideRoot(_))));
        assert!(matches!(policy.resolve("/tmp/x.wav"), Err(OutputError::OutsideRoot(_))));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(OutputPolicy::default().resolve("  "), Err(OutputError::Empty)));
    }

    #[tokio::test]
    async fn prepare_creates_missing_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let requested = dir.path().join("a/b/c/out.wav");

        let path = OutputPolicy::default()
            .prepare(requested.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(path, requested);
        assert!(dir.path().join("a/b/c").is_dir());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn prepare_reports_blocked_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocker"), b"file").unwrap();
        let requested = dir.path().join("blocker/out.wav");

        let err = OutputPolicy::default()
            .prepare(requested.to_str().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, OutputError::CreateDir(_)));
        assert!(err.to_string().starts_with("Failed to create output directory:"));
    }
}
