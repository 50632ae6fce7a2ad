//! DiffusionSVC called through its `main.py` command line

use crate::process::run_to_completion;
use crate::{EngineKind, EngineOptions, InferenceEngine, InferenceError, InferenceJob};
use async_trait::async_trait;
use std::ffi::OsString;
use tokio::process::Command;
use tracing::info;

/// Shells out to the toolkit's inference script
#[derive(Debug)]
pub struct CommandEngine {
    options: EngineOptions,
}

impl CommandEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Script path followed by one flag per resolved parameter
    pub fn command_args(&self, job: &InferenceJob) -> Vec<OsString> {
        let params = &job.params;
        let mut args: Vec<OsString> = vec![
            self.options.script.clone().into(),
            "-i".into(),
            job.input.clone().into(),
            "-model".into(),
            params.model_path.clone().into(),
            "-o".into(),
            job.output.clone().into(),
            "-k".into(),
            params.keychange.to_string().into(),
            "-id".into(),
            params.speaker_id.to_string().into(),
            "-speedup".into(),
            params.speedup.to_string().into(),
            "-method".into(),
            params.method.clone().into(),
            "-kstep".into(),
            params.kstep.to_string().into(),
        ];

        if let Some(ref preset) = params.preset {
            args.push("--model_name".into());
            args.push(preset.into());
        }

        args
    }
}

#[async_trait]
impl InferenceEngine for CommandEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Command
    }

    async fn convert(&self, job: &InferenceJob) -> Result<(), InferenceError> {
        info!(
            "Running {} (key={}, spk_id={}, speedup={}, method={}, kstep={})",
            self.options.script.display(),
            job.params.keychange,
            job.params.speaker_id,
            job.params.speedup,
            job.params.method,
            job.params.kstep
        );

        let mut cmd = Command::new(&self.options.python);
        cmd.current_dir(&self.options.workdir).args(self.command_args(job));

        let result = run_to_completion(cmd, self.options.timeout, "main.py").await?;

        if !result.status.success() {
            return Err(InferenceError::CommandFailed {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        info!("Conversion complete: {}", job.output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferenceParams;
    use std::path::PathBuf;

    fn job(preset: Option<&str>) -> InferenceJob {
        let mut params = InferenceParams::with_model("exp/singer/model.pt");
        params.preset = preset.map(String::from);
        params.keychange = -3.0;
        InferenceJob {
            input: PathBuf::from("/tmp/in.wav"),
            output: PathBuf::from("/tmp/out.wav"),
            params,
        }
    }

    fn as_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn flags_follow_main_py_contract() {
        let engine = CommandEngine::new(EngineOptions::new(PathBuf::from("python3")));

        let args = as_strings(engine.command_args(&job(None)));

        assert_eq!(
            args,
            vec![
                "main.py", "-i", "/tmp/in.wav", "-model", "exp/singer/model.pt", "-o",
                "/tmp/out.wav", "-k", "-3", "-id", "1", "-speedup", "10", "-method",
                "dpm-solver", "-kstep", "200",
            ]
        );
    }

    #[test]
    fn fractional_key_is_passed_through() {
        let engine = CommandEngine::new(EngineOptions::new(PathBuf::from("python3")));
        let mut job = job(None);
        job.params.keychange = 0.5;

        let args = as_strings(engine.command_args(&job));

        let k = args.iter().position(|a| a == "-k").unwrap();
        assert_eq!(args[k + 1], "0.5");
    }

    #[test]
    fn preset_name_is_appended() {
        let engine = CommandEngine::new(EngineOptions::new(PathBuf::from("python3")));

        let args = as_strings(engine.command_args(&job(Some("singerA"))));

        assert_eq!(&args[args.len() - 2..], ["--model_name", "singerA"]);
    }
}
