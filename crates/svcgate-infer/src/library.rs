//! DiffusionSVC called as a Python library

use crate::process::run_to_completion;
use crate::{EngineKind, EngineOptions, InferenceEngine, InferenceError, InferenceJob, InferenceParams};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

const DIFFUSION_SVC_SCRIPT: &str = r#"
import json
import sys

try:
    import torch
    import librosa
    import soundfile as sf
    from tools.infer_tools import DiffusionSVC
except ImportError as e:
    print(f"Missing dependency: {e}", file=sys.stderr)
    sys.exit(1)

job = json.loads(sys.argv[1])
params = job["params"]


def or_none(value):
    return "None" if value is None else value


device = job.get("device") or ("cuda" if torch.cuda.is_available() else "cpu")
print(f"Using device: {device}", file=sys.stderr)

try:
    svc = DiffusionSVC(device=device)
    svc.load_model(
        model_path=params["model_path"],
        f0_model=or_none(params.get("pitch_extractor")),
        f0_max=or_none(params.get("f0_max")),
        f0_min=or_none(params.get("f0_min")),
    )
except Exception as e:
    print(f"Failed to load model: {e}", file=sys.stderr)
    sys.exit(2)

try:
    in_wav, in_sr = librosa.load(job["input"], sr=None)
    if len(in_wav.shape) > 1:
        in_wav = librosa.to_mono(in_wav)
except Exception as e:
    print(f"Failed to load audio: {e}", file=sys.stderr)
    sys.exit(3)

spk_mix = params.get("spk_mix")
if spk_mix is not None:
    spk_mix = {int(k) if k.lstrip("-").isdigit() else k: v for k, v in spk_mix.items()}

try:
    out_wav, out_sr = svc.infer_from_long_audio(
        in_wav,
        sr=in_sr,
        key=float(params["keychange"]),
        spk_id=int(params["speaker_id"]),
        spk_mix_dict=spk_mix,
        aug_shift=int(params["formant_shift_key"]),
        infer_speedup=int(params["speedup"]),
        method=params["method"],
        k_step=int(params["kstep"]),
        use_tqdm=False,
        spk_emb=None,
        threhold=float(params["threshold"]),
        threhold_for_split=float(params["threshold_for_split"]),
        min_len=int(params["min_len"]),
        index_ratio=float(params["index_ratio"]),
    )
except Exception as e:
    print(f"Inference failed: {e}", file=sys.stderr)
    sys.exit(4)

try:
    sf.write(job["output"], out_wav, out_sr)
    print("Conversion complete")
except Exception as e:
    print(f"Failed to save output: {e}", file=sys.stderr)
    sys.exit(5)
"#;

#[derive(Serialize)]
struct LibraryPayload<'a> {
    input: &'a Path,
    output: &'a Path,
    device: Option<&'a str>,
    params: &'a InferenceParams,
}

/// Loads DiffusionSVC through its Python API and runs long-audio inference
#[derive(Debug)]
pub struct LibraryEngine {
    options: EngineOptions,
}

impl LibraryEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub(crate) fn payload(&self, job: &InferenceJob) -> Result<String, InferenceError> {
        let payload = LibraryPayload {
            input: &job.input,
            output: &job.output,
            device: self.options.device.as_deref(),
            params: &job.params,
        };
        Ok(serde_json::to_string(&payload)?)
    }
}

#[async_trait]
impl InferenceEngine for LibraryEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Library
    }

    async fn convert(&self, job: &InferenceJob) -> Result<(), InferenceError> {
        info!(
            "Running DiffusionSVC (key={}, spk_id={}, speedup={}, method={}, kstep={})",
            job.params.keychange,
            job.params.speaker_id,
            job.params.speedup,
            job.params.method,
            job.params.kstep
        );

        let payload = self.payload(job)?;

        let mut cmd = Command::new(&self.options.python);
        cmd.current_dir(&self.options.workdir)
            .arg("-c")
            .arg(DIFFUSION_SVC_SCRIPT)
            .arg(payload);

        let result = run_to_completion(cmd, self.options.timeout, "DiffusionSVC").await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            let error = match result.status.code() {
                Some(1) => InferenceError::MissingDependencies(stderr),
                Some(2) => InferenceError::ModelLoad(stderr),
                Some(3) => InferenceError::AudioLoad(stderr),
                Some(4) => InferenceError::InferenceFailed(stderr),
                Some(5) => InferenceError::SaveFailed(stderr),
                code => InferenceError::CommandFailed { code, stderr },
            };
            return Err(error);
        }

        info!("DiffusionSVC conversion complete: {}", job.output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn payload_carries_paths_device_and_params() {
        let engine = LibraryEngine::new(EngineOptions {
            device: Some("cpu".to_string()),
            ..EngineOptions::new(PathBuf::from("python3"))
        });
        let job = InferenceJob {
            input: PathBuf::from("/tmp/svcgate-x/in.wav"),
            output: PathBuf::from("out/result.wav"),
            params: InferenceParams::with_model("models/singer.pt"),
        };

        let value: serde_json::Value = serde_json::from_str(&engine.payload(&job).unwrap()).unwrap();

        assert_eq!(value["input"], "/tmp/svcgate-x/in.wav");
        assert_eq!(value["output"], "out/result.wav");
        assert_eq!(value["device"], "cpu");
        assert_eq!(value["params"]["model_path"], "models/singer.pt");
        assert_eq!(value["params"]["method"], "dpm-solver");
        assert_eq!(value["params"]["kstep"], 200);
        assert!(value["params"]["spk_mix"].is_null());
    }
}
