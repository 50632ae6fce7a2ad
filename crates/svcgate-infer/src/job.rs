//! Fully resolved inference calls

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Speaker id -> blend weight, passed through to the model untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SpeakerMix(pub BTreeMap<String, f64>);

impl SpeakerMix {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parameters for one DiffusionSVC call after preset and override merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceParams {
    /// Preset the parameters came from, if any
    pub preset: Option<String>,
    pub model_path: PathBuf,
    /// Pitch shift in semitones
    pub keychange: f64,
    pub speaker_id: i64,
    pub speedup: u32,
    /// Sampling method, e.g. "dpm-solver"
    pub method: String,
    /// Diffusion step count
    pub kstep: u32,
    pub pitch_extractor: Option<String>,
    pub f0_min: Option<f64>,
    pub f0_max: Option<f64>,
    pub spk_mix: Option<SpeakerMix>,
    pub formant_shift_key: i32,
    pub threshold: f64,
    pub threshold_for_split: f64,
    pub min_len: u32,
    pub index_ratio: f64,
}

impl InferenceParams {
    pub const DEFAULT_KEYCHANGE: f64 = 0.0;
    pub const DEFAULT_SPEAKER_ID: i64 = 1;
    pub const DEFAULT_SPEEDUP: u32 = 10;
    pub const DEFAULT_METHOD: &'static str = "dpm-solver";
    pub const DEFAULT_KSTEP: u32 = 200;

    /// Literal defaults used when no preset is named
    pub fn with_model(model_path: impl Into<PathBuf>) -> Self {
        Self {
            preset: None,
            model_path: model_path.into(),
            keychange: Self::DEFAULT_KEYCHANGE,
            speaker_id: Self::DEFAULT_SPEAKER_ID,
            speedup: Self::DEFAULT_SPEEDUP,
            method: Self::DEFAULT_METHOD.to_string(),
            kstep: Self::DEFAULT_KSTEP,
            pitch_extractor: None,
            f0_min: None,
            f0_max: None,
            spk_mix: None,
            formant_shift_key: 0,
            threshold: 0.0,
            threshold_for_split: 0.0,
            min_len: 0,
            index_ratio: 0.0,
        }
    }
}

/// A staged input, a destination and the parameters to convert with
#[derive(Debug, Clone)]
pub struct InferenceJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: InferenceParams,
}
