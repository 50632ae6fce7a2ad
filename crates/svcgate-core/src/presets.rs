//! Named model presets loaded from the JSON catalog

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use svcgate_infer::{InferenceParams, SpeakerMix};
use tracing::{info, warn};

/// One entry of the `models` mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    pub model_path: PathBuf,
    #[serde(default = "default_keychange", deserialize_with = "loose_keychange")]
    pub keychange: f64,
    #[serde(default = "default_spk_id", deserialize_with = "loose_spk_id")]
    pub spk_id: i64,
    #[serde(default = "default_speedup", deserialize_with = "loose_speedup")]
    pub speedup: u32,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_kstep", deserialize_with = "loose_kstep")]
    pub kstep: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub pitch_extractor: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub f0_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub f0_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::speaker_mix")]
    pub spk_mix_dict: Option<SpeakerMix>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub formant_shift_key: Option<i32>,
    #[serde(default, rename = "threhold", deserialize_with = "lenient::number")]
    pub threshold: Option<f64>,
    #[serde(default, rename = "threhold_for_split", deserialize_with = "lenient::number")]
    pub threshold_for_split: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub min_len: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub index_ratio: Option<f64>,
}

fn default_keychange() -> f64 {
    InferenceParams::DEFAULT_KEYCHANGE
}

fn default_spk_id() -> i64 {
    InferenceParams::DEFAULT_SPEAKER_ID
}

fn default_speedup() -> u32 {
    InferenceParams::DEFAULT_SPEEDUP
}

fn default_method() -> String {
    InferenceParams::DEFAULT_METHOD.to_string()
}

fn default_kstep() -> u32 {
    InferenceParams::DEFAULT_KSTEP
}

// Required fields: a present-but-`None` value falls back to the default too.

fn loose_keychange<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient::number(deserializer)?.unwrap_or_else(default_keychange))
}

fn loose_spk_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(lenient::integer(deserializer)?.unwrap_or_else(default_spk_id))
}

fn loose_speedup<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient::integer(deserializer)?.unwrap_or_else(default_speedup))
}

fn loose_kstep<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient::integer(deserializer)?.unwrap_or_else(default_kstep))
}

impl ModelPreset {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            keychange: default_keychange(),
            spk_id: default_spk_id(),
            speedup: default_speedup(),
            method: default_method(),
            kstep: default_kstep(),
            pitch_extractor: None,
            f0_min: None,
            f0_max: None,
            spk_mix_dict: None,
            formant_shift_key: None,
            threshold: None,
            threshold_for_split: None,
            min_len: None,
            index_ratio: None,
        }
    }
}

/// Read-only preset lookup, built once at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetCatalog {
    #[serde(default)]
    models: BTreeMap<String, ModelPreset>,
}

impl PresetCatalog {
    pub fn from_presets<I, S>(presets: I) -> Self
    where
        I: IntoIterator<Item = (S, ModelPreset)>,
        S: Into<String>,
    {
        Self {
            models: presets.into_iter().map(|(name, p)| (name.into(), p)).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the catalog; a missing file yields an empty catalog
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "Preset file {} not found; only requests with combine_model will be accepted",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::PresetFile {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_json(&content).map_err(|source| ConfigError::PresetParse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} model preset(s) from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&ModelPreset> {
        self.models.get(name)
    }

    /// Preset names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Preset values arrive as whatever the catalog author typed: numbers,
/// numeric strings, `null`, or the Python literal `"None"`.
mod lenient {
    use super::SpeakerMix;
    use regex::Regex;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;
    use std::sync::LazyLock;

    /// One `key: weight` pair of a Python dict literal
    static MIX_ENTRY: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
        Regex::new(
            r#"^\s*(?:'([^']*)'|"([^"]*)"|(-?\d+))\s*:\s*(-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$"#,
        )
    });

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MixRepr {
        Table(BTreeMap<String, f64>),
        Literal(String),
    }

    fn is_none_literal(s: &str) -> bool {
        let s = s.trim();
        s.is_empty() || s == "None"
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !is_none_literal(s)))
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Loose>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Loose::Number(n)) => Ok(Some(n)),
            Some(Loose::Text(s)) if is_none_literal(&s) => Ok(None),
            Some(Loose::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got {:?}", s))),
        }
    }

    pub fn integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        match number(deserializer)? {
            None => Ok(None),
            Some(v) if v.fract() == 0.0 => T::try_from(v as i64)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("{} is out of range", v))),
            Some(v) => Err(D::Error::custom(format!("expected an integer, got {}", v))),
        }
    }

    pub fn speaker_mix<'de, D>(deserializer: D) -> Result<Option<SpeakerMix>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<MixRepr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(MixRepr::Table(table)) if table.is_empty() => Ok(None),
            Some(MixRepr::Table(table)) => Ok(Some(SpeakerMix(table))),
            Some(MixRepr::Literal(s)) => parse_speaker_mix(&s).map_err(D::Error::custom),
        }
    }

    /// Parse a Python dict literal such as `{1: 0.5, '2': 0.5}`
    pub(super) fn parse_speaker_mix(literal: &str) -> Result<Option<SpeakerMix>, String> {
        let literal = literal.trim();
        if is_none_literal(literal) {
            return Ok(None);
        }

        let inner = literal
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| format!("spk_mix_dict is not a dict literal: {}", literal))?;

        let entry = MIX_ENTRY.as_ref().map_err(|e| e.to_string())?;

        let mut table = BTreeMap::new();
        for part in inner.split(',').filter(|p| !p.trim().is_empty()) {
            let caps = entry
                .captures(part)
                .ok_or_else(|| format!("invalid spk_mix_dict entry: {}", part.trim()))?;
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let weight: f64 = caps[4]
                .parse()
                .map_err(|_| format!("invalid weight in spk_mix_dict: {}", &caps[4]))?;
            table.insert(key, weight);
        }

        if table.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SpeakerMix(table)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "models": {
            "singerA": {
                "model_path": "exp/singerA/model_100000.pt",
                "keychange": 0,
                "spk_id": 1,
                "speedup": 10,
                "method": "dpm-solver",
                "kstep": 200,
                "pitch_extractor": "rmvpe",
                "f0_min": 40,
                "f0_max": "1200",
                "spk_mix_dict": "{1: 0.7, '2': 0.3}",
                "formant_shift_key": "2",
                "threhold": -60,
                "threhold_for_split": "-40.5",
                "min_len": 5000,
                "index_ratio": 0
            },
            "bare": { "model_path": "exp/bare.pt", "f0_min": "None", "spk_mix_dict": "None" }
        },
        "method": "ignored top-level key"
    }"#;

    #[test]
    fn full_preset_is_parsed() {
        let catalog = PresetCatalog::from_json(CATALOG).unwrap();
        let preset = catalog.get("singerA").unwrap();

        assert_eq!(preset.model_path, PathBuf::from("exp/singerA/model_100000.pt"));
        assert_eq!(preset.pitch_extractor.as_deref(), Some("rmvpe"));
        assert_eq!(preset.f0_min, Some(40.0));
        assert_eq!(preset.f0_max, Some(1200.0));
        assert_eq!(preset.formant_shift_key, Some(2));
        assert_eq!(preset.threshold, Some(-60.0));
        assert_eq!(preset.threshold_for_split, Some(-40.5));
        assert_eq!(preset.min_len, Some(5000));

        let mix = preset.spk_mix_dict.as_ref().unwrap();
        assert_eq!(mix.0.get("1"), Some(&0.7));
        assert_eq!(mix.0.get("2"), Some(&0.3));
    }

    #[test]
    fn missing_fields_fall_back_to_literal_defaults() {
        let catalog = PresetCatalog::from_json(CATALOG).unwrap();
        let preset = catalog.get("bare").unwrap();

        assert_eq!(preset, &ModelPreset::new("exp/bare.pt"));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["bare", "singerA"]);
    }

    #[test]
    fn json_object_speaker_mix_is_accepted() {
        let json = r#"{"models": {"duet": {"model_path": "m.pt", "spk_mix_dict": {"1": 0.5, "3": 0.5}}}}"#;
        let catalog = PresetCatalog::from_json(json).unwrap();
        let mix = catalog.get("duet").unwrap().spk_mix_dict.as_ref().unwrap();
        assert_eq!(mix.0.len(), 2);
    }

    #[test]
    fn malformed_speaker_mix_literal_is_rejected() {
        let json = r#"{"models": {"bad": {"model_path": "m.pt", "spk_mix_dict": "[1, 2]"}}}"#;
        assert!(PresetCatalog::from_json(json).is_err());

        assert!(lenient::parse_speaker_mix("{1: loud}").is_err());
        assert_eq!(lenient::parse_speaker_mix("{}").unwrap(), None);
    }

    #[test]
    fn required_numbers_accept_strings_and_fractional_keys() {
        let json = r#"{"models": {
            "quoted": {"model_path": "m.pt", "keychange": "5", "spk_id": "2", "speedup": "20", "kstep": "100"},
            "half": {"model_path": "m.pt", "keychange": 0.5, "kstep": "None"}
        }}"#;
        let catalog = PresetCatalog::from_json(json).unwrap();

        let quoted = catalog.get("quoted").unwrap();
        assert_eq!(quoted.keychange, 5.0);
        assert_eq!(quoted.spk_id, 2);
        assert_eq!(quoted.speedup, 20);
        assert_eq!(quoted.kstep, 100);

        let half = catalog.get("half").unwrap();
        assert_eq!(half.keychange, 0.5);
        assert_eq!(half.kstep, 200);
    }

    #[test]
    fn fractional_step_count_is_rejected() {
        let json = r#"{"models": {"bad": {"model_path": "m.pt", "kstep": 12.5}}}"#;
        assert!(PresetCatalog::from_json(json).is_err());
    }

    #[test]
    fn fractional_integer_field_is_rejected() {
        let json = r#"{"models": {"bad": {"model_path": "m.pt", "min_len": 1.5}}}"#;
        assert!(PresetCatalog::from_json(json).is_err());
    }

    #[test]
    fn missing_model_path_is_rejected() {
        let json = r#"{"models": {"bad": {"keychange": 3}}}"#;
        assert!(PresetCatalog::from_json(json).is_err());
    }

    #[test]
    fn missing_file_yields_empty_catalog() {
        let catalog = PresetCatalog::load(Path::new("/nonexistent/config.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn unreadable_json_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PresetCatalog::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::PresetParse { .. }));
        assert!(err.to_string().contains("config.json"));
    }
}
