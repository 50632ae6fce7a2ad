//! Merge per-request overrides with preset defaults

use crate::error::ResolveError;
use crate::presets::PresetCatalog;
use svcgate_infer::InferenceParams;

/// Fields a request may set to override the preset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOverrides {
    /// Model checkpoint path
    pub combine_model: Option<String>,
    pub keychange: Option<i32>,
    pub speaker_id: Option<i64>,
    pub speedup: Option<u32>,
    pub method: Option<String>,
    pub kstep: Option<u32>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl PresetCatalog {
    /// Resolve the parameters for one call.
    ///
    /// With a preset name every tunable field takes the override when one is
    /// given and the preset value otherwise. Without one, `combine_model` is
    /// required and the literal defaults fill the rest.
    pub fn resolve(
        &self,
        model_name: Option<&str>,
        overrides: &ConversionOverrides,
    ) -> Result<InferenceParams, ResolveError> {
        let model_name = model_name.filter(|s| !s.is_empty());

        let Some(name) = model_name else {
            let model_path =
                non_empty(&overrides.combine_model).ok_or(ResolveError::MissingModelPath)?;
            let mut params = InferenceParams::with_model(model_path);
            apply_overrides(&mut params, overrides);
            return Ok(params);
        };

        let preset = self
            .get(name)
            .ok_or_else(|| ResolveError::UnknownPreset(name.to_string()))?;

        let mut params = InferenceParams {
            preset: Some(name.to_string()),
            model_path: preset.model_path.clone(),
            keychange: preset.keychange,
            speaker_id: preset.spk_id,
            speedup: preset.speedup,
            method: preset.method.clone(),
            kstep: preset.kstep,
            pitch_extractor: preset.pitch_extractor.clone(),
            f0_min: preset.f0_min,
            f0_max: preset.f0_max,
            spk_mix: preset.spk_mix_dict.clone(),
            formant_shift_key: preset.formant_shift_key.unwrap_or(0),
            threshold: preset.threshold.unwrap_or(0.0),
            threshold_for_split: preset.threshold_for_split.unwrap_or(0.0),
            min_len: preset.min_len.unwrap_or(0),
            index_ratio: preset.index_ratio.unwrap_or(0.0),
        };
        apply_overrides(&mut params, overrides);
        Ok(params)
    }
}

fn apply_overrides(params: &mut InferenceParams, overrides: &ConversionOverrides) {
    if let Some(model) = non_empty(&overrides.combine_model) {
        params.model_path = model.into();
    }
    if let Some(key) = overrides.keychange {
        params.keychange = f64::from(key);
    }
    if let Some(id) = overrides.speaker_id {
        params.speaker_id = id;
    }
    if let Some(speedup) = overrides.speedup {
        params.speedup = speedup;
    }
    if let Some(method) = non_empty(&overrides.method) {
        params.method = method.to_string();
    }
    if let Some(kstep) = overrides.kstep {
        params.kstep = kstep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ModelPreset;
    use std::path::PathBuf;

    fn catalog() -> PresetCatalog {
        let mut singer = ModelPreset::new("exp/singerA/model.pt");
        singer.pitch_extractor = Some("rmvpe".to_string());
        singer.threshold = Some(-60.0);
        singer.speedup = 20;
        singer.kstep = 100;
        PresetCatalog::from_presets([("singerA", singer)])
    }

    #[test]
    fn override_wins_over_preset() {
        let overrides = ConversionOverrides {
            keychange: Some(5),
            ..Default::default()
        };

        let params = catalog().resolve(Some("singerA"), &overrides).unwrap();

        assert_eq!(params.keychange, 5.0);
        assert_eq!(params.speaker_id, 1);
        assert_eq!(params.speedup, 20);
        assert_eq!(params.method, "dpm-solver");
        assert_eq!(params.kstep, 100);
        assert_eq!(params.model_path, PathBuf::from("exp/singerA/model.pt"));
        assert_eq!(params.preset.as_deref(), Some("singerA"));
    }

    #[test]
    fn omitted_overrides_take_preset_values() {
        let params = catalog()
            .resolve(Some("singerA"), &ConversionOverrides::default())
            .unwrap();

        assert_eq!(params.speedup, 20);
        assert_eq!(params.kstep, 100);
        assert_eq!(params.pitch_extractor.as_deref(), Some("rmvpe"));
        assert_eq!(params.threshold, -60.0);
        assert_eq!(params.min_len, 0);
    }

    #[test]
    fn every_tunable_field_can_be_overridden() {
        let overrides = ConversionOverrides {
            combine_model: Some("exp/other.pt".to_string()),
            keychange: Some(-12),
            speaker_id: Some(4),
            speedup: Some(5),
            method: Some("unipc".to_string()),
            kstep: Some(50),
        };

        let params = catalog().resolve(Some("singerA"), &overrides).unwrap();

        assert_eq!(params.model_path, PathBuf::from("exp/other.pt"));
        assert_eq!(params.keychange, -12.0);
        assert_eq!(params.speaker_id, 4);
        assert_eq!(params.speedup, 5);
        assert_eq!(params.method, "unipc");
        assert_eq!(params.kstep, 50);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let overrides = ConversionOverrides {
            combine_model: Some(String::new()),
            method: Some(String::new()),
            ..Default::default()
        };

        let params = catalog().resolve(Some("singerA"), &overrides).unwrap();

        assert_eq!(params.model_path, PathBuf::from("exp/singerA/model.pt"));
        assert_eq!(params.method, "dpm-solver");
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = catalog()
            .resolve(Some("nobody"), &ConversionOverrides::default())
            .unwrap_err();

        assert!(matches!(err, ResolveError::UnknownPreset(ref name) if name == "nobody"));
        assert_eq!(err.to_string(), "Model nobody not found in configuration.");
    }

    #[test]
    fn without_preset_model_path_is_required() {
        let err = catalog()
            .resolve(None, &ConversionOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingModelPath));
    }

    #[test]
    fn without_preset_literal_defaults_apply() {
        let overrides = ConversionOverrides {
            combine_model: Some("exp/direct.pt".to_string()),
            kstep: Some(120),
            ..Default::default()
        };

        let params = PresetCatalog::default().resolve(None, &overrides).unwrap();

        assert_eq!(params.preset, None);
        assert_eq!(params.model_path, PathBuf::from("exp/direct.pt"));
        assert_eq!(params.keychange, 0.0);
        assert_eq!(params.speaker_id, 1);
        assert_eq!(params.speedup, 10);
        assert_eq!(params.method, "dpm-solver");
        assert_eq!(params.kstep, 120);
    }
}
