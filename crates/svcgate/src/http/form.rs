//! `POST /process-audio/` multipart form

use axum::body::Bytes;
use axum::extract::Multipart;
use std::str::FromStr;
use svcgate_core::{ConversionOverrides, ConversionRequest};

use super::error::ApiError;

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Debug, Default)]
pub struct ProcessAudioForm {
    pub input_wav: Option<Upload>,
    pub output_wav: Option<String>,
    pub model_name: Option<String>,
    pub overrides: ConversionOverrides,
}

impl ProcessAudioForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), format!("Failed to read multipart: {}", e.body_text())))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "input_wav" {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::new(e.status(), format!("Failed to read input_wav: {}", e.body_text())))?;
                form.input_wav = Some(Upload { filename, data });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::new(e.status(), format!("Failed to read {}: {}", name, e.body_text())))?;

            match name.as_str() {
                "output_wav" => form.output_wav = Some(value),
                "model_name" => form.model_name = Some(value),
                "combine_model" => form.overrides.combine_model = Some(value),
                "method" => form.overrides.method = Some(value),
                "keychange" => form.overrides.keychange = parse_int(&name, &value)?,
                "speaker_id" => form.overrides.speaker_id = parse_int(&name, &value)?,
                "speedup" => form.overrides.speedup = parse_int(&name, &value)?,
                "kstep" => form.overrides.kstep = parse_int(&name, &value)?,
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    pub fn into_request(self) -> Result<ConversionRequest, ApiError> {
        let upload = self
            .input_wav
            .ok_or_else(|| ApiError::unprocessable("Field required: input_wav"))?;
        let output = self
            .output_wav
            .ok_or_else(|| ApiError::unprocessable("Field required: output_wav"))?;

        Ok(ConversionRequest {
            filename: upload.filename,
            data: Vec::from(upload.data),
            output,
            model_name: self.model_name,
            overrides: self.overrides,
        })
    }
}

/// Blank means "not supplied"
fn parse_int<T: FromStr>(field: &str, value: &str) -> Result<Option<T>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::unprocessable(format!("{} must be an integer, got {:?}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn blank_integer_is_absent() {
        assert_eq!(parse_int::<i32>("keychange", "  ").unwrap(), None);
    }

    #[test]
    fn signed_integer_parses() {
        assert_eq!(parse_int::<i32>("keychange", "-7").unwrap(), Some(-7));
    }

    #[test]
    fn non_integer_is_unprocessable() {
        let err = parse_int::<u32>("kstep", "lots").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.detail().contains("kstep"));

        assert!(parse_int::<u32>("speedup", "-1").is_err());
    }

    #[test]
    fn missing_upload_is_unprocessable() {
        let form = ProcessAudioForm {
            output_wav: Some("out.wav".to_string()),
            ..Default::default()
        };
        let err = form.into_request().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.detail().contains("input_wav"));
    }
}
