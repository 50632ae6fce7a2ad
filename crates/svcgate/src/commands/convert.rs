use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::args::ConvertArgs;
use svcgate_core::{Config, ConversionOverrides, ConversionRequest, ConversionService};

pub async fn run(args: &ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let service = ConversionService::from_config(&config)?;

    let data = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let filename = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let request = ConversionRequest {
        filename,
        data,
        output: args.output.to_string_lossy().into_owned(),
        model_name: args.model_name.clone(),
        overrides: ConversionOverrides {
            combine_model: args.combine_model.clone(),
            keychange: args.keychange,
            speaker_id: args.speaker_id,
            speedup: args.speedup,
            method: args.method.clone(),
            kstep: args.kstep,
        },
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")?
            .tick_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!(
        "Converting {} ({} engine)...",
        args.input.display(),
        service.engine_kind()
    ));

    match service.convert(request).await {
        Ok(output) => {
            pb.finish_with_message(format!("Done: {}", output.display()));
            println!("\nOutput: {}", output.display());
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message(format!("Failed: {}", e));
            Err(e.into())
        }
    }
}
