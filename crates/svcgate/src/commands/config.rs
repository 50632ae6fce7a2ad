use anyhow::Result;
use std::path::Path;
use svcgate_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("svcgate configuration\n");
    println!("{}", toml::to_string_pretty(&config)?);

    match config.python_path() {
        Ok(p) => println!("# python resolves to {}", p.display()),
        Err(e) => println!("# python: {}", e),
    }
    println!("# staging directory resolves to {}", config.staging_dir().display());

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    println!("  1. Environment variables (SVCGATE_*, nested keys split on `__`)");
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    if let Some(config_dir) = dirs::config_dir() {
        println!("  3. {}/svcgate/config.toml", config_dir.display());
    }
    println!("\nPresets: {}", config.presets.path.display());

    Ok(())
}
