mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "svcgate=info,svcgate_core=info,svcgate_infer=info,tower_http=info",
        1 => "svcgate=debug,svcgate_core=debug,svcgate_infer=debug,tower_http=debug",
        2 => "svcgate=trace,svcgate_core=trace,svcgate_infer=trace,tower_http=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Serve(serve)) => commands::serve::run(&serve, config_path).await,
        Some(Commands::Convert(convert)) => commands::convert::run(&convert, config_path).await,
        Some(Commands::Doctor) => commands::doctor::run(config_path).await,
        Some(Commands::Config) => commands::config::run(config_path).await,
        None => commands::serve::run(&args::ServeArgs::default(), config_path).await,
    }
}
