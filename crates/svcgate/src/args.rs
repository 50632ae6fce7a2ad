use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "svcgate")]
#[command(author, version, about = "HTTP gateway for diffusion-based singing voice conversion")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve POST /process-audio/ (default)
    Serve(ServeArgs),

    /// Convert a single file without starting the server
    Convert(ConvertArgs),

    /// Check Python, DiffusionSVC and the preset catalog
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(clap::Args, Clone)]
pub struct ConvertArgs {
    /// Input audio file
    pub input: PathBuf,

    /// Where to write the converted audio
    #[arg(short, long)]
    pub output: PathBuf,

    /// Preset from the catalog
    #[arg(short, long)]
    pub model_name: Option<String>,

    /// Model checkpoint (required without --model-name)
    #[arg(long)]
    pub combine_model: Option<String>,

    /// Pitch shift in semitones
    #[arg(short, long, allow_hyphen_values = true)]
    pub keychange: Option<i32>,

    /// Speaker id
    #[arg(long)]
    pub speaker_id: Option<i64>,

    /// Sampling speedup factor
    #[arg(long)]
    pub speedup: Option<u32>,

    /// Sampling method (e.g. dpm-solver)
    #[arg(long)]
    pub method: Option<String>,

    /// Diffusion step count
    #[arg(long)]
    pub kstep: Option<u32>,
}
