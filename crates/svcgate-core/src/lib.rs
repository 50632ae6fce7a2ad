//! svcgate-core: preset resolution, staging and conversion service for svcgate

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod resolve;
pub mod staging;

pub use config::Config;
pub use error::{Result, SvcGateError};
pub use pipeline::{ConversionRequest, ConversionService};
pub use presets::{ModelPreset, PresetCatalog};
pub use resolve::ConversionOverrides;
