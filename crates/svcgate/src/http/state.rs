use std::sync::Arc;

use chrono::{DateTime, Utc};
use svcgate_core::config::ResponseMode;
use svcgate_core::ConversionService;

/// Shared by every handler; everything inside is read-only
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConversionService>,
    pub response: ResponseMode,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<ConversionService>, response: ResponseMode) -> Self {
        Self {
            service,
            response,
            started_at: Utc::now(),
        }
    }
}
