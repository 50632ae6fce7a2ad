//! HTTP surface: `POST /process-audio/` plus health and preset listing

mod error;
mod form;
mod handlers;
mod request_id;
mod state;

pub use error::ApiError;
pub use handlers::{HealthResponse, PresetList, ProcessComplete};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/process-audio/", post(handlers::process_audio))
        .route("/process-audio", post(handlers::process_audio))
        .route("/health", get(handlers::health))
        .route("/presets", get(handlers::list_presets))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
