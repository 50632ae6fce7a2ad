use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use svcgate_core::error::OutputError;
use svcgate_core::SvcGateError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Status code plus a human-readable `detail`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<SvcGateError> for ApiError {
    fn from(err: SvcGateError) -> Self {
        let status = match &err {
            SvcGateError::Resolve(_) => StatusCode::BAD_REQUEST,
            SvcGateError::Output(OutputError::Empty | OutputError::OutsideRoot(_)) => {
                StatusCode::BAD_REQUEST
            }
            SvcGateError::Output(OutputError::CreateDir(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            SvcGateError::Inference(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            SvcGateError::Inference(_) | SvcGateError::Staging(_) | SvcGateError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.detail, "Request failed");
        } else {
            tracing::warn!(status = %self.status, detail = %self.detail, "Request rejected");
        }

        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
