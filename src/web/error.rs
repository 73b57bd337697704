use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{dispersion::DispersionError, environment::FeedError, export::ExportError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Dispersion(#[from] DispersionError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("CSV export failed: {0}")]
    Export(#[from] ExportError),
    #[error("CSV export failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Dispersion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Feed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
