use anomaly_checker::CheckError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model failed to generate code.")]
    GenerationFailed,

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Could not load trial balance: {0}")]
    Workbook(String),

    #[error("{0}")]
    MalformedData(#[from] CheckError),

    #[error("An internal server error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MalformedData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::GenerationFailed
            | ApiError::Execution(_)
            | ApiError::Workbook(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
