use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Failed to read the uploaded file: {0}")]
    FileRead(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),
    #[error("Chart error: {0}")]
    Chart(String),
    #[error("Report error: {0}")]
    Report(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileRead(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_)
            | AppError::DataFrame(_)
            | AppError::Chart(_)
            | AppError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_maps_to_415() {
        let err = AppError::UnsupportedFileType("notes.txt".to_string());
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.to_string(), "Unsupported file type: notes.txt");
    }

    #[test]
    fn read_failures_are_client_errors() {
        let err = AppError::FileRead("truncated workbook".to_string());
        assert!(err.status().is_client_error());
    }
}
