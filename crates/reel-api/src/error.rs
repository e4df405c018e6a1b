//! API error types.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_media::MediaError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

static MASK_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Hide internal error details from response bodies (production).
pub fn mask_internal_errors(mask: bool) {
    MASK_INTERNAL_ERRORS.store(mask, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to download video: {0}")]
    DownloadFailed(String),

    #[error("Failed to create highlight reel: {0}")]
    RenderFailed(String),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DownloadFailed(_)
            | ApiError::RenderFailed(_)
            | ApiError::Media(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = match &self {
            ApiError::Internal(_) if MASK_INTERNAL_ERRORS.load(Ordering::Relaxed) => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::DownloadFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(MediaError::FfmpegNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_masked_when_requested() {
        async fn error_body(err: ApiError) -> String {
            let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
                .await
                .unwrap();
            String::from_utf8(bytes.to_vec()).unwrap()
        }

        mask_internal_errors(true);
        let masked = error_body(ApiError::internal("motion task panicked")).await;
        let not_found = error_body(ApiError::not_found("File not found")).await;
        mask_internal_errors(false);
        let shown = error_body(ApiError::internal("motion task panicked")).await;

        assert_eq!(masked, r#"{"error":"An internal error occurred"}"#);
        assert_eq!(not_found, r#"{"error":"File not found"}"#);
        assert_eq!(shown, r#"{"error":"Internal error: motion task panicked"}"#);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::DownloadFailed("yt-dlp failed: 404".into()).to_string(),
            "Failed to download video: yt-dlp failed: 404"
        );
        assert_eq!(ApiError::not_found("File not found").to_string(), "File not found");
    }
}
