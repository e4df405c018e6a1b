//! Highlight processing handler.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use reel_models::ProcessResponse;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Message returned when the request carries no usable URL.
pub const MISSING_URL_MESSAGE: &str = "No video URL provided";

/// Body of `POST /process`, accepted as JSON or as an urlencoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ProcessBody {
    url: Option<String>,
}

impl ProcessRequest {
    fn parse(content_type: Option<&str>, body: &[u8]) -> ApiResult<Self> {
        let parsed: ProcessBody = if content_type.is_some_and(is_json_content_type) {
            serde_json::from_slice(body)
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?
        } else {
            serde_urlencoded::from_bytes(body)
                .map_err(|e| ApiError::bad_request(format!("Invalid form body: {e}")))?
        };

        parsed
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(|url| Self { url })
            .ok_or_else(|| ApiError::bad_request(MISSING_URL_MESSAGE))
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

#[async_trait]
impl<S> FromRequest<S> for ProcessRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        Self::parse(content_type.as_deref(), &body).map_err(IntoResponse::into_response)
    }
}

/// Run the highlight pipeline for a video URL.
pub async fn process_video(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    request: ProcessRequest,
) -> ApiResult<Json<ProcessResponse>> {
    let request_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(request_id = %request_id, url = %request.url, "Processing video");

    let output = state.pipeline.process(&request.url, &request_id).await?;

    let highlight_clip_url = output
        .clip_path
        .as_deref()
        .and_then(|path| path.file_name())
        .map(|name| {
            let base = public_base(state.config.public_base_url.as_deref(), &headers);
            format!("{}/files/highlights/{}", base, name.to_string_lossy())
        });

    Ok(Json(ProcessResponse {
        key_moments: output.highlights.key_moments(),
        highlight_clip_url,
    }))
}

/// Base URL for links handed back to the caller.
fn public_base(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = configured {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}
