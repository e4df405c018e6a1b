//! Serving rendered reels and other generated files.

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::{Path as UrlPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const FILE_NOT_FOUND: &str = "File not found";
const VIDEO_MIME: &str = "video/mp4";

/// Serve `<files>/<path>`, falling back to `<files>/highlights/<path>`.
///
/// Supports range requests; the response is always labelled `video/mp4`.
pub async fn serve_file(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    request: Request,
) -> ApiResult<Response> {
    let relative = sanitize_relative_path(&path).ok_or_else(|| ApiError::not_found(FILE_NOT_FOUND))?;

    let file = resolve_file(&state.config.files_dir, &state.config.highlights_dir(), &relative)
        .await
        .ok_or_else(|| ApiError::not_found(FILE_NOT_FOUND))?;
    debug!(path = %file.display(), "Serving file");

    let response = match ServeFile::new(&file).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let mut response = response.map(Body::new).into_response();
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(VIDEO_MIME));
    }
    Ok(response)
}

/// Keep only plain path segments; anything that could leave the files root is rejected.
fn sanitize_relative_path(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    let mut components = path.components().peekable();
    components.peek()?;

    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

async fn resolve_file(files_dir: &Path, highlights_dir: &Path, relative: &Path) -> Option<PathBuf> {
    for candidate in [files_dir.join(relative), highlights_dir.join(relative)] {
        if let Ok(metadata) = tokio::fs::metadata(&candidate).await {
            if metadata.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
