//! Axum HTTP API server for highlight reels.
//!
//! This crate provides:
//! - `POST /process`: download, detect, merge and render a highlight reel
//! - `GET /files/*path`: serve rendered reels
//! - Request IDs, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use pipeline::{
    AcquiredVideo, HighlightPipeline, PipelineOutput, PipelineSettings, ReelPipeline, VideoSource,
    YtDlpSource,
};
pub use routes::create_router;
pub use state::AppState;
