//! HTTP response payloads for the processing endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label attached to every reported key moment.
pub const KEY_MOMENT_CAPTION: &str = "Engaging moment detected";

/// A highlight start reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeyMoment {
    /// Interval start in seconds, two decimals (e.g. "12.50")
    pub timestamp: String,
    /// Human-readable label
    pub caption: String,
}

/// Successful response for `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessResponse {
    /// One entry per merged highlight interval
    pub key_moments: Vec<KeyMoment>,
    /// Public URL of the rendered reel; `None` when nothing was highlighted
    pub highlight_clip_url: Option<String>,
}

impl ProcessResponse {
    /// Response for a video where nothing engaging was detected.
    pub fn empty() -> Self {
        Self {
            key_moments: Vec::new(),
            highlight_clip_url: None,
        }
    }
}
