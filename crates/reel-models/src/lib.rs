//! Shared data models for the highlight reel service.
//!
//! This crate provides Serde-serializable types for:
//! - Transcript segments produced by speech recognition
//! - Time intervals and merged highlight sets
//! - HTTP response payloads (key moments, clip URL)
//! - Timestamp parsing and formatting

pub mod interval;
pub mod response;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use interval::{HighlightSet, TimeInterval};
pub use response::{KeyMoment, ProcessResponse, KEY_MOMENT_CAPTION};
pub use timestamp::{format_key_timestamp, parse_timestamp, TimestampError};
pub use transcript::TranscriptSegment;
