//! Structured request logging utilities.
//!
//! Tags every pipeline stage log with the request ID so one request's
//! progress can be followed through interleaved output.

use tracing::{error, info, warn, Span};

/// Logger for one request's pipeline run.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    operation: String,
}

impl RequestLogger {
    /// Create a logger for `request_id` running `operation` (e.g. "process").
    pub fn new(request_id: &str, operation: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of the operation.
    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Pipeline started: {}", message
        );
    }

    /// Log completion of one pipeline stage.
    pub fn log_stage(&self, stage: &str, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            stage,
            "Stage {}: {}", stage, message
        );
    }

    /// Log a recoverable problem.
    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Pipeline warning: {}", message
        );
    }

    /// Log a failure that ends the request.
    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Pipeline error: {}", message
        );
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Pipeline completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span covering the whole run, so library logs inherit the request ID.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}
