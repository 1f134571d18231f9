//! Telemetry utilities for request timing and tracing spans.

use std::time::Instant;

/// Guard for timing an accept/unaccept request and recording metrics.
///
/// Records request latency when dropped.
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start timing an operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_request(self.operation, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for an acceptance transition.
    pub fn transition(operation: &str, topic_id: i64, post_id: i64) -> Span {
        info_span!("transition", op = %operation, topic_id = topic_id, post_id = post_id)
    }

    /// Create a span for an HTTP request.
    pub fn request(method: &str, path: &str) -> Span {
        info_span!("request", method = %method, path = %path)
    }
}
