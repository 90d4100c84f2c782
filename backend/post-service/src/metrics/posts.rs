use crate::error::AppError;
use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::time::Instant;

lazy_static! {
    /// Post API requests by operation (create, fetch, update) and outcome.
    pub static ref POST_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_requests_total",
        "Post API requests segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register post_requests_total");

    /// Handler latency by operation, store round trips included.
    pub static ref POST_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "post_request_duration_seconds",
        "Post API request duration segmented by operation",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("failed to register post_request_duration_seconds");
}

/// Outcome label for a finished request.
pub fn outcome_label<T>(result: &Result<T, AppError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(err) => err.label(),
    }
}

/// Started at the top of a handler and finished with its result.
pub struct RequestTimer {
    operation: &'static str,
    started: Instant,
}

impl RequestTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn finish<T>(self, result: &Result<T, AppError>) {
        self.finish_with(outcome_label(result));
    }

    pub fn finish_with(self, outcome: &str) {
        POST_REQUEST_DURATION_SECONDS
            .with_label_values(&[self.operation])
            .observe(self.started.elapsed().as_secs_f64());
        POST_REQUESTS_TOTAL
            .with_label_values(&[self.operation, outcome])
            .inc();
    }
}
