//! HTTP request metrics
//!
//! Labels are bounded: the matched route template instead of the raw path,
//! and status codes bucketed by class. User ids never appear in labels.

use std::time::Duration;

use metrics::{counter, histogram};

/// Bucket status codes to limit label cardinality
pub fn bucket_status_code(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub fn record_http_request(method: &str, route: &str, status_code: u16, duration: Duration) {
    let status_bucket = bucket_status_code(status_code);

    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_bucket
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_bucket
    )
    .record(duration.as_secs_f64());
}
