// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Prometheus metrics for reqcap
//!
//! This module owns the request counter the capture middleware increments:
//! one increment per completed request, tagged by method, normalized path,
//! status code, and site id. Counts only: latency belongs to a tracing or
//! histogram layer, not here.

use lazy_static::lazy_static;
use prometheus::{opts, register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// HTTP request counter by method, normalized path, status code, and site id
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "reqcap_http_requests_total",
            "Total number of HTTP requests processed"
        ),
        &["method", "path", "status", "site_id"]
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// Application info metric
    pub static ref APP_INFO: CounterVec = register_counter_vec!(
        opts!(
            "reqcap_app_info",
            "Application information"
        ),
        &["version"]
    )
    .expect("Failed to create APP_INFO metric");
}

/// Initialize metrics with application info
pub fn init_metrics() {
    APP_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .inc();
}

/// Generate metrics output in Prometheus format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a completed HTTP request.
///
/// `site_id` is the already-serialized tag value (a decimal string or the
/// literal `"null"`). Incrementing a prometheus counter cannot fail, so
/// nothing here can reach the request path.
pub fn record_request(method: &str, path: &str, status: u16, site_id: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string(), site_id])
        .inc();
}
