// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Unit tests for metrics module

use super::metrics::*;

#[test]
fn test_init_metrics() {
    init_metrics();
    // Verify app info metric was set
    let metrics = gather_metrics().unwrap();
    assert!(metrics.contains("reqcap_app_info"));
    assert!(metrics.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_gather_metrics() {
    // Record at least one metric so gather_metrics returns something
    init_metrics();
    let result = gather_metrics();
    assert!(result.is_ok());

    let metrics = result.unwrap();
    assert!(!metrics.is_empty());
}

#[test]
fn test_record_request() {
    record_request("GET", "/v1/token/generate", 200, "123");
    record_request("POST", "/v2/token/generate", 200, "null");
    record_request("GET", "unknown", 404, "null");

    let metrics = gather_metrics().unwrap();
    assert!(metrics.contains("reqcap_http_requests_total"));
}

#[test]
fn test_record_request_exposes_all_tags() {
    record_request("DELETE", "/tag-check", 204, "456");

    let metrics = gather_metrics().unwrap();
    let line = metrics
        .lines()
        .find(|l| l.contains("/tag-check"))
        .expect("recorded series missing from exposition");
    assert!(line.contains("method=\"DELETE\""));
    assert!(line.contains("path=\"/tag-check\""));
    assert!(line.contains("status=\"204\""));
    assert!(line.contains("site_id=\"456\""));
}

#[test]
fn test_record_request_counts_per_tag_set() {
    let counter = HTTP_REQUESTS_TOTAL.with_label_values(&["GET", "/count-check", "200", "null"]);
    let before = counter.get();

    record_request("GET", "/count-check", 200, "null");
    record_request("GET", "/count-check", 200, "null");
    // A different status is a different series
    record_request("GET", "/count-check", 500, "null");

    assert_eq!(counter.get() - before, 2.0);
}

#[test]
fn test_record_request_various_methods() {
    let methods = vec!["GET", "POST", "PUT", "DELETE", "PATCH"];
    let statuses = vec![200, 201, 400, 404, 500, 502];

    for method in &methods {
        for status in &statuses {
            record_request(method, "/method-check", *status, "null");
        }
    }

    let metrics = gather_metrics().unwrap();
    assert!(metrics.contains("reqcap_http_requests_total"));
}
