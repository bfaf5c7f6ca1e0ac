// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Request capture middleware
//!
//! The entrypoint of the crate: a single middleware that observes every
//! request/response pair and increments the request counter exactly once per
//! completed request. Install it as the outermost layer so it sees the final
//! status code and everything inner layers attached to the response.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    metrics,
    route_label::{self, RouteStack},
    site,
};

/// Middleware recording one `reqcap_http_requests_total` increment per
/// completed request.
///
/// On the way in it snapshots the method, the concrete path, and the route
/// template the router matched, then delegates immediately. Once the inner
/// service has produced the response it derives the tag set:
///
/// - `path`: the [`RouteStack`] entries recorded by routing layers when
///   present, otherwise the matched template (see
///   [`route_label::label_for`]); `"unknown"` when no route matched.
/// - `site_id`: resolved from response extensions (see
///   [`site::resolve_site_id`]); `"null"` when nothing attributed the
///   request.
/// - `status`: the final status code of the response.
///
/// The response passes through untouched, and no input can make this
/// middleware fail the request: attribution gaps degrade to the sentinel tag
/// values instead.
pub async fn capture_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let concrete_path = req.uri().path().to_string();
    let matched = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());

    let response = next.run(req).await;

    let path = match response.extensions().get::<RouteStack>() {
        Some(stack) if !stack.is_empty() => stack.label(),
        _ => route_label::label_for(matched.as_deref(), &concrete_path),
    };
    let site_id = site::resolve_site_id(response.extensions());

    metrics::record_request(&method, &path, response.status().as_u16(), &site_id);

    response
}
