// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Route-pattern normalization for request metrics
//!
//! Raw request paths are unbounded (resource ids, file names, query strings),
//! so recording them verbatim would explode metric cardinality. This module
//! derives a stable label from what the router matched instead: either the
//! explicit [`RouteStack`] entries recorded by routing layers, or the matched
//! route template axum leaves in request extensions. A request no route
//! matched labels as the [`UNKNOWN_PATH`] sentinel, never as the raw path.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Path label recorded when no route matched the request.
pub const UNKNOWN_PATH: &str = "unknown";

/// Ordered matched-route patterns for one request, outermost mount first.
///
/// Carried in response extensions. Each routing layer touches the response
/// after everything mounted inside it, so an inner route's entry is recorded
/// before the mount that contains it; [`RouteStack::record`] prepends, which
/// keeps the vector in outer-to-inner order without any coordination between
/// layers.
#[derive(Clone, Debug, Default)]
pub struct RouteStack {
    entries: Vec<Arc<str>>,
}

impl RouteStack {
    /// Record a matched pattern, placing it before entries recorded earlier.
    pub fn record(&mut self, pattern: impl Into<Arc<str>>) {
        self.entries.insert(0, pattern.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Join the recorded patterns into a single normalized path label.
    ///
    /// Entries are concatenated in recorded order with exactly one separator
    /// between them, so a mount at `/v2` plus an inner route `/token/generate`
    /// yields `/v2/token/generate` no matter how either side spelled its
    /// leading or trailing slashes.
    pub fn label(&self) -> String {
        if self.entries.is_empty() {
            return UNKNOWN_PATH.to_string();
        }

        let mut label = String::new();
        for entry in &self.entries {
            let trimmed = entry.trim_matches('/');
            if trimmed.is_empty() {
                continue;
            }
            label.push('/');
            label.push_str(trimmed);
        }

        // A stack of nothing but root mounts still labels as the root route.
        if label.is_empty() {
            label.push('/');
        }
        label
    }
}

/// Derive the path label from the router's matched template.
///
/// Parameter segments stay templated (`/zones/{name}` counts as one label no
/// matter how many zones exist). A trailing wildcard is the exception: the
/// route-match records report wildcard routes by the concrete sub-path they
/// matched, so `/static/{*path}` hit by `GET /static/content` labels as
/// `/static/content`. When a parameter segment precedes the wildcard the
/// template is kept verbatim so parameter values never leak into labels.
pub fn label_for(matched: Option<&str>, concrete_path: &str) -> String {
    let Some(pattern) = matched else {
        return UNKNOWN_PATH.to_string();
    };

    match pattern.find("{*") {
        Some(idx)
            if !pattern[..idx].contains('{') && concrete_path.starts_with(&pattern[..idx]) =>
        {
            concrete_path.to_string()
        }
        _ => pattern.to_string(),
    }
}

/// Middleware recording a fixed route pattern for the current request.
///
/// axum's `MatchedPath` cannot see through `nest_service`, so services mounted
/// that way layer this on (via `middleware::from_fn_with_state`) to contribute
/// their pattern to the metrics label. A mount prefix and the route inside it
/// each record their own entry; the capture middleware joins them.
pub async fn record_route(
    State(pattern): State<Arc<str>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let mut stack = response
        .extensions_mut()
        .remove::<RouteStack>()
        .unwrap_or_default();
    stack.record(pattern);
    response.extensions_mut().insert(stack);
    response
}
