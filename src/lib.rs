// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! reqcap - HTTP request-metrics capture middleware for axum
//!
//! For every inbound request, reqcap resolves a stable, low-cardinality path
//! label (the matched route template, not the raw URL), waits for the
//! response, and increments a Prometheus counter tagged by HTTP method,
//! normalized path, status code, and an optional caller-derived site id.
//! Dynamic URL segments (query strings, path parameters, sub-router mounts)
//! never become distinct metric series.
//!
//! # Features
//!
//! - One counter increment per completed request, no matter how deeply the
//!   route is nested
//! - Route-template path labels with an `"unknown"` sentinel for unmatched
//!   requests, keeping cardinality bounded
//! - Site attribution from a direct per-request override or from the caller
//!   identity attached by authentication middleware
//! - Best-effort by construction: no input can make the middleware alter the
//!   response or fail the request
//!
//! # Usage
//!
//! ## Capturing request metrics
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use reqcap::capture::capture_requests;
//!
//! // The capture layer goes on last so it wraps routing itself and sees
//! // unmatched (404) requests too.
//! let app: Router = Router::new()
//!     .route("/v1/token/generate", get(|| async { "ok" }))
//!     .layer(middleware::from_fn(capture_requests));
//! ```
//!
//! ## Attributing requests to a site
//!
//! Authentication middleware attaches a [`site::CallerIdentity`] wrapping any
//! credential that implements [`site::HasSiteId`]:
//!
//! ```rust
//! use reqcap::auth::ClientKey;
//! use reqcap::site::CallerIdentity;
//!
//! let key = ClientKey::new("api-key", "secret").with_site_id(123);
//! let caller = CallerIdentity::new(key);
//! assert_eq!(caller.site_id(), Some(123));
//! ```
//!
//! A handler can override identity-derived attribution by putting a
//! [`site::SiteId`] into its response:
//!
//! ```rust,ignore
//! async fn handler() -> impl IntoResponse {
//!     (Extension(SiteId(42)), Json(body))
//! }
//! ```
//!
//! # Emitted metric
//!
//! Exactly one counter, `reqcap_http_requests_total`, with tag keys
//! `method`, `path`, `status`, and `site_id`. The `site_id` tag is the
//! decimal site id or the literal `"null"`; the `path` tag is the route
//! template or the literal `"unknown"`.

// Re-export public modules
pub mod auth;
pub mod capture;
pub mod metrics;
pub mod route_label;
pub mod site;
pub mod tokens;
pub mod types;

// Capture middleware
pub use capture::capture_requests;

// Path normalization
pub use route_label::{record_route, RouteStack, UNKNOWN_PATH};

// Site attribution
pub use site::{CallerIdentity, HasSiteId, SiteId, SITE_ID_NULL};

// Credential types
pub use auth::{ClientKey, KeyStore, OperatorKey};

// Shared API types
pub use types::{ApiError, AppState, ErrorResponse};

// Test modules
#[cfg(test)]
mod auth_test;
#[cfg(test)]
mod metrics_test;
