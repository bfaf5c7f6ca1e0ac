// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! reqcap reference server
//!
//! A small multi-tenant token API wired up with the request capture
//! middleware, bearer-token authentication, and a Prometheus scrape
//! endpoint. Every request, matched or not, shows up in
//! `reqcap_http_requests_total` with its method, normalized path, status
//! code, and site attribution.

use anyhow::Context;
use axum::{
    extract::Path,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Import from the library
use reqcap::{
    auth::{authenticate, KeyStore},
    capture::capture_requests,
    metrics, tokens,
    types::{ApiError, AppState},
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(tokens::generate_token, tokens::validate_token),
    components(schemas(tokens::TokenResponse, tokens::ValidateTokenResponse)),
    tags(
        (name = "tokens", description = "Token generation and validation endpoints")
    ),
    info(
        title = "reqcap reference API",
        version = "0.3.2",
        description = "Multi-tenant token API instrumented with reqcap request metrics",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Server configuration
const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics endpoint for Prometheus scraping
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            ApiError::InternalError(format!("Failed to gather metrics: {}", e)).into_response()
        }
    }
}

/// Placeholder static content endpoint
///
/// Exists so the wildcard labelling policy is visible in a running server:
/// each served sub-path gets its own counter series.
async fn static_content(Path(path): Path<String>) -> Response {
    (StatusCode::OK, format!("static content: {}", path)).into_response()
}

fn token_routes(state: AppState, disable_auth: bool) -> Router {
    let routes = Router::new()
        .route(
            "/token/generate",
            get(tokens::generate_token).post(tokens::generate_token),
        )
        .route("/token/validate", get(tokens::validate_token))
        .with_state(state.clone());

    if disable_auth {
        routes
    } else {
        routes.layer(axum_middleware::from_fn_with_state(
            state.keys.clone(),
            authenticate,
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!(
        "starting reqcap reference server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // initialize metrics
    metrics::init_metrics();

    // get configuration from environment
    let api_port = std::env::var("API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_API_PORT);
    let disable_auth = std::env::var("DISABLE_AUTH")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let token_ttl_secs = std::env::var("TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

    info!("api port: {}", api_port);
    info!("token ttl: {}s", token_ttl_secs);

    // load API keys
    let keys = match std::env::var("API_KEYS_FILE") {
        Ok(path) => {
            let store = KeyStore::from_file(&path)
                .with_context(|| format!("failed to load api keys from {}", path))?;
            info!("loaded {} api keys from {}", store.len(), path);
            store
        }
        Err(_) => {
            if !disable_auth {
                warn!("API_KEYS_FILE not set - no tokens will authenticate");
            }
            KeyStore::new()
        }
    };

    if disable_auth {
        warn!("authentication is disabled - token endpoints are unprotected!");
    } else {
        info!("authentication is enabled");
    }

    // create application state
    let state = AppState {
        keys: Arc::new(keys),
        token_ttl_secs,
    };

    // build main router; the capture layer goes on last so it observes the
    // final response of every route, the fallback included
    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/static/{*path}", get(static_content))
        .nest("/v1", token_routes(state.clone(), disable_auth))
        .nest("/v2", token_routes(state, disable_auth))
        .layer(axum_middleware::from_fn(capture_requests))
        .layer(TraceLayer::new_for_http());

    // start server
    let addr = format!("0.0.0.0:{}", api_port);

    info!("reqcap reference server listening on {}", addr);
    info!("swagger ui available at http://{}/docs", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
