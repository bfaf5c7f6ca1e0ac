// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Unit tests for auth module

use super::auth::*;
use crate::site::CallerIdentity;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;

async fn test_handler() -> &'static str {
    "success"
}

fn test_keys() -> Arc<KeyStore> {
    let mut store = KeyStore::new();
    store.add_client(ClientKey::new("client-token", "secret").with_site_id(5));
    store.add_operator(
        OperatorKey::new("operator-token", "op", "ops@example.com", "trusted").with_site_id(9),
    );
    Arc::new(store)
}

fn test_app(keys: Arc<KeyStore>) -> Router {
    Router::new()
        .route("/test", get(test_handler))
        .layer(middleware::from_fn_with_state(keys, authenticate))
}

#[tokio::test]
async fn test_authenticate_with_valid_token() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "Bearer client-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authenticate_missing_header() {
    let app = test_app(test_keys());

    let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticate_invalid_format() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "InvalidFormat token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticate_empty_token() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticate_unknown_token() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "Bearer who-is-this")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticate_mirrors_identity_into_response() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "Bearer client-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let caller = response
        .extensions()
        .get::<CallerIdentity>()
        .expect("identity missing from response extensions");
    assert_eq!(caller.site_id(), Some(5));
}

#[tokio::test]
async fn test_authenticate_operator_site_id() {
    let app = test_app(test_keys());

    let request = Request::builder()
        .uri("/test")
        .header("authorization", "Bearer operator-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let caller = response.extensions().get::<CallerIdentity>().unwrap();
    assert_eq!(caller.site_id(), Some(9));
}

#[test]
fn test_key_store_lookup() {
    let keys = test_keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.lookup("client-token").is_some());
    assert!(keys.lookup("missing-token").is_none());
}

#[test]
fn test_key_store_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "clients": [
                {{"key": "ck-1", "secret": "s1", "site_id": 11}},
                {{"key": "ck-2", "secret": "s2", "site_id": null}}
            ],
            "operators": [
                {{"key": "ok-1", "name": "op", "contact": "ops@example.com",
                  "protocol": "trusted", "site_id": 22}}
            ]
        }}"#
    )
    .unwrap();

    let store = KeyStore::from_file(file.path()).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.lookup("ck-1").unwrap().site_id(), Some(11));
    assert_eq!(store.lookup("ck-2").unwrap().site_id(), None);
    assert_eq!(store.lookup("ok-1").unwrap().site_id(), Some(22));
}

#[test]
fn test_key_store_from_missing_file() {
    let result = KeyStore::from_file("/nonexistent/keys.json");
    assert!(result.is_err());
}
