// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Bearer-token authentication for the reference API
//!
//! This module validates that incoming requests include a known API key in
//! the Authorization header and attaches the resolved credential to the
//! request so handlers can read it. It also mirrors the credential into the
//! response extensions, which is where the capture middleware looks when it
//! attributes the request to a site.
//!
//! Two credential kinds exist today: [`ClientKey`] for external API clients
//! and [`OperatorKey`] for internal services. Both expose their site binding
//! through [`HasSiteId`]; the capture path never inspects the concrete type.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::site::{CallerIdentity, HasSiteId};

/// Error response for authentication failures
#[derive(Serialize)]
pub struct AuthError {
    pub error: String,
}

/// API client credential issued to a site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientKey {
    /// The bearer token the client authenticates with
    pub key: String,
    /// Shared secret for request signing (unused by the metrics path)
    pub secret: String,
    /// The site this client belongs to, if bound to one
    #[serde(default)]
    pub site_id: Option<i32>,
}

impl ClientKey {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            site_id: None,
        }
    }

    pub fn with_site_id(mut self, site_id: i32) -> Self {
        self.site_id = Some(site_id);
        self
    }
}

impl HasSiteId for ClientKey {
    fn site_id(&self) -> Option<i32> {
        self.site_id
    }
}

/// Operator credential for internal services.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperatorKey {
    /// The bearer token the operator authenticates with
    pub key: String,
    pub name: String,
    pub contact: String,
    pub protocol: String,
    /// The site this operator runs on behalf of, if bound to one
    #[serde(default)]
    pub site_id: Option<i32>,
}

impl OperatorKey {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        contact: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            contact: contact.into(),
            protocol: protocol.into(),
            site_id: None,
        }
    }

    pub fn with_site_id(mut self, site_id: i32) -> Self {
        self.site_id = Some(site_id);
        self
    }
}

impl HasSiteId for OperatorKey {
    fn site_id(&self) -> Option<i32> {
        self.site_id
    }
}

/// JSON key set loaded from disk
#[derive(Deserialize)]
struct KeyFile {
    #[serde(default)]
    clients: Vec<ClientKey>,
    #[serde(default)]
    operators: Vec<OperatorKey>,
}

/// Token → credential table for bearer authentication.
#[derive(Default)]
pub struct KeyStore {
    keys: HashMap<String, CallerIdentity>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, client: ClientKey) {
        self.keys
            .insert(client.key.clone(), CallerIdentity::new(client));
    }

    pub fn add_operator(&mut self, operator: OperatorKey) {
        self.keys
            .insert(operator.key.clone(), CallerIdentity::new(operator));
    }

    pub fn lookup(&self, token: &str) -> Option<CallerIdentity> {
        self.keys.get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Load a key set from a JSON file with `clients` and `operators` arrays.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {}", path.display()))?;
        let key_file: KeyFile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse key file {}", path.display()))?;

        let mut store = Self::new();
        for client in key_file.clients {
            store.add_client(client);
        }
        for operator in key_file.operators {
            store.add_operator(operator);
        }
        Ok(store)
    }
}

/// Authentication middleware
///
/// Validates that the request includes a Bearer token in the Authorization
/// header and that the token resolves to a known credential.
///
/// # Headers
/// - `Authorization: Bearer <token>` - Required
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - No Authorization header is present
/// - Authorization header is malformed
/// - Token does not resolve to a known key
pub async fn authenticate(
    State(keys): State<Arc<KeyStore>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<AuthError>)> {
    // Extract Authorization header
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header");
            (
                StatusCode::UNAUTHORIZED,
                Json(AuthError {
                    error: "Missing Authorization header".to_string(),
                }),
            )
        })?;

    // Check Bearer token format
    if !auth_header.starts_with("Bearer ") {
        warn!("Invalid Authorization header format");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthError {
                error: "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
            }),
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    if token.is_empty() {
        warn!("Empty token in Authorization header");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthError {
                error: "Empty token".to_string(),
            }),
        ));
    }

    let Some(caller) = keys.lookup(token) else {
        warn!("Unknown API key");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthError {
                error: "Invalid token".to_string(),
            }),
        ));
    };

    debug!(site_id = ?caller.site_id(), "request authenticated");

    // Handlers read the identity from request extensions
    request.extensions_mut().insert(caller.clone());

    let mut response = next.run(request).await;

    // Mirror into response extensions for metrics attribution; a handler that
    // already attached an identity keeps its own.
    if response.extensions().get::<CallerIdentity>().is_none() {
        response.extensions_mut().insert(caller);
    }

    Ok(response)
}
