// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Token API handlers for the reference server
//!
//! A small multi-tenant token API that exercises every attribution path the
//! capture middleware supports:
//! - `generate_token` reads the caller identity auth attached to the request
//! - `validate_token` re-attributes the request with a direct [`SiteId`]
//!   override parsed from the token itself, since validation may be called
//!   without credentials

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    site::{CallerIdentity, SiteId},
    types::{ApiError, AppState},
};

/// Token prefix used when the generating caller is not bound to a site
const ANONYMOUS_PREFIX: &str = "anon";

/// Query parameters for token generation
#[derive(Debug, Deserialize, IntoParams)]
pub struct GenerateTokenRequest {
    /// Email address to bind the token to
    pub email: String,
}

/// A generated token and its validity window
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Opaque token, prefixed with the issuing site id
    pub token: String,
    /// Site the token was issued for, absent for unbound callers
    pub site_id: Option<i32>,
    pub expires_at: DateTime<Utc>,
}

/// Query parameters for token validation
#[derive(Debug, Deserialize, IntoParams)]
pub struct ValidateTokenRequest {
    /// Token to validate
    pub token: String,
}

/// Validation verdict
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub valid: bool,
}

/// Generate an opaque token for the authenticated caller
#[utoipa::path(
    get,
    path = "/v1/token/generate",
    params(GenerateTokenRequest),
    responses(
        (status = 200, description = "Token generated", body = TokenResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tokens"
)]
pub async fn generate_token(
    State(state): State<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    Query(request): Query<GenerateTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::InvalidRequest(
            "email must not be empty".to_string(),
        ));
    }

    let site_id = caller.as_ref().and_then(|Extension(c)| c.site_id());
    let prefix = site_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| ANONYMOUS_PREFIX.to_string());
    let token = format!("{}.{}", prefix, Uuid::new_v4().simple());
    let expires_at = Utc::now() + Duration::seconds(state.token_ttl_secs);

    info!(site_id = ?site_id, "token generated");

    Ok(Json(TokenResponse {
        token,
        site_id,
        expires_at,
    }))
}

/// Validate a previously generated token
///
/// Runs without authentication, so the site that issued the token is
/// recovered from the token prefix and attached to the response as a direct
/// [`SiteId`] override for metrics attribution.
#[utoipa::path(
    get,
    path = "/v1/token/validate",
    params(ValidateTokenRequest),
    responses(
        (status = 200, description = "Validation verdict", body = ValidateTokenResponse)
    ),
    tag = "tokens"
)]
pub async fn validate_token(Query(request): Query<ValidateTokenRequest>) -> Response {
    let verdict = parse_token(&request.token);
    debug!(valid = verdict.is_some(), "token validated");

    match verdict {
        Some(Some(site_id)) => (
            Extension(SiteId(site_id)),
            Json(ValidateTokenResponse { valid: true }),
        )
            .into_response(),
        Some(None) => Json(ValidateTokenResponse { valid: true }).into_response(),
        None => Json(ValidateTokenResponse { valid: false }).into_response(),
    }
}

/// Split a token into its site prefix and opaque remainder.
///
/// Returns `None` for malformed tokens, `Some(None)` for valid anonymous
/// tokens, and `Some(Some(id))` for valid site-bound tokens.
fn parse_token(token: &str) -> Option<Option<i32>> {
    let (prefix, rest) = token.split_once('.')?;
    if rest.is_empty() {
        return None;
    }

    if prefix == ANONYMOUS_PREFIX {
        return Some(None);
    }
    prefix.parse::<i32>().ok().map(Some)
}
