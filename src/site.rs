// Copyright (c) 2025 reqcap contributors
// SPDX-License-Identifier: MIT

//! Site-id resolution for request attribution
//!
//! A site id identifies the tenant a request was made on behalf of. Two
//! sources can supply it, checked in a fixed order: a [`SiteId`] set directly
//! on the response by any handler, then the [`CallerIdentity`] attached by
//! authentication middleware. Neither resolving is not an error; the request
//! is simply attributed to `"null"`.

use std::fmt;
use std::sync::Arc;

use axum::http::Extensions;

/// Tag value recorded when no site id could be resolved.
pub const SITE_ID_NULL: &str = "null";

/// Capability exposed by any credential that can attribute requests to a site.
///
/// Resolution depends only on this accessor, never on a list of concrete
/// credential types, so new variants participate without the capture path
/// knowing about them. A credential not bound to a site returns `None` and is
/// treated exactly like an absent credential.
pub trait HasSiteId {
    /// The site this credential acts on behalf of, if it is bound to one.
    fn site_id(&self) -> Option<i32>;
}

/// Direct site-id override for the current request.
///
/// Attached to the response by a handler (for example via
/// `axum::Extension(SiteId(123))` in the response tuple). Checked before the
/// caller identity, so handlers downstream of auth can re-attribute a request
/// that identity-derived attribution would get wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiteId(pub i32);

/// Type-erased caller identity attached by authentication middleware.
#[derive(Clone)]
pub struct CallerIdentity(Arc<dyn HasSiteId + Send + Sync>);

impl CallerIdentity {
    pub fn new(credential: impl HasSiteId + Send + Sync + 'static) -> Self {
        Self(Arc::new(credential))
    }

    pub fn site_id(&self) -> Option<i32> {
        self.0.site_id()
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("site_id", &self.site_id())
            .finish()
    }
}

/// Resolve the `site_id` tag for a completed request.
///
/// Checks the direct [`SiteId`] override first, then the caller identity.
/// Later sources never override an earlier one that resolved; both absent
/// degrades to the literal `"null"`. Cannot fail.
pub fn resolve_site_id(extensions: &Extensions) -> String {
    if let Some(SiteId(id)) = extensions.get::<SiteId>() {
        return id.to_string();
    }

    if let Some(caller) = extensions.get::<CallerIdentity>() {
        if let Some(id) = caller.site_id() {
            return id.to_string();
        }
    }

    SITE_ID_NULL.to_string()
}
