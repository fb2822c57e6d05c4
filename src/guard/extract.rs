//! Pulling session credentials out of a request.
//!
//! API calls from the embedded UI send the token in an `Authorization:
//! Bearer` header and the shop in `X-Shop-Domain`; plain browser
//! navigations only carry the cookie pair. Each field falls back to its
//! cookie independently, so a client may mix the two transports.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use crate::server::cookies::{SESSION_COOKIE, SHOP_COOKIE};

/// Header naming the shop a request acts on behalf of.
pub const SHOP_DOMAIN_HEADER: &str = "x-shop-domain";

/// The raw, unverified credential pair presented by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedCredentials {
    /// The session token, still unverified.
    pub token: String,
    /// The shop domain the client claims, still unvalidated.
    pub shop: String,
}

/// Extracts the credential pair from headers and cookies.
///
/// Headers take precedence field by field; a request may present the
/// token in a header and the shop in a cookie. Returns `None` when
/// either field is absent everywhere.
#[must_use]
pub fn presented(headers: &HeaderMap, jar: &CookieJar) -> Option<PresentedCredentials> {
    let token = bearer_token(headers)
        .map(str::to_string)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))?;

    let shop = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| jar.get(SHOP_COOKIE).map(|c| c.value().to_string()))?;

    Some(PresentedCredentials { token, shop })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
