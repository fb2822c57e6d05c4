//! Route handlers.
//!
//! Handlers are thin: parameter checks and response shaping live here,
//! the actual mechanisms live in [`crate::auth`], [`crate::oauth`],
//! [`crate::guard`], and [`crate::proxy`].

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use crate::auth::hmac::{constant_time_compare, verify_callback_signature};
use crate::auth::InstallNonce;
use crate::config::ShopDomain;
use crate::guard::{self, AuthError};
use crate::oauth::{self, OAuthError};
use crate::proxy::{self, UpstreamResponse};
use crate::server::cookies::{self, NONCE_COOKIE};
use crate::server::{AppState, EXPIRES_SOON_HEADER};

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// A 302 redirect. `axum::response::Redirect` only offers 303/307/308,
/// and the install flow uses plain 302 redirects.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// The unauthenticated landing page.
pub async fn landing() -> Html<&'static str> {
    Html(
        "<!doctype html>\
         <html><head><title>Session Gate</title></head>\
         <body><h1>Install this app</h1>\
         <p>Start the installation from your store's admin, or open \
         <code>/auth?shop=your-store.myshopify.com</code>.</p>\
         </body></html>",
    )
}

/// The dashboard shell rendered after a successful install.
///
/// The page guard has already validated the session by the time this
/// runs; the shop path segment is only display input and is still
/// validated before rendering.
pub async fn dashboard(Path(shop): Path<String>) -> Response {
    match ShopDomain::new(shop) {
        Ok(shop) => Html(format!(
            "<!doctype html>\
             <html><head><title>Dashboard</title></head>\
             <body><h1>Dashboard</h1><p>Connected to {shop}</p>\
             <script>{BOOTSTRAP_SCRIPT}</script>\
             </body></html>"
        ))
        .into_response(),
        Err(_) => found("/"),
    }
}

/// Session bootstrap run on dashboard load: if the page was reached via
/// an install redirect carrying `session` and `shop` query parameters,
/// hand them to the verification endpoint once so the cookie pair gets
/// issued, then drop the parameters from the address bar.
const BOOTSTRAP_SCRIPT: &str = "\
(function () {\
  var params = new URLSearchParams(window.location.search);\
  var session = params.get('session');\
  var shop = params.get('shop');\
  if (!session || !shop) { return; }\
  fetch('/auth/verify', {\
    method: 'POST',\
    headers: { 'Content-Type': 'application/json' },\
    body: JSON.stringify({ session: session, shop: shop })\
  }).then(function () {\
    window.history.replaceState({}, '', window.location.pathname);\
  });\
})();";

/// `GET /auth`: install-start or install-callback.
///
/// The two transitions share one path; the presence of `code` selects
/// the callback. Both require `shop`.
pub async fn auth_entry(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
    jar: CookieJar,
) -> Response {
    let Some(shop_param) = params.get("shop") else {
        return bad_request(&OAuthError::MissingShop.to_string());
    };
    let shop = match ShopDomain::new(shop_param.clone()) {
        Ok(shop) => shop,
        Err(err) => return bad_request(&OAuthError::InvalidShop(err).to_string()),
    };

    if params.contains_key("code") {
        install_callback(&state, &params, jar, &shop).await
    } else {
        install_start(&state, &params, jar, &shop)
    }
}

/// Install-start: HMAC gate, nonce mint, redirect to authorize.
fn install_start(
    state: &AppState,
    params: &BTreeMap<String, String>,
    jar: CookieJar,
    shop: &ShopDomain,
) -> Response {
    if !verify_callback_signature(params, state.config.api_secret_key()) {
        return bad_request(&OAuthError::HmacInvalid.to_string());
    }

    let nonce = InstallNonce::new();
    let authorize = oauth::authorize_url(&state.config, shop, nonce.as_ref());
    let jar = cookies::with_nonce(jar, &state.config, nonce.as_ref());

    info!(shop = %shop, "install started, redirecting to authorize");
    (jar, found(&authorize)).into_response()
}

/// Install-callback: nonce check, code exchange, seal and store, issue
/// session, redirect to the dashboard.
async fn install_callback(
    state: &AppState,
    params: &BTreeMap<String, String>,
    jar: CookieJar,
    shop: &ShopDomain,
) -> Response {
    // CSRF gate before any network I/O: the returned state must equal
    // the nonce cookie parked at install-start.
    let returned_state = params.get("state").map(String::as_str).unwrap_or_default();
    let stored_nonce = jar
        .get(NONCE_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    if stored_nonce.is_empty() || !constant_time_compare(&stored_nonce, returned_state) {
        return bad_request(&OAuthError::StateMismatch.to_string());
    }

    let code = params.get("code").map(String::as_str).unwrap_or_default();
    let access_token = match oauth::exchange_code(&state.http, &state.config, shop, code).await {
        Ok(token) => token,
        Err(err) => return exchange_failure(&err),
    };

    let sealed = state.cipher.seal(&access_token);
    if let Err(err) = state.store.upsert(shop, &sealed) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Error fetching access token",
                "details": err.to_string(),
            })),
        )
            .into_response();
    }

    let session_token = match state.codec.issue(shop) {
        Ok(token) => token,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Error fetching access token",
                    "details": err.to_string(),
                })),
            )
                .into_response();
        }
    };

    let jar = cookies::with_session(jar, &state.config, &session_token, shop);
    let jar = cookies::without_nonce(jar);

    info!(shop = %shop, "install completed");
    (jar, found(&format!("/dashboard/{}", shop.as_ref()))).into_response()
}

/// Maps a failed code exchange to its HTTP response.
///
/// A response that parsed but lacked a token is the caller's problem
/// (400 with the upstream body); a transport failure is ours (500).
fn exchange_failure(err: &OAuthError) -> Response {
    match err {
        OAuthError::TokenMissing { details } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string(), "details": details })),
        )
            .into_response(),
        OAuthError::Upstream { details } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string(), "details": details })),
        )
            .into_response(),
        other => bad_request(&other.to_string()),
    }
}

/// Body of `POST /auth/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The session value handed over by the install redirect.
    session: Option<String>,
    /// The shop the session belongs to.
    shop: Option<String>,
}

/// `POST /auth/verify`: issues the session cookie pair from an
/// install-redirect handoff without repeating the OAuth exchange.
pub async fn verify_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyRequest>,
) -> Response {
    let (Some(session), Some(shop_param)) = (body.session, body.shop) else {
        return bad_request("Missing required parameters");
    };
    if session.is_empty() || shop_param.is_empty() {
        return bad_request("Missing required parameters");
    }
    let shop = match ShopDomain::new(shop_param) {
        Ok(shop) => shop,
        Err(err) => return bad_request(&OAuthError::InvalidShop(err).to_string()),
    };

    let session_token = match state.codec.issue(&shop) {
        Ok(token) => token,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let jar = cookies::with_session(jar, &state.config, &session_token, &shop);
    (jar, Json(json!({ "success": true }))).into_response()
}

/// `GET /products`: guarded pass-through to the product list.
pub async fn list_products(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
) -> Response {
    let session = match run_guard(&state, &headers, &jar) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    match proxy::list_products(&state.http, &state.config, &session.shop, &session.access_token)
        .await
    {
        Ok(upstream) => pass_through(upstream, session.expires_soon),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch products", "details": err.to_string() })),
        )
            .into_response(),
    }
}

/// `POST /products`: guarded pass-through product creation.
pub async fn create_product(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
    Json(payload): Json<Value>,
) -> Response {
    let session = match run_guard(&state, &headers, &jar) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    match proxy::create_product(
        &state.http,
        &state.config,
        &session.shop,
        &session.access_token,
        &payload,
    )
    .await
    {
        Ok(upstream) => pass_through(upstream, session.expires_soon),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create product", "details": err.to_string() })),
        )
            .into_response(),
    }
}

fn run_guard(
    state: &AppState,
    headers: &axum::http::HeaderMap,
    jar: &CookieJar,
) -> Result<guard::AuthorizedSession, AuthError> {
    let creds = guard::presented(headers, jar).ok_or(AuthError::MissingCredentials)?;
    guard::authorize(&state.codec, &state.cipher, &state.store, &creds)
}

fn pass_through(upstream: UpstreamResponse, expires_soon: bool) -> Response {
    let mut response = (upstream.status, Json(upstream.body)).into_response();
    if expires_soon {
        response.headers_mut().insert(
            HeaderName::from_static(EXPIRES_SOON_HEADER),
            axum::http::HeaderValue::from_static("true"),
        );
    }
    response
}
