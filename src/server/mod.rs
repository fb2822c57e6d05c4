//! HTTP surface: application state, router, and request plumbing.
//!
//! The router exposes five paths:
//!
//! - `GET /`: unauthenticated landing page
//! - `GET /auth`: install-start or install-callback, by `code` presence
//! - `POST /auth/verify`: cookie bootstrap from an install redirect
//! - `GET|POST /products`: guarded pass-through to the product API
//! - `GET /dashboard/{shop}`: embedded UI shell, behind the page guard

pub mod cookies;
pub mod handlers;
pub mod middleware;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialCipher, SessionTokenCodec};
use crate::config::AppConfig;
use crate::store::CredentialStore;

/// Response header marking a session within 5 minutes of expiry.
pub const EXPIRES_SOON_HEADER: &str = "x-session-expires-soon";

/// Bound on every outbound upstream call (token exchange and proxy).
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state, cloned per request.
///
/// Everything here is immutable after startup or internally
/// synchronized, matching the stateless-per-request model.
#[derive(Clone)]
pub struct AppState {
    /// Immutable service configuration.
    pub config: Arc<AppConfig>,
    /// The per-shop credential store.
    pub store: Arc<CredentialStore>,
    /// Seals and opens stored access tokens.
    pub cipher: CredentialCipher,
    /// Signs and verifies session assertions.
    pub codec: SessionTokenCodec,
    /// Shared HTTP client for all upstream calls.
    pub http: reqwest::Client,
}

// Verify AppState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
};

impl AppState {
    /// Builds the state from configuration and an opened store.
    ///
    /// Derives the sealing key and signing keys once, and configures
    /// the upstream client with a 10-second timeout. No retries; a
    /// failed install is retried by the merchant reloading the page.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the HTTP client cannot be
    /// constructed.
    pub fn new(config: AppConfig, store: CredentialStore) -> Result<Self, reqwest::Error> {
        let cipher = CredentialCipher::new(config.signing_secret());
        let codec = SessionTokenCodec::new(config.signing_secret());
        let http = reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            cipher,
            codec,
            http,
        })
    }
}

/// Builds the service router over `state`.
///
/// The page guard wraps only the dashboard routes; API routes run their
/// own guard chain inside the handler so they can answer with JSON
/// instead of a redirect.
pub fn router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/dashboard/{shop}", get(handlers::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::page_session_guard,
        ));

    Router::new()
        .route("/", get(handlers::landing))
        .route("/auth", get(handlers::auth_entry))
        .route("/auth/verify", post(handlers::verify_session))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .merge(pages)
        .with_state(state)
}
