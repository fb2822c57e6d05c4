//! OAuth installation and session management for an embedded Shopify
//! app.
//!
//! The service owns four trust mechanisms and the HTTP surface that
//! exercises them:
//!
//! - **Install handshake** ([`oauth`]): HMAC-verified install entry,
//!   CSRF nonce round trip, and the code-for-token exchange.
//! - **Credential custody** ([`auth::cipher`], [`store`]): upstream
//!   access tokens are sealed with AES-256-CBC under a key derived from
//!   the master secret and stored one row per shop.
//! - **Sessions** ([`auth::session_token`], [`guard`]): HS256-signed
//!   assertions binding a shop to a 24-hour expiry, enforced on every
//!   protected request with a near-expiry warning signal.
//! - **Product proxy** ([`proxy`]): guarded pass-through to the shop's
//!   admin product API.
//!
//! # Example
//!
//! ```rust,no_run
//! use session_gate::{AppConfig, AppState, router};
//! use session_gate::store::CredentialStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let store = CredentialStore::open("sessions.db")?;
//! let state = AppState::new(config, store)?;
//! let app = router(state);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod oauth;
pub mod proxy;
pub mod server;
pub mod store;

pub use config::{
    ApiKey, ApiSecretKey, AppConfig, AppConfigBuilder, Scopes, ShopDomain, SigningSecret,
};
pub use error::ConfigError;
pub use server::{router, AppState};
