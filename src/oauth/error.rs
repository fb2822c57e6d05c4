//! Error types for the install handshake.

use serde_json::Value;
use thiserror::Error;

/// Errors produced while driving the OAuth handshake.
///
/// Each variant maps to a specific HTTP response on the install
/// endpoints; the conversion lives with the handlers.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The install request carried no `shop` parameter.
    #[error("Missing shop parameter")]
    MissingShop,

    /// The `shop` parameter is not a well-formed shop domain.
    #[error("Invalid shop parameter")]
    InvalidShop(#[from] crate::error::ConfigError),

    /// The callback's `hmac` parameter did not verify.
    #[error("HMAC validation failed")]
    HmacInvalid,

    /// The callback's `state` did not match the nonce cookie, or the
    /// cookie was absent.
    #[error("Invalid state parameter")]
    StateMismatch,

    /// The exchange response parsed but carried no access token.
    ///
    /// The full upstream body is preserved as the diagnostic.
    #[error("Failed to retrieve access token")]
    TokenMissing {
        /// The upstream response body, verbatim.
        details: Value,
    },

    /// The exchange request itself failed (network, timeout, or an
    /// unparseable response).
    #[error("Error fetching access token")]
    Upstream {
        /// Human-readable transport diagnostic.
        details: String,
    },
}
