//! Signed session assertions for the embedded UI.
//!
//! After a successful install the service hands the browser a compact
//! HS256-signed token binding a shop domain to an expiry instant. The
//! codec here only signs and verifies; expiry enforcement is a policy
//! decision that belongs to the request guard, so [`SessionTokenCodec::verify`]
//! surfaces the raw claims even when they are already past expiry.
//!
//! # Example
//!
//! ```rust
//! use session_gate::auth::SessionTokenCodec;
//! use session_gate::{ShopDomain, SigningSecret};
//!
//! let codec = SessionTokenCodec::new(&SigningSecret::new("secret").unwrap());
//! let shop = ShopDomain::new("example").unwrap();
//!
//! let token = codec.issue(&shop).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.shop, "example.myshopify.com");
//! ```

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ShopDomain, SigningSecret};

/// Session lifetime in seconds (24 hours).
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// How close to expiry a session counts as "expiring soon" (5 minutes).
pub const EXPIRY_WARNING_SECS: i64 = 5 * 60;

/// The claims carried by a session assertion.
///
/// `shop` is the full canonical shop domain; `exp` is Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The shop domain this session is bound to.
    pub shop: String,
    /// Expiry instant, Unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Whether the session is past expiry at `now` (Unix seconds).
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Whether the session expires within the warning window at `now`.
    ///
    /// An already-expired session also reports `true`; callers check
    /// [`is_expired`](Self::is_expired) first.
    #[must_use]
    pub const fn expires_soon(&self, now: i64) -> bool {
        self.exp - now <= EXPIRY_WARNING_SECS
    }
}

/// Errors from signing or verifying a session assertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    /// The token's signature does not verify under the signing secret.
    #[error("session token signature is invalid")]
    SignatureInvalid,

    /// The token is structurally broken (wrong segment count, bad
    /// base64, claims that do not deserialize).
    #[error("session token is malformed")]
    Malformed,

    /// The claims could not be serialized during signing.
    #[error("session token could not be signed")]
    Signing,
}

/// Signs and verifies session assertions with HS256.
///
/// # Thread Safety
///
/// `SessionTokenCodec` is `Send + Sync` and is shared through
/// application state.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

// Verify SessionTokenCodec is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionTokenCodec>();
};

impl SessionTokenCodec {
    /// Creates a codec keyed by the signing secret.
    #[must_use]
    pub fn new(secret: &SigningSecret) -> Self {
        let bytes = secret.as_ref().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Issues a fresh assertion for `shop`, expiring in 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError::Signing`] if the claims cannot be
    /// serialized, which does not happen for well-formed claims.
    pub fn issue(&self, shop: &ShopDomain) -> Result<String, SessionTokenError> {
        self.issue_expiring_at(shop, Utc::now().timestamp() + SESSION_TTL_SECS)
    }

    /// Issues an assertion with an explicit expiry instant.
    ///
    /// The request-path caller always uses [`issue`](Self::issue); this
    /// entry point exists so expiry-window behavior can be exercised
    /// deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError::Signing`] if the claims cannot be
    /// serialized.
    pub fn issue_expiring_at(
        &self,
        shop: &ShopDomain,
        exp: i64,
    ) -> Result<String, SessionTokenError> {
        let claims = SessionClaims {
            shop: shop.as_ref().to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| SessionTokenError::Signing)
    }

    /// Verifies signature and shape, returning the raw claims.
    ///
    /// Expiry is NOT enforced here. The guard owns expiry policy and
    /// needs the claims of an expired token to distinguish "expired"
    /// from "forged" in its logs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError::SignatureInvalid`] for a bad
    /// signature and [`SessionTokenError::Malformed`] for anything that
    /// is not a well-formed token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Err(SessionTokenError::SignatureInvalid)
                }
                _ => Err(SessionTokenError::Malformed),
            },
        }
    }
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionTokenCodec(*****)")
    }
}
