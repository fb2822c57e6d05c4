//! The per-request session guard.
//!
//! Every protected endpoint runs the same chain before any work
//! happens: extract the presented credentials, verify the token
//! signature, enforce expiry, bind the token to the claimed shop in
//! constant time, then load and unseal the stored credential.
//!
//! Internally the chain distinguishes seven failure modes so operators
//! can see exactly what went wrong; externally every failure collapses
//! to one of two 401 messages, so a probing client learns nothing about
//! which check failed.

pub mod extract;

pub use extract::{presented, PresentedCredentials, SHOP_DOMAIN_HEADER};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::auth::hmac::constant_time_compare;
use crate::auth::{CipherError, CredentialCipher, SessionClaims, SessionTokenCodec, SessionTokenError};
use crate::config::ShopDomain;
use crate::error::ConfigError;
use crate::store::{CredentialStore, StoreError};

/// External message for requests that presented no credentials at all.
const MSG_MISSING: &str = "Missing authentication credentials";
/// External message for every other authentication failure.
const MSG_INVALID: &str = "Invalid session token";

/// Why a request failed authentication.
///
/// The variants exist for logs and tests; the HTTP surface only ever
/// shows [`AuthError::external_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token or no shop was presented.
    #[error("no session credentials presented")]
    MissingCredentials,

    /// The presented shop is not a well-formed shop domain.
    #[error("presented shop domain is invalid: {0}")]
    InvalidShop(#[from] ConfigError),

    /// The token failed signature or shape verification.
    #[error("session token rejected: {0}")]
    InvalidToken(#[from] SessionTokenError),

    /// The token verified but is past expiry.
    #[error("session token is expired")]
    Expired,

    /// The token is bound to a different shop than the one presented.
    #[error("session token is bound to a different shop")]
    ShopMismatch,

    /// No credential is stored for the shop (app not installed).
    #[error("no credential stored for shop")]
    NotInstalled,

    /// The credential store failed.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// The stored credential could not be unsealed.
    #[error("stored credential is unusable: {0}")]
    Credential(#[from] CipherError),
}

impl AuthError {
    /// The deliberately coarse message shown to clients.
    #[must_use]
    pub const fn external_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => MSG_MISSING,
            _ => MSG_INVALID,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(reason = %self, "request failed authentication");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": self.external_message() })),
        )
            .into_response()
    }
}

/// A session that passed signature, expiry, and shop-binding checks.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    /// The validated shop domain.
    pub shop: ShopDomain,
    /// The verified claims.
    pub claims: SessionClaims,
    /// Whether the session expires within the warning window.
    pub expires_soon: bool,
}

/// A verified session plus the unsealed upstream credential.
#[derive(Debug, Clone)]
pub struct AuthorizedSession {
    /// The validated shop domain.
    pub shop: ShopDomain,
    /// The plaintext upstream access token, held only for this request.
    pub access_token: String,
    /// Whether the session expires within the warning window.
    pub expires_soon: bool,
}

/// Runs the session-only half of the guard chain.
///
/// Validates the presented shop, verifies the token, enforces expiry,
/// and binds the token's shop claim to the presented shop in constant
/// time. Used directly by page navigations, which need a valid session
/// but no upstream credential.
///
/// # Errors
///
/// Returns the specific [`AuthError`] for the first check that fails.
pub fn verify_session(
    codec: &SessionTokenCodec,
    creds: &PresentedCredentials,
) -> Result<VerifiedSession, AuthError> {
    let shop = ShopDomain::new(creds.shop.clone())?;
    let claims = codec.verify(&creds.token)?;

    let now = Utc::now().timestamp();
    if claims.is_expired(now) {
        return Err(AuthError::Expired);
    }
    if !constant_time_compare(&claims.shop, shop.as_ref()) {
        return Err(AuthError::ShopMismatch);
    }

    let expires_soon = claims.expires_soon(now);
    Ok(VerifiedSession {
        shop,
        claims,
        expires_soon,
    })
}

/// Runs the full guard chain, ending with an unsealed credential.
///
/// # Errors
///
/// Everything [`verify_session`] returns, plus [`AuthError::NotInstalled`]
/// when no credential row exists, [`AuthError::Store`] on storage
/// failure, and [`AuthError::Credential`] when the stored value cannot
/// be unsealed.
pub fn authorize(
    codec: &SessionTokenCodec,
    cipher: &CredentialCipher,
    store: &CredentialStore,
    creds: &PresentedCredentials,
) -> Result<AuthorizedSession, AuthError> {
    let session = verify_session(codec, creds)?;

    let row = store
        .fetch(&session.shop)?
        .ok_or(AuthError::NotInstalled)?;
    let access_token = cipher.open(&row.sealed_token)?;

    Ok(AuthorizedSession {
        shop: session.shop,
        access_token,
        expires_soon: session.expires_soon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session_token::EXPIRY_WARNING_SECS;
    use crate::config::SigningSecret;

    fn codec() -> SessionTokenCodec {
        SessionTokenCodec::new(&SigningSecret::new("guard-secret").unwrap())
    }

    fn cipher() -> CredentialCipher {
        CredentialCipher::new(&SigningSecret::new("guard-secret").unwrap())
    }

    fn creds(token: &str, shop: &str) -> PresentedCredentials {
        PresentedCredentials {
            token: token.to_string(),
            shop: shop.to_string(),
        }
    }

    #[test]
    fn test_verify_session_accepts_valid_pair() {
        let codec = codec();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec.issue(&shop).unwrap();

        let session = verify_session(&codec, &creds(&token, "guard-shop.myshopify.com")).unwrap();
        assert_eq!(session.shop, shop);
        assert!(!session.expires_soon);
    }

    #[test]
    fn test_verify_session_rejects_expired_token() {
        let codec = codec();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec
            .issue_expiring_at(&shop, Utc::now().timestamp() - 10)
            .unwrap();

        let err = verify_session(&codec, &creds(&token, "guard-shop.myshopify.com")).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert_eq!(err.external_message(), "Invalid session token");
    }

    #[test]
    fn test_verify_session_rejects_shop_mismatch() {
        let codec = codec();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec.issue(&shop).unwrap();

        let err = verify_session(&codec, &creds(&token, "other-shop.myshopify.com")).unwrap_err();
        assert!(matches!(err, AuthError::ShopMismatch));
    }

    #[test]
    fn test_verify_session_rejects_invalid_shop_value() {
        let codec = codec();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec.issue(&shop).unwrap();

        let err = verify_session(&codec, &creds(&token, "evil.com")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidShop(_)));
    }

    #[test]
    fn test_verify_session_flags_near_expiry() {
        let codec = codec();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec
            .issue_expiring_at(&shop, Utc::now().timestamp() + EXPIRY_WARNING_SECS - 30)
            .unwrap();

        let session = verify_session(&codec, &creds(&token, "guard-shop.myshopify.com")).unwrap();
        assert!(session.expires_soon);
    }

    #[test]
    fn test_authorize_returns_unsealed_credential() {
        let codec = codec();
        let cipher = cipher();
        let store = CredentialStore::open_in_memory().unwrap();
        let shop = ShopDomain::new("guard-shop").unwrap();

        store
            .upsert(&shop, &cipher.seal("shpat_guard_token"))
            .unwrap();
        let token = codec.issue(&shop).unwrap();

        let session = authorize(
            &codec,
            &cipher,
            &store,
            &creds(&token, "guard-shop.myshopify.com"),
        )
        .unwrap();
        assert_eq!(session.access_token, "shpat_guard_token");
    }

    #[test]
    fn test_authorize_rejects_uninstalled_shop() {
        let codec = codec();
        let store = CredentialStore::open_in_memory().unwrap();
        let shop = ShopDomain::new("guard-shop").unwrap();
        let token = codec.issue(&shop).unwrap();

        let err = authorize(
            &codec,
            &cipher(),
            &store,
            &creds(&token, "guard-shop.myshopify.com"),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::NotInstalled));
        assert_eq!(err.external_message(), "Invalid session token");
    }

    #[test]
    fn test_authorize_rejects_corrupt_stored_credential() {
        let codec = codec();
        let store = CredentialStore::open_in_memory().unwrap();
        let shop = ShopDomain::new("guard-shop").unwrap();

        store.upsert(&shop, "not-a-sealed-credential").unwrap();
        let token = codec.issue(&shop).unwrap();

        let err = authorize(
            &codec,
            &cipher(),
            &store,
            &creds(&token, "guard-shop.myshopify.com"),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
    }

    #[test]
    fn test_missing_credentials_message_differs() {
        assert_eq!(
            AuthError::MissingCredentials.external_message(),
            "Missing authentication credentials"
        );
        assert_eq!(
            AuthError::ShopMismatch.external_message(),
            "Invalid session token"
        );
    }
}
