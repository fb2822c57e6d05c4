//! HMAC verification for install callbacks.
//!
//! Every request arriving on the install entry point carries an `hmac`
//! query parameter signed by the platform with the app's shared secret.
//! Verification reconstructs the canonical message from the remaining
//! parameters and compares signatures in constant time.
//!
//! # Canonical message
//!
//! The message is every query parameter except `hmac` and `signature`,
//! sorted lexicographically by key and joined as `key=value` pairs with
//! `&`. Values are used verbatim, without re-encoding.
//!
//! # Example
//!
//! ```rust
//! use session_gate::auth::hmac::compute_signature;
//!
//! let message = "code=abc123&shop=example.myshopify.com&state=xyz";
//! let signature = compute_signature(message, "my-api-secret");
//! assert_eq!(signature.len(), 64);
//! assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

use crate::config::ApiSecretKey;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters stripped before the canonical message is built.
const EXCLUDED_PARAMS: [&str; 2] = ["hmac", "signature"];

/// Computes an HMAC-SHA256 signature for the given message.
///
/// The signature is returned as a lowercase hexadecimal string, the
/// format the platform uses for callback signatures.
///
/// # Note
///
/// This function uses `expect()` internally but this will never panic
/// because HMAC-SHA256 accepts keys of any length.
///
/// # Example
///
/// ```rust
/// use session_gate::auth::hmac::compute_signature;
///
/// let sig = compute_signature("test-message", "secret-key");
/// assert_eq!(sig.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

/// Performs constant-time comparison of two strings.
///
/// Used for every security-sensitive comparison in the service: callback
/// signatures, nonce checks, and session shop binding.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // ConstantTimeEq handles different lengths securely
    a_bytes.ct_eq(b_bytes).into()
}

/// Builds the canonical signable message from callback query parameters.
///
/// Excludes `hmac` and `signature`, sorts the remaining keys
/// lexicographically, and joins `key=value` pairs with `&`.
#[must_use]
pub fn signable_message(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| !EXCLUDED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Verifies the `hmac` parameter of an install callback.
///
/// Fails closed: an absent or empty `hmac` parameter never verifies.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use session_gate::auth::hmac::{compute_signature, verify_callback_signature};
/// use session_gate::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("test-secret").unwrap();
/// let mut params = BTreeMap::new();
/// params.insert("shop".to_string(), "example.myshopify.com".to_string());
/// let sig = compute_signature("shop=example.myshopify.com", "test-secret");
/// params.insert("hmac".to_string(), sig);
///
/// assert!(verify_callback_signature(&params, &secret));
/// ```
#[must_use]
pub fn verify_callback_signature(params: &BTreeMap<String, String>, secret: &ApiSecretKey) -> bool {
    let Some(received) = params.get("hmac") else {
        return false;
    };
    if received.is_empty() {
        return false;
    }

    let message = signable_message(params);
    let computed = compute_signature(&message, secret.as_ref());
    constant_time_compare(&computed, received)
}
