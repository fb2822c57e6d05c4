//! CSRF nonce for the OAuth round trip.
//!
//! When an install begins, the service mints an [`InstallNonce`], sends
//! it to the platform as the `state` parameter, and parks a copy in an
//! `HttpOnly` cookie on the merchant's browser. The callback is accepted
//! only when the returned `state` matches the cookie copy.

use rand::RngCore;
use std::fmt;

/// A single-use CSRF token bridging install-start and install-callback.
///
/// The value is 32 random bytes, hex-encoded to 64 characters, so it is
/// safe to place in a URL or cookie without further encoding.
///
/// # Example
///
/// ```rust
/// use session_gate::auth::InstallNonce;
///
/// let nonce = InstallNonce::new();
/// assert_eq!(nonce.as_ref().len(), 64);
/// assert!(nonce.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallNonce(String);

// Verify InstallNonce is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InstallNonce>();
};

impl InstallNonce {
    /// Number of random bytes behind each nonce.
    const NONCE_BYTES: usize = 32;

    /// Mints a fresh nonce from the thread-local CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a nonce value received back from the browser.
    ///
    /// No validation happens here; the only meaningful check is the
    /// constant-time comparison against the callback's `state` value.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl Default for InstallNonce {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstallNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstallNonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
