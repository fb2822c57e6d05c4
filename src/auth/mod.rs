//! Cryptographic primitives for the install handshake and session layer.
//!
//! Everything here is pure computation over in-memory values; no I/O.
//! The submodules cover the four trust mechanisms the service relies on:
//!
//! - [`hmac`]: install-callback signature verification
//! - [`nonce`]: CSRF state for the OAuth round trip
//! - [`cipher`]: sealing upstream access tokens at rest
//! - [`session_token`]: signed session assertions handed to the embedded UI

pub mod cipher;
pub mod hmac;
pub mod nonce;
pub mod session_token;

pub use cipher::{CipherError, CredentialCipher};
pub use hmac::{compute_signature, constant_time_compare, verify_callback_signature};
pub use nonce::InstallNonce;
pub use session_token::{SessionClaims, SessionTokenCodec, SessionTokenError};
