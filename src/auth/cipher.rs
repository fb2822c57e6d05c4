//! Sealing upstream access tokens at rest.
//!
//! Access tokens are never stored in the clear. [`CredentialCipher`]
//! derives a 256-bit key from the configured master secret once at
//! construction, then seals each token with AES-256-CBC under a fresh
//! random IV.
//!
//! # Sealed format
//!
//! `hex(iv) || hex(ciphertext)`: the first 32 hex characters are the
//! 16-byte IV, the remainder is the PKCS#7-padded ciphertext. Both halves
//! are lowercase hex, so a sealed credential is plain ASCII and fits a
//! TEXT column unchanged.
//!
//! # Example
//!
//! ```rust
//! use session_gate::auth::CredentialCipher;
//! use session_gate::SigningSecret;
//!
//! let secret = SigningSecret::new("master-secret").unwrap();
//! let cipher = CredentialCipher::new(&secret);
//!
//! let sealed = cipher.seal("shpat_example_token");
//! assert_ne!(sealed, "shpat_example_token");
//! assert_eq!(cipher.open(&sealed).unwrap(), "shpat_example_token");
//! ```

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

use crate::config::SigningSecret;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
/// Hex characters occupied by the IV prefix of a sealed credential.
const IV_HEX_LEN: usize = IV_LEN * 2;

/// Fixed KDF salt. The master secret is the sole secret input; the salt
/// only separates this derivation from other uses of the same secret.
const KDF_SALT: &[u8] = b"salt";
const KDF_ITERATIONS: u32 = 100_000;

/// Errors surfaced when opening a sealed credential.
///
/// All of these indicate a corrupt or foreign stored value; callers
/// treat them uniformly as an unusable credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The sealed value is shorter than the IV prefix.
    #[error("sealed credential is too short to contain an IV")]
    TooShort,

    /// The sealed value is not valid hexadecimal.
    #[error("sealed credential is not valid hex")]
    InvalidHex,

    /// Decryption failed (wrong key or corrupted ciphertext).
    #[error("sealed credential could not be decrypted")]
    DecryptFailed,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted credential is not valid UTF-8")]
    InvalidPlaintext,
}

/// Seals and opens upstream access tokens with a key derived from the
/// master secret.
///
/// Key derivation runs once, at construction; sealing and opening are
/// then cheap enough for the request path.
///
/// # Thread Safety
///
/// `CredentialCipher` is `Send + Sync`; the server builds one and shares
/// it through application state.
#[derive(Clone)]
pub struct CredentialCipher {
    key: [u8; KEY_LEN],
}

// Verify CredentialCipher is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CredentialCipher>();
};

impl CredentialCipher {
    /// Derives the sealing key from the master secret.
    ///
    /// Deliberately slow (PBKDF2-HMAC-SHA256), so construct once at
    /// startup rather than per request.
    #[must_use]
    pub fn new(secret: &SigningSecret) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(secret.as_ref().as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);
        Self { key }
    }

    /// Seals a plaintext access token.
    ///
    /// Every call draws a fresh random IV, so sealing the same token
    /// twice yields different outputs.
    #[must_use]
    pub fn seal(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new(&self.key.into(), &iv.into());
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut sealed = String::with_capacity(IV_HEX_LEN + ciphertext.len() * 2);
        sealed.push_str(&hex::encode(iv));
        sealed.push_str(&hex::encode(ciphertext));
        sealed
    }

    /// Opens a sealed credential back to the plaintext token.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the sealed value is truncated, not
    /// hex, fails decryption, or decrypts to non-UTF-8 bytes.
    pub fn open(&self, sealed: &str) -> Result<String, CipherError> {
        if sealed.len() <= IV_HEX_LEN {
            return Err(CipherError::TooShort);
        }

        let (iv_hex, ct_hex) = sealed.split_at(IV_HEX_LEN);
        let iv = hex::decode(iv_hex).map_err(|_| CipherError::InvalidHex)?;
        let ciphertext = hex::decode(ct_hex).map_err(|_| CipherError::InvalidHex)?;

        let cipher = Aes256CbcDec::new_from_slices(&self.key, &iv)
            .map_err(|_| CipherError::DecryptFailed)?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CipherError::DecryptFailed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidPlaintext)
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialCipher(*****)")
    }
}
