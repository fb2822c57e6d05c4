//! Validated newtype wrappers for configuration values.
//!
//! Every value that crosses a trust boundary (credentials from the
//! environment, shop domains from query parameters) gets a newtype that
//! validates on construction, so the rest of the service never handles a
//! raw, unchecked string.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The app's public API key (OAuth `client_id`).
///
/// # Example
///
/// ```rust
/// use session_gate::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The app's shared secret, used to verify install-callback HMAC
/// signatures and to authenticate the code exchange.
///
/// The `Debug` implementation masks the value so secrets never leak into
/// logs or panic messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the secret is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// The secret used to sign session assertions and to derive the
/// credential-sealing key.
///
/// One value covers both concerns, matching the deployment contract this
/// service replaces. Masked in `Debug` output like [`ApiSecretKey`].
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Creates a new validated signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySigningSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySigningSecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for SigningSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(*****)")
    }
}

/// A validated merchant shop domain, the tenant key used everywhere.
///
/// Accepts either the short store name (`my-store`, normalized to
/// `my-store.myshopify.com`) or the full canonical domain. Anything else
/// is rejected; shop values arrive in untrusted query strings and end up
/// inside upstream URLs, so the charset is strict.
///
/// # Example
///
/// ```rust
/// use session_gate::ShopDomain;
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myshopify.com");
///
/// let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
/// assert_eq!(shop.shop_name(), "my-store");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopDomain(String);

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is not a
    /// well-formed `*.myshopify.com` host.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();
        if domain.is_empty() {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        let full = if let Some(name) = domain.strip_suffix(Self::SUFFIX) {
            if !Self::is_valid_shop_name(name) {
                return Err(ConfigError::InvalidShopDomain { domain });
            }
            domain
        } else if domain.contains('.') {
            // A dotted host that is not under myshopify.com is not a shop.
            return Err(ConfigError::InvalidShopDomain { domain });
        } else {
            if !Self::is_valid_shop_name(&domain) {
                return Err(ConfigError::InvalidShopDomain { domain });
            }
            format!("{domain}{}", Self::SUFFIX)
        };

        Ok(Self(full))
    }

    /// Returns the store name portion, e.g. `my-store` for
    /// `my-store.myshopify.com`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0
            .strip_suffix(Self::SUFFIX)
            .unwrap_or(&self.0)
    }

    fn is_valid_shop_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// The comma-separated OAuth scope list requested at install time.
///
/// # Example
///
/// ```rust
/// use session_gate::Scopes;
///
/// let scopes = Scopes::new("read_products,write_products").unwrap();
/// assert_eq!(scopes.as_ref(), "read_products,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scopes(String);

impl Scopes {
    /// Creates a validated scope list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScopes`] if the list is empty or
    /// contains whitespace (scope lists are passed verbatim into the
    /// authorize URL).
    pub fn new(scopes: impl Into<String>) -> Result<Self, ConfigError> {
        let scopes = scopes.into();
        if scopes.is_empty() {
            return Err(ConfigError::InvalidScopes {
                reason: "scope list cannot be empty".to_string(),
            });
        }
        if scopes.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidScopes {
                reason: "scope list must not contain whitespace".to_string(),
            });
        }
        Ok(Self(scopes))
    }
}

impl AsRef<str> for Scopes {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        let result = ApiKey::new("");
        assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_secret_key_masks_value_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        let debug_output = format!("{secret:?}");
        assert_eq!(debug_output, "ApiSecretKey(*****)");
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_signing_secret_masks_value_in_debug() {
        let secret = SigningSecret::new("jwt-master-secret").unwrap();
        let debug_output = format!("{secret:?}");
        assert_eq!(debug_output, "SigningSecret(*****)");
        assert!(!debug_output.contains("jwt-master-secret"));
    }

    #[test]
    fn test_signing_secret_rejects_empty() {
        assert!(matches!(
            SigningSecret::new(""),
            Err(ConfigError::EmptySigningSecret)
        ));
    }

    #[test]
    fn test_shop_domain_normalizes_short_format() {
        let domain = ShopDomain::new("my-store").unwrap();
        assert_eq!(domain.as_ref(), "my-store.myshopify.com");
        assert_eq!(domain.shop_name(), "my-store");
    }

    #[test]
    fn test_shop_domain_accepts_full_format() {
        let domain = ShopDomain::new("my-store.myshopify.com").unwrap();
        assert_eq!(domain.as_ref(), "my-store.myshopify.com");
        assert_eq!(domain.shop_name(), "my-store");
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("my store").is_err());
        assert!(ShopDomain::new("my_store").is_err());
        assert!(ShopDomain::new("MY-STORE").is_ok()); // normalized to lowercase
        assert!(ShopDomain::new("-my-store").is_err());
        assert!(ShopDomain::new("my-store-").is_err());
        assert!(ShopDomain::new("my-store.otherdomain.com").is_err());
        assert!(ShopDomain::new("evil.com/..;.myshopify.com").is_err());
    }

    #[test]
    fn test_shop_domain_serializes_to_string() {
        let domain = ShopDomain::new("my-store").unwrap();
        let json = serde_json::to_string(&domain).unwrap();
        assert_eq!(json, r#""my-store.myshopify.com""#);
    }

    #[test]
    fn test_shop_domain_deserializes_and_validates() {
        let domain: ShopDomain =
            serde_json::from_str(r#""test-shop.myshopify.com""#).unwrap();
        assert_eq!(domain.shop_name(), "test-shop");

        let bad: Result<ShopDomain, _> = serde_json::from_str(r#""not a domain""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_scopes_rejects_empty_and_whitespace() {
        assert!(Scopes::new("").is_err());
        assert!(Scopes::new("read_products, write_products").is_err());
        assert!(Scopes::new("read_products,write_products").is_ok());
    }
}
