//! Service configuration.
//!
//! Configuration is read once at process start, validated fail-fast, and
//! then shared immutably; nothing mutates it after startup. The main
//! types are:
//!
//! - [`AppConfig`]: the immutable configuration struct
//! - [`AppConfigBuilder`]: fluent construction, used directly in tests
//! - Validated newtypes: [`ApiKey`], [`ApiSecretKey`], [`SigningSecret`],
//!   [`ShopDomain`], [`Scopes`]
//!
//! # Example
//!
//! ```rust
//! use session_gate::{AppConfig, ApiKey, ApiSecretKey, SigningSecret};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .signing_secret(SigningSecret::new("session-secret").unwrap())
//!     .redirect_uri("https://myapp.example.com/auth")
//!     .build()
//!     .unwrap();
//!
//! assert!(!config.production());
//! ```

mod newtypes;

pub use newtypes::{ApiKey, ApiSecretKey, Scopes, ShopDomain, SigningSecret};

use crate::error::ConfigError;

/// Default OAuth scopes when the environment does not specify any.
const DEFAULT_SCOPES: &str = "read_products,write_products";

/// Immutable service configuration.
///
/// Holds the app credentials, the session signing secret (which also
/// serves as the credential-sealing master secret), the OAuth scopes and
/// redirect URI, and the production flag controlling the `Secure`
/// attribute on cookies.
///
/// # Thread Safety
///
/// `AppConfig` is `Clone`, `Send`, and `Sync`; the server shares one
/// instance behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    signing_secret: SigningSecret,
    scopes: Scopes,
    redirect_uri: String,
    production: bool,
    upstream_base: Option<String>,
}

impl AppConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Builds the configuration from environment variables.
    ///
    /// Recognized variables: `SHOPIFY_APP_API_KEY`, `SHOPIFY_APP_SECRET`,
    /// `SESSION_SIGNING_SECRET`, `REDIRECT_URI` (all required), `SCOPES`
    /// (defaults to `read_products,write_products`) and `APP_ENV`
    /// (`production` enables secure cookies).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for any absent required
    /// variable, or the relevant validation error for a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let require = |var: &'static str| {
            std::env::var(var).map_err(|_| ConfigError::MissingEnvVar { var })
        };

        let api_key = ApiKey::new(require("SHOPIFY_APP_API_KEY")?)?;
        let api_secret_key = ApiSecretKey::new(require("SHOPIFY_APP_SECRET")?)?;
        let signing_secret = SigningSecret::new(require("SESSION_SIGNING_SECRET")?)?;
        let redirect_uri = require("REDIRECT_URI")?;
        let scopes =
            Scopes::new(std::env::var("SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()))?;
        let production = std::env::var("APP_ENV").as_deref() == Ok("production");

        Self::builder()
            .api_key(api_key)
            .api_secret_key(api_secret_key)
            .signing_secret(signing_secret)
            .scopes(scopes)
            .redirect_uri(redirect_uri)
            .production(production)
            .build()
    }

    /// Returns the app API key (OAuth `client_id`).
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the app shared secret.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the session signing secret.
    #[must_use]
    pub const fn signing_secret(&self) -> &SigningSecret {
        &self.signing_secret
    }

    /// Returns the OAuth scope list.
    #[must_use]
    pub const fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Returns the OAuth redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns whether the service runs in production mode.
    ///
    /// Production mode sets the `Secure` attribute on every cookie.
    #[must_use]
    pub const fn production(&self) -> bool {
        self.production
    }

    /// Returns the base URL for upstream calls to the given shop.
    ///
    /// Normally `https://{shop}`; tests override this through
    /// [`AppConfigBuilder::upstream_base`] to point at a mock server.
    #[must_use]
    pub fn upstream_base_for(&self, shop: &ShopDomain) -> String {
        self.upstream_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", shop.as_ref()))
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for [`AppConfig`].
///
/// Required fields: `api_key`, `api_secret_key`, `signing_secret`,
/// `redirect_uri`. Scopes default to `read_products,write_products`;
/// production defaults to `false`.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    signing_secret: Option<SigningSecret>,
    scopes: Option<Scopes>,
    redirect_uri: Option<String>,
    production: bool,
    upstream_base: Option<String>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the app API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the app shared secret (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the session signing secret (required).
    #[must_use]
    pub fn signing_secret(mut self, secret: SigningSecret) -> Self {
        self.signing_secret = Some(secret);
        self
    }

    /// Sets the OAuth scope list.
    #[must_use]
    pub fn scopes(mut self, scopes: Scopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the OAuth redirect URI (required).
    #[must_use]
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sets production mode (secure cookies).
    #[must_use]
    pub const fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Overrides the upstream base URL for every shop.
    ///
    /// Intended for tests, where a mock server stands in for the
    /// `https://{shop}` authority.
    #[must_use]
    pub fn upstream_base(mut self, base: impl Into<String>) -> Self {
        self.upstream_base = Some(base.into());
        self
    }

    /// Builds the [`AppConfig`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] for an unset required
    /// field, or [`ConfigError::InvalidRedirectUri`] for a redirect URI
    /// without a scheme.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let signing_secret = self
            .signing_secret
            .ok_or(ConfigError::MissingRequiredField {
                field: "signing_secret",
            })?;
        let redirect_uri = self
            .redirect_uri
            .ok_or(ConfigError::MissingRequiredField {
                field: "redirect_uri",
            })?;

        if !redirect_uri.contains("://") {
            return Err(ConfigError::InvalidRedirectUri { uri: redirect_uri });
        }

        let scopes = match self.scopes {
            Some(scopes) => scopes,
            None => Scopes::new(DEFAULT_SCOPES)?,
        };

        Ok(AppConfig {
            api_key,
            api_secret_key,
            signing_secret,
            scopes,
            redirect_uri,
            production: self.production,
            upstream_base: self.upstream_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> AppConfigBuilder {
        AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .signing_secret(SigningSecret::new("signing").unwrap())
            .redirect_uri("https://myapp.example.com/auth")
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = AppConfig::builder()
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .signing_secret(SigningSecret::new("signing").unwrap())
            .redirect_uri("https://myapp.example.com/auth")
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "api_key" })
        ));
    }

    #[test]
    fn test_builder_requires_signing_secret() {
        let result = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .redirect_uri("https://myapp.example.com/auth")
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "signing_secret"
            })
        ));
    }

    #[test]
    fn test_builder_rejects_relative_redirect_uri() {
        let result = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .signing_secret(SigningSecret::new("signing").unwrap())
            .redirect_uri("/auth")
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidRedirectUri { .. })));
    }

    #[test]
    fn test_builder_provides_default_scopes() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.scopes().as_ref(), "read_products,write_products");
        assert!(!config.production());
    }

    #[test]
    fn test_upstream_base_defaults_to_shop_host() {
        let config = base_builder().build().unwrap();
        let shop = ShopDomain::new("foo").unwrap();
        assert_eq!(
            config.upstream_base_for(&shop),
            "https://foo.myshopify.com"
        );
    }

    #[test]
    fn test_upstream_base_override_wins() {
        let config = base_builder()
            .upstream_base("http://127.0.0.1:4000")
            .build()
            .unwrap();
        let shop = ShopDomain::new("foo").unwrap();
        assert_eq!(config.upstream_base_for(&shop), "http://127.0.0.1:4000");
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppConfig>();
    }
}
