//! Startup configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that a
//! misconfigured process fails at startup instead of at the first request.
//! Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use session_gate::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building the service configuration.
///
/// Each variant carries enough detail to tell the operator exactly which
/// value must be fixed before the process will start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// App API key cannot be empty.
    #[error("App API key cannot be empty. Set SHOPIFY_APP_API_KEY to the key from your app dashboard.")]
    EmptyApiKey,

    /// App shared secret cannot be empty.
    #[error("App shared secret cannot be empty. Set SHOPIFY_APP_SECRET to the secret from your app dashboard.")]
    EmptyApiSecretKey,

    /// Session signing secret cannot be empty.
    #[error("Session signing secret cannot be empty. Set SESSION_SIGNING_SECRET to a long random value.")]
    EmptySigningSecret,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Redirect URI is invalid.
    #[error("Invalid redirect URI '{uri}'. Provide an absolute URL with a scheme (e.g. 'https://myapp.example.com/auth').")]
    InvalidRedirectUri {
        /// The invalid URI that was provided.
        uri: String,
    },

    /// OAuth scopes are invalid.
    #[error("Invalid OAuth scopes: {reason}")]
    InvalidScopes {
        /// Why the scope list was rejected.
        reason: String,
    },

    /// A required field was never set on the builder.
    #[error("Missing required configuration: '{field}'. This value must be set before the service can start.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A required environment variable is absent.
    #[error("Missing required environment variable: '{var}'.")]
    MissingEnvVar {
        /// The name of the missing variable.
        var: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_error_message() {
        let error = ConfigError::EmptyApiKey;
        let message = error.to_string();
        assert!(message.contains("App API key cannot be empty"));
        assert!(message.contains("SHOPIFY_APP_API_KEY"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("Expected format"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "api_key" };
        let message = error.to_string();
        assert!(message.contains("api_key"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_missing_env_var_error_message() {
        let error = ConfigError::MissingEnvVar { var: "REDIRECT_URI" };
        assert!(error.to_string().contains("REDIRECT_URI"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyApiKey;
        let _: &dyn std::error::Error = &error;
    }
}
