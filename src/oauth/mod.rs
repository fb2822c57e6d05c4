//! The OAuth install handshake.
//!
//! Two halves, matching the two visits the platform makes to the install
//! endpoint:
//!
//! 1. **Install start**: the merchant arrives with `shop` (and a signed
//!    query). The service mints a nonce and redirects to the platform's
//!    authorize page via [`authorize_url`].
//! 2. **Install callback**: the platform returns with `code` and the
//!    echoed `state`. After the CSRF check, [`exchange_code`] swaps the
//!    code for a permanent access token.
//!
//! HMAC and nonce verification are pure functions in [`crate::auth`];
//! this module owns URL construction and the one network call in the
//! handshake.

pub mod error;

pub use error::OAuthError;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AppConfig, ShopDomain};

/// Body of the code-for-token exchange request.
#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Builds the platform authorize URL the merchant is redirected to.
///
/// The scope list and redirect URI are percent-encoded; the nonce rides
/// in `state` and comes back verbatim on the callback. The
/// `grant_options[]=per-user` parameter requests an online-mode grant.
///
/// # Example
///
/// ```rust
/// use session_gate::oauth::authorize_url;
/// use session_gate::{ApiKey, ApiSecretKey, AppConfig, ShopDomain, SigningSecret};
/// use session_gate::auth::InstallNonce;
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("client-id").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .signing_secret(SigningSecret::new("signing").unwrap())
///     .redirect_uri("https://myapp.example.com/auth")
///     .build()
///     .unwrap();
/// let shop = ShopDomain::new("example").unwrap();
/// let nonce = InstallNonce::new();
///
/// let url = authorize_url(&config, &shop, nonce.as_ref());
/// assert!(url.starts_with("https://example.myshopify.com/admin/oauth/authorize?"));
/// assert!(url.contains("client_id=client-id"));
/// assert!(url.contains("grant_options%5B%5D=per-user") || url.contains("grant_options[]=per-user"));
/// ```
#[must_use]
pub fn authorize_url(config: &AppConfig, shop: &ShopDomain, nonce: &str) -> String {
    let base = config.upstream_base_for(shop);
    format!(
        "{base}/admin/oauth/authorize?client_id={client_id}&scope={scope}&redirect_uri={redirect_uri}&state={state}&grant_options[]=per-user",
        client_id = config.api_key().as_ref(),
        scope = urlencoding::encode(config.scopes().as_ref()),
        redirect_uri = urlencoding::encode(config.redirect_uri()),
        state = nonce,
    )
}

/// Exchanges an authorization code for a permanent access token.
///
/// One POST to the shop's token endpoint; no retries. The caller has
/// already verified the callback signature and nonce, so any failure
/// here is an upstream problem, not a trust problem.
///
/// # Errors
///
/// - [`OAuthError::Upstream`] when the request fails at the transport
///   level or the response body is not JSON.
/// - [`OAuthError::TokenMissing`] when the response parses but carries
///   no `access_token`, preserving the upstream body as a diagnostic.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &AppConfig,
    shop: &ShopDomain,
    code: &str,
) -> Result<String, OAuthError> {
    let url = format!("{}/admin/oauth/access_token", config.upstream_base_for(shop));
    debug!(shop = %shop, "exchanging authorization code");

    let body = AccessTokenRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(shop = %shop, error = %err, "token exchange request failed");
            OAuthError::Upstream {
                details: err.to_string(),
            }
        })?;

    let payload: Value = response.json().await.map_err(|err| {
        warn!(shop = %shop, error = %err, "token exchange response was not JSON");
        OAuthError::Upstream {
            details: err.to_string(),
        }
    })?;

    match payload.get("access_token").and_then(Value::as_str) {
        Some(token) => Ok(token.to_string()),
        None => {
            warn!(shop = %shop, "token exchange response carried no access token");
            Err(OAuthError::TokenMissing { details: payload })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, SigningSecret};
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(upstream: Option<&str>) -> AppConfig {
        let builder = AppConfig::builder()
            .api_key(ApiKey::new("test-client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .signing_secret(SigningSecret::new("signing").unwrap())
            .redirect_uri("https://myapp.example.com/auth");
        let builder = match upstream {
            Some(base) => builder.upstream_base(base),
            None => builder,
        };
        builder.build().unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("test-shop").unwrap()
    }

    #[test]
    fn test_authorize_url_contains_all_parameters() {
        let config = test_config(None);
        let url = authorize_url(&config, &shop(), "nonce-value");

        assert!(url.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("scope=read_products%2Cwrite_products"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fmyapp.example.com%2Fauth"));
        assert!(url.contains("state=nonce-value"));
        assert!(url.contains("grant_options[]=per-user"));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json_string(
                r#"{"client_id":"test-client-id","client_secret":"test-secret","code":"auth-code"}"#,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "shpat_test_token",
                "scope": "read_products,write_products"
            })))
            .mount(&server)
            .await;

        let config = test_config(Some(&server.uri()));
        let client = reqwest::Client::new();

        let token = exchange_code(&client, &config, &shop(), "auth-code")
            .await
            .unwrap();
        assert_eq!(token, "shpat_test_token");
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_missing_token_with_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "invalid_request",
                "error_description": "authorization code was not found"
            })))
            .mount(&server)
            .await;

        let config = test_config(Some(&server.uri()));
        let client = reqwest::Client::new();

        let err = exchange_code(&client, &config, &shop(), "stale-code")
            .await
            .unwrap_err();
        match err {
            OAuthError::TokenMissing { details } => {
                assert_eq!(details["error"], "invalid_request");
            }
            other => panic!("expected TokenMissing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_reports_unreachable_upstream() {
        // Point at a server that is no longer listening
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let config = test_config(Some(&uri));
        let client = reqwest::Client::new();

        let err = exchange_code(&client, &config, &shop(), "auth-code")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_reports_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let config = test_config(Some(&server.uri()));
        let client = reqwest::Client::new();

        let err = exchange_code(&client, &config, &shop(), "auth-code")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::Upstream { .. }));
    }
}
