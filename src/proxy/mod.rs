//! Pass-through proxy for the upstream product API.
//!
//! Once the guard has produced an access token, these calls forward the
//! request to the shop's admin API and hand the status and JSON body
//! back verbatim. No retries, no response shaping; the embedded UI sees
//! exactly what the platform said.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::config::{AppConfig, ShopDomain};

/// Admin API version pinned for product calls.
const API_VERSION: &str = "2023-07";

/// Header carrying the unsealed access token upstream.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Errors from a proxied upstream call.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request failed at the transport level, or the response body
    /// was not JSON.
    #[error("upstream product call failed: {0}")]
    Upstream(String),
}

/// The verbatim result of a proxied call.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// The upstream HTTP status, passed through unchanged.
    pub status: StatusCode,
    /// The upstream JSON body, passed through unchanged.
    pub body: Value,
}

/// Fetches the shop's product list.
///
/// # Errors
///
/// Returns [`ProxyError::Upstream`] when the call cannot complete or
/// the body is not JSON.
pub async fn list_products(
    client: &reqwest::Client,
    config: &AppConfig,
    shop: &ShopDomain,
    access_token: &str,
) -> Result<UpstreamResponse, ProxyError> {
    let response = client
        .get(products_url(config, shop))
        .header(ACCESS_TOKEN_HEADER, access_token)
        .send()
        .await
        .map_err(|err| upstream_error(shop, "list", &err))?;

    into_upstream_response(shop, "list", response).await
}

/// Creates a product in the shop, forwarding `payload` unchanged.
///
/// # Errors
///
/// Returns [`ProxyError::Upstream`] when the call cannot complete or
/// the body is not JSON.
pub async fn create_product(
    client: &reqwest::Client,
    config: &AppConfig,
    shop: &ShopDomain,
    access_token: &str,
    payload: &Value,
) -> Result<UpstreamResponse, ProxyError> {
    let response = client
        .post(products_url(config, shop))
        .header(ACCESS_TOKEN_HEADER, access_token)
        .json(payload)
        .send()
        .await
        .map_err(|err| upstream_error(shop, "create", &err))?;

    into_upstream_response(shop, "create", response).await
}

fn products_url(config: &AppConfig, shop: &ShopDomain) -> String {
    format!(
        "{}/admin/api/{API_VERSION}/products.json",
        config.upstream_base_for(shop)
    )
}

fn upstream_error(shop: &ShopDomain, op: &str, err: &reqwest::Error) -> ProxyError {
    warn!(shop = %shop, op, error = %err, "proxied product call failed");
    ProxyError::Upstream(err.to_string())
}

async fn into_upstream_response(
    shop: &ShopDomain,
    op: &str,
    response: reqwest::Response,
) -> Result<UpstreamResponse, ProxyError> {
    // reqwest and axum sit on different http major versions, so the
    // status crosses as a bare u16.
    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body: Value = response
        .json()
        .await
        .map_err(|err| upstream_error(shop, op, &err))?;

    Ok(UpstreamResponse { status, body })
}
