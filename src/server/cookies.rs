//! Cookie construction for the session layer.
//!
//! Three cookies, all `HttpOnly` and `SameSite=Lax` on path `/`:
//!
//! - `sessionToken` and `shopDomain`: the 24-hour session pair
//! - `nonce`: the short-lived CSRF token parked during the install
//!   round trip
//!
//! The `Secure` attribute follows the production flag so local
//! development over plain HTTP keeps working.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::{AppConfig, ShopDomain};

/// Cookie holding the signed session assertion.
pub const SESSION_COOKIE: &str = "sessionToken";
/// Cookie holding the shop domain the session is bound to.
pub const SHOP_COOKIE: &str = "shopDomain";
/// Cookie parking the install CSRF nonce between start and callback.
pub const NONCE_COOKIE: &str = "nonce";

/// Session cookie lifetime, matching the token's 24-hour expiry.
const SESSION_MAX_AGE: Duration = Duration::hours(24);
/// Nonce ceiling; the cookie is deleted on a successful callback long
/// before this elapses.
const NONCE_MAX_AGE: Duration = Duration::hours(24);

fn base_cookie(config: &AppConfig, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production())
        .build()
}

/// Adds the session cookie pair to `jar`.
#[must_use]
pub fn with_session(
    jar: CookieJar,
    config: &AppConfig,
    token: &str,
    shop: &ShopDomain,
) -> CookieJar {
    let mut session = base_cookie(config, SESSION_COOKIE, token.to_string());
    session.set_max_age(SESSION_MAX_AGE);
    let mut shop_cookie = base_cookie(config, SHOP_COOKIE, shop.as_ref().to_string());
    shop_cookie.set_max_age(SESSION_MAX_AGE);

    jar.add(session).add(shop_cookie)
}

/// Adds the install nonce cookie to `jar`.
#[must_use]
pub fn with_nonce(jar: CookieJar, config: &AppConfig, nonce: &str) -> CookieJar {
    let mut cookie = base_cookie(config, NONCE_COOKIE, nonce.to_string());
    cookie.set_max_age(NONCE_MAX_AGE);
    jar.add(cookie)
}

/// Removes the session cookie pair.
///
/// Removal cookies must match the path the originals were set with or
/// browsers ignore them.
#[must_use]
pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(removal(SESSION_COOKIE)).remove(removal(SHOP_COOKIE))
}

/// Removes the install nonce cookie.
#[must_use]
pub fn without_nonce(jar: CookieJar) -> CookieJar {
    jar.remove(removal(NONCE_COOKIE))
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}
