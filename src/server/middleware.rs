//! Boundary guard for dashboard navigations.
//!
//! Runs before any dashboard route logic. Navigations only carry the
//! cookie pair; any invalid, expired, or mismatched session clears both
//! cookies and sends the browser back to the landing page. A session
//! close to expiry is allowed through, with the response marked so the
//! client can refresh proactively.

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::guard;
use crate::server::{cookies, AppState, EXPIRES_SOON_HEADER};

/// Session check for page navigations.
///
/// Unlike the API guard this never answers with JSON: failures clear
/// the cookie pair and redirect to `/`, forcing re-authentication.
pub async fn page_session_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let Some(creds) = guard::presented(request.headers(), &jar) else {
        return eject(jar);
    };

    let session = match guard::verify_session(&state.codec, &creds) {
        Ok(session) => session,
        Err(err) => {
            debug!(reason = %err, "page navigation rejected");
            return eject(jar);
        }
    };

    let mut response = next.run(request).await;
    if session.expires_soon {
        response.headers_mut().insert(
            HeaderName::from_static(EXPIRES_SOON_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    response
}

/// Clears the session pair and redirects to the landing page.
fn eject(jar: CookieJar) -> Response {
    let jar = cookies::without_session(jar);
    (
        jar,
        (StatusCode::FOUND, [(header::LOCATION, "/")]),
    )
        .into_response()
}
