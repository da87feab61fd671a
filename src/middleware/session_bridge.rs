//! Session bridge middleware.
//!
//! Reconciles the browser-held provider session with server-readable
//! cookies on every request. When the cached access token is close to
//! expiry the bridge asks the provider for a rotation once and writes the
//! new cookie values onto the outgoing response, so the next request
//! already carries a fresh session.
//!
//! The bridge never fails a request: a provider error is logged and the
//! request passes through with whatever session state it arrived with.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::services::cookies;
use crate::{db, AppState, Error};

/// Refresh when the access token expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Path prefixes and extensions the bridge skips entirely.
const STATIC_PREFIXES: &[&str] = &["/assets/", "/static/"];
const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".map", ".png", ".jpg", ".svg", ".ico", ".woff", ".woff2",
];

/// User context injected into request extensions when a valid session
/// cookie set is present.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
}

fn is_static_asset(path: &str) -> bool {
    STATIC_PREFIXES.iter().any(|p| path.starts_with(p))
        || STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// The bridge itself. Applied to the whole router.
pub async fn session_bridge(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_static_asset(&path) {
        return next.run(req).await;
    }

    let Some(session) = cookies::read_session(&jar, &state.session_cookie_base) else {
        return next.run(req).await;
    };

    let mut rotated = None;
    let mut current = session.clone();

    if session.expires_within(REFRESH_MARGIN_SECS) {
        // One attempt; failure leaves the request untouched
        match state.provider.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                debug!(user = %fresh.user_id, "Session rotated by bridge");
                rotated = Some(fresh.clone());
                current = fresh;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Session refresh failed; passing request through");
            }
        }
    }

    if !current.is_expired() {
        req.extensions_mut().insert(SessionUser {
            user_id: current.user_id.clone(),
            email: current.email.clone(),
            access_token: current.access_token.clone(),
        });
    }

    let mut response = next.run(req).await;

    if let Some(fresh) = rotated {
        let issued = cookies::session_cookies(&state.session_cookie_base, &fresh, state.secure_cookies);
        let names = cookies::issued_names(&state.session_cookie_base, &fresh);

        // Cookies from the previous set that the rotation no longer
        // covers must be expired, or a stale whole-value cookie would
        // shadow the new fragments on the next read
        let previous = match db::recorded_session_cookies(&state.db, &fresh.user_id).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "Cookie registry lookup failed");
                Vec::new()
            }
        };
        let stale = cookies::clear_cookies(&cookies::leftover_names(&previous, &names));

        for cookie in issued.iter().chain(stale.iter()) {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }

        if let Err(e) = db::record_session_cookies(&state.db, &fresh.user_id, &names).await {
            warn!(error = %e, "Failed to record rotated cookie names");
        }
    }

    response
}

/// Middleware requiring a session-authenticated user. Must run inside
/// the bridge so the extension is populated.
pub async fn require_session(req: Request<Body>, next: Next) -> Result<Response, Error> {
    if req.extensions().get::<SessionUser>().is_none() {
        return Err(Error::Unauthenticated);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_asset_detection() {
        assert!(is_static_asset("/assets/app.css"));
        assert!(is_static_asset("/favicon.ico"));
        assert!(is_static_asset("/bundle.js"));
        assert!(!is_static_asset("/api/events"));
        assert!(!is_static_asset("/dashboard"));
    }
}
