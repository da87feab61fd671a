//! Auth routes.
//!
//! The server half of the hosted-provider login flow:
//! - GET  /api/auth/login    - start the PKCE flow, redirect to the provider
//! - GET  /api/auth/callback - exchange a code or one-time token for a session
//! - POST /api/auth/logout   - provider sign-out, then canonical cookie clear
//! - POST /api/auth/clearall - forceful clear, no provider call
//! - GET  /api/auth/session  - token sync: loop-guard check, then user fetch
//!
//! Every failure in the callback flow terminates in a redirect to the
//! login page carrying a human-readable `error` and a machine `reason`.
//! Nothing here retries; provider calls are single attempts.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::services::cookies::{self, CLIENT_ID_COOKIE, PKCE_COOKIE};
use crate::services::{LoopCheck, OtpType};
use crate::{db, AppState};

/// Where successful logins land when no `next` is given.
const DEFAULT_NEXT: &str = "/dashboard";

/// Build auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
        .route("/clearall", post(clear_all))
        .route("/session", get(session_sync))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CallbackQuery {
    /// Authorization code from the PKCE flow
    pub code: Option<String>,
    /// One-time token from an email link
    pub token_hash: Option<String>,
    /// One-time token type ("signup", "recovery", ...)
    #[serde(rename = "type")]
    pub otp_type: Option<String>,
    /// Post-login destination
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SessionSyncQuery {
    /// Page the client is currently on; the loop guard refuses to
    /// redirect when it is already the fallback page
    pub path: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start the login flow: mint a PKCE pair, park the verifier in a cookie,
/// and send the browser to the provider's authorize endpoint.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (verifier, challenge) = generate_pkce();

    let mut cookie = Cookie::new(PKCE_COOKIE, verifier);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.secure_cookies);
    cookie.set_max_age(time::Duration::minutes(10));
    let jar = jar.add(cookie);

    let next = sanitize_next(query.next.as_deref());
    let authorize_url = format!(
        "{}/auth/v1/authorize?code_challenge={}&code_challenge_method=S256&redirect_to={}",
        state.provider.base_url(),
        challenge,
        urlencoding::encode(&format!("/api/auth/callback?next={}", next)),
    );

    info!("Starting PKCE login flow");
    (jar, Redirect::to(&authorize_url))
}

/// Handle the provider redirect after an external authentication step.
///
/// Exactly one of `code` / `token_hash` must be present. The provider
/// call is atomic: on failure no cookie is set, except that the PKCE
/// verifier is consumed either way.
#[axum::debug_handler]
async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    // The verifier is single-use regardless of outcome
    let verifier = jar.get(PKCE_COOKIE).map(|c| c.value().to_string());
    let jar = cookies::apply(jar, cookies::clear_cookies(&[PKCE_COOKIE.to_string()]));

    let session = match (&query.code, &query.token_hash) {
        (None, None) => {
            return (jar, login_error("Invalid callback parameters", "missing_params"));
        }
        (Some(_), Some(_)) => {
            return (jar, login_error("Invalid callback parameters", "ambiguous_params"));
        }
        (Some(code), None) => {
            match state.provider.exchange_code(code, verifier.as_deref()).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(error = %e, "Code exchange failed");
                    return (jar, login_error(&provider_message(&e), "exchange_failed"));
                }
            }
        }
        (None, Some(token_hash)) => {
            let Some(otp_type) = query.otp_type.as_deref().and_then(OtpType::parse) else {
                return (jar, login_error("Invalid callback parameters", "invalid_type"));
            };
            match state.provider.verify_otp(token_hash, otp_type).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(error = %e, "One-time token verification failed");
                    return (jar, login_error(&provider_message(&e), "verify_failed"));
                }
            }
        }
    };

    info!(user = %session.user_id, "Callback exchange succeeded");

    // Issue the session cookie set and record exactly what was issued;
    // names from an earlier session that this set no longer covers are
    // expired so they cannot shadow it
    let issued = cookies::session_cookies(&state.session_cookie_base, &session, state.secure_cookies);
    let names = cookies::issued_names(&state.session_cookie_base, &session);
    let previous = match db::recorded_session_cookies(&state.db, &session.user_id).await {
        Ok(previous) => previous,
        Err(e) => {
            warn!(error = %e, "Cookie registry lookup failed");
            Vec::new()
        }
    };
    if let Err(e) = db::record_session_cookies(&state.db, &session.user_id, &names).await {
        warn!(error = %e, "Failed to record issued cookie names");
    }
    let jar = cookies::apply(
        jar,
        cookies::clear_cookies(&cookies::leftover_names(&previous, &names)),
    );
    let jar = cookies::apply(jar, issued);

    let next = sanitize_next(query.next.as_deref());
    (jar, Redirect::to(&next))
}

/// Sign out at the provider, then run the canonical clear. The clear
/// happens regardless of the provider's answer.
#[axum::debug_handler]
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let session = cookies::read_session(&jar, &state.session_cookie_base);

    let mut signout_error = None;
    if let Some(ref session) = session {
        if let Err(e) = state.provider.sign_out(&session.access_token).await {
            warn!(error = %e, "Provider sign-out failed; clearing cookies anyway");
            signout_error = Some(provider_message(&e));
        }
    }

    let jar = canonical_clear(&state, jar, session.as_ref().map(|s| s.user_id.as_str())).await;
    let redirect = match signout_error {
        Some(message) => login_error(&message, "signout_failed"),
        None => Redirect::to("/login"),
    };
    (jar, redirect)
}

/// Forceful clear without touching the provider. Escape hatch for wedged
/// cookie state.
#[axum::debug_handler]
async fn clear_all(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let session = cookies::read_session(&jar, &state.session_cookie_base);
    let jar = canonical_clear(&state, jar, session.as_ref().map(|s| s.user_id.as_str())).await;
    (jar, Redirect::to("/login"))
}

/// Token sync endpoint consumed by browser code before it re-fetches a
/// session. Consults the loop guard first; a tripped guard short-circuits
/// the provider call entirely.
#[axum::debug_handler]
async fn session_sync(
    State(state): State<AppState>,
    Query(query): Query<SessionSyncQuery>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let (jar, client_id) = ensure_client_id(jar, state.secure_cookies);
    let current_path = query.path.as_deref().unwrap_or("/");

    match state.loop_guard.check(&client_id, current_path).await {
        LoopCheck::Tripped { redirect } => {
            info!(client = %client_id, "Session fetch loop detected");
            let body = json!({
                "status": "loop_detected",
                "redirect": redirect,
            });
            (jar, Json(body))
        }
        LoopCheck::Proceed => {
            let Some(session) = cookies::read_session(&jar, &state.session_cookie_base) else {
                return (jar, Json(json!({ "status": "no_session" })));
            };

            match state.provider.get_user(&session.access_token).await {
                Ok(user) => {
                    let body = json!({
                        "status": "ok",
                        "user": user,
                        "expires_at": session.expires_at,
                    });
                    (jar, Json(body))
                }
                Err(e) => {
                    warn!(error = %e, "Session fetch rejected by provider");
                    (jar, Json(json!({ "status": "invalid_session" })))
                }
            }
        }
    }
}

/// Cookie and session diagnostics.
///
/// GET /api/debug-auth
#[axum::debug_handler]
pub async fn debug_auth(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    let cookie_names: Vec<String> = jar.iter().map(|c| c.name().to_string()).collect();
    let session = cookies::read_session(&jar, &state.session_cookie_base);

    let session_info = session.map(|s| {
        json!({
            "user_id": s.user_id,
            "expires_at": s.expires_at,
            "expired": s.is_expired(),
            "claims": s.claims(),
        })
    });

    Json(json!({
        "session_cookie_base": state.session_cookie_base,
        "cookies_present": cookie_names,
        "session": session_info,
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// The one clearing routine. Recorded names win; the provider-URL
/// heuristic only covers browsers that predate the registry.
async fn canonical_clear(state: &AppState, jar: CookieJar, user_id: Option<&str>) -> CookieJar {
    let mut names = Vec::new();

    if let Some(user_id) = user_id {
        match db::recorded_session_cookies(&state.db, user_id).await {
            Ok(recorded) if !recorded.is_empty() => {
                names = recorded;
                names.push(PKCE_COOKIE.to_string());
                names.push(cookies::REDIRECT_COUNT_COOKIE.to_string());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Cookie registry lookup failed"),
        }
        if let Err(e) = db::clear_recorded_cookies(&state.db, user_id).await {
            warn!(error = %e, "Failed to drop cookie recording");
        }
    }

    if names.is_empty() {
        names = cookies::fallback_clear_names(state.provider.base_url());
    }

    cookies::apply(jar, cookies::clear_cookies(&names))
}

/// Redirect to the login page with an error message and reason code.
fn login_error(message: &str, reason: &str) -> Redirect {
    Redirect::to(&format!(
        "/login?error={}&reason={}",
        encode_query(message),
        reason
    ))
}

/// Query encoding with spaces as `+`, matching what the login page parses.
fn encode_query(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Only local absolute paths are allowed as post-login destinations.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n.to_string(),
        _ => DEFAULT_NEXT.to_string(),
    }
}

fn provider_message(e: &crate::Error) -> String {
    match e {
        crate::Error::Provider(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Read the per-browser id, minting one on first contact.
fn ensure_client_id(jar: CookieJar, secure: bool) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(CLIENT_ID_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }

    let id = nanoid::nanoid!();
    let mut cookie = Cookie::new(CLIENT_ID_COOKIE, id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(time::Duration::days(365));
    (jar.add(cookie), id)
}

/// Generate a PKCE verifier and its S256 challenge.
fn generate_pkce() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);

    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    (verifier, challenge)
}
