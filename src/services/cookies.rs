//! Cookie janitor and session cookie codec.
//!
//! One canonical place for everything cookie-shaped: building the
//! fragmented session cookie set, reassembling it from a request, and
//! producing clear instructions on logout. Clearing prefers the names
//! recorded at session creation; the name-pattern heuristic survives
//! only as a fallback for browsers that predate the registry.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;
use url::Url;

use crate::models::ProviderSession;

/// PKCE verifier, set when the login flow starts and consumed by the
/// callback exchange.
pub const PKCE_COOKIE: &str = "rolo-pkce-verifier";

/// Legacy redirect counter, cleared with everything else.
pub const REDIRECT_COUNT_COOKIE: &str = "rolo-redirect-count";

/// Opaque per-browser id used to key the loop guard.
pub const CLIENT_ID_COOKIE: &str = "rolo-client-id";

/// Session cookie values above this size are split across numbered
/// fragment suffixes (`.0`..`.9`).
const FRAGMENT_LIMIT: usize = 3072;

/// Highest fragment suffix ever issued or cleared.
const MAX_FRAGMENTS: usize = 10;

/// Session cookie lifetime.
const SESSION_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Cookie names earlier deployments used; cleared unconditionally.
const LEGACY_NAMES: &[&str] = &["sb-access-token", "sb-refresh-token", "supabase-auth-token"];

/// Derive the session cookie base name from the provider URL.
///
/// `https://abcd1234.supabase.co` yields `sb-abcd1234-auth-token`,
/// matching what the provider's own browser SDK would set.
pub fn session_cookie_base(provider_url: &str) -> String {
    let project_ref = Url::parse(provider_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .and_then(|host| host.split('.').next().map(|s| s.to_string()))
        .unwrap_or_else(|| "local".to_string());

    format!("sb-{}-auth-token", project_ref)
}

/// Split a session into its cookie set: a single cookie when the value
/// fits, numbered fragments otherwise. Returns the issued cookies.
pub fn session_cookies(base: &str, session: &ProviderSession, secure: bool) -> Vec<Cookie<'static>> {
    let value = session.to_cookie_value();

    if value.len() <= FRAGMENT_LIMIT {
        return vec![build_session_cookie(base.to_string(), value, secure)];
    }

    let bytes = value.into_bytes();
    if bytes.len() > FRAGMENT_LIMIT * MAX_FRAGMENTS {
        warn!(
            bytes = bytes.len(),
            capacity = FRAGMENT_LIMIT * MAX_FRAGMENTS,
            "Session cookie value exceeds fragment capacity; issuing a truncated, unreadable set"
        );
    }
    bytes
        .chunks(FRAGMENT_LIMIT)
        .take(MAX_FRAGMENTS)
        .enumerate()
        .map(|(i, chunk)| {
            // Fragments split a JSON string on byte boundaries; each chunk
            // alone may not be valid UTF-8, but JSON here is ASCII-safe
            let part = String::from_utf8_lossy(chunk).into_owned();
            build_session_cookie(format!("{}.{}", base, i), part, secure)
        })
        .collect()
}

fn build_session_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(time::Duration::days(SESSION_COOKIE_MAX_AGE_DAYS));
    cookie
}

/// Reassemble the session cookie value from a request jar: whole cookie
/// first, then fragments in suffix order until the first gap.
pub fn read_session(jar: &CookieJar, base: &str) -> Option<ProviderSession> {
    if let Some(cookie) = jar.get(base) {
        return ProviderSession::from_cookie_value(cookie.value());
    }

    let mut value = String::new();
    for i in 0..MAX_FRAGMENTS {
        match jar.get(&format!("{}.{}", base, i)) {
            Some(fragment) => value.push_str(fragment.value()),
            None => break,
        }
    }

    if value.is_empty() {
        None
    } else {
        ProviderSession::from_cookie_value(&value)
    }
}

/// Names of the cookies `session_cookies` would issue for this session.
/// Recorded in the registry so clearing never has to guess.
pub fn issued_names(base: &str, session: &ProviderSession) -> Vec<String> {
    let value = session.to_cookie_value();
    if value.len() <= FRAGMENT_LIMIT {
        vec![base.to_string()]
    } else {
        (0..value.len().div_ceil(FRAGMENT_LIMIT).min(MAX_FRAGMENTS))
            .map(|i| format!("{}.{}", base, i))
            .collect()
    }
}

/// Names from a previous issue that the new set no longer covers. A
/// rotation that changes the fragment count leaves these behind, and a
/// stale whole-value cookie would shadow the fragments on the next read,
/// so callers clear them alongside the new set.
pub fn leftover_names(previous: &[String], issued: &[String]) -> Vec<String> {
    previous
        .iter()
        .filter(|name| !issued.contains(name))
        .cloned()
        .collect()
}

/// Fallback clear list when no recorded names exist: derived base plus
/// every fragment suffix, legacy names, and the service's own cookies.
pub fn fallback_clear_names(provider_url: &str) -> Vec<String> {
    let base = session_cookie_base(provider_url);

    let mut names = vec![base.clone()];
    names.extend((0..MAX_FRAGMENTS).map(|i| format!("{}.{}", base, i)));
    names.extend(LEGACY_NAMES.iter().map(|s| s.to_string()));
    names.push(PKCE_COOKIE.to_string());
    names.push(REDIRECT_COUNT_COOKIE.to_string());
    names
}

/// Produce clear instructions: each name overwritten with an empty value
/// and zero max-age on the root path.
pub fn clear_cookies(names: &[String]) -> Vec<Cookie<'static>> {
    names
        .iter()
        .map(|name| {
            let mut cookie = Cookie::new(name.clone(), "");
            cookie.set_path("/");
            cookie.set_max_age(time::Duration::ZERO);
            cookie
        })
        .collect()
}

/// Apply a set of cookies to a jar.
pub fn apply(jar: CookieJar, cookies: Vec<Cookie<'static>>) -> CookieJar {
    cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie))
}
