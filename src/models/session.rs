//! Provider session models.
//!
//! The identity provider owns sessions; Rolo only caches a copy of the
//! issued tokens in cookies. This module is the typed form of that copy.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Cached copy of a provider-issued session, round-tripped through the
/// session cookie set as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds at which the access token expires
    pub expires_at: i64,
    pub user_id: String,
    pub email: Option<String>,
}

impl ProviderSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    /// True if the access token expires within `margin_secs` from now.
    /// The session bridge refreshes inside this margin.
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        self.expires_at <= Utc::now().timestamp() + margin_secs
    }

    /// Serialize for cookie storage. The JSON is base64-wrapped so the
    /// value stays free of characters cookie parsers choke on.
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("base64-{}", URL_SAFE_NO_PAD.encode(json))
    }

    /// Parse a reassembled cookie value. Accepts the base64 form and, for
    /// cookies issued by older deployments, bare JSON.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        if let Some(encoded) = value.strip_prefix("base64-") {
            let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
            return serde_json::from_slice(&bytes).ok();
        }
        serde_json::from_str(value).ok()
    }

    /// Unverified claims of the access token. Signature verification is the
    /// provider's job; this is only used for diagnostics and to recover the
    /// user id when the cookie copy predates the field.
    pub fn claims(&self) -> Option<AccessClaims> {
        decode_unverified(&self.access_token)
    }
}

/// Subset of JWT claims the service cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: i64,
}

/// Decode a JWT without verifying its signature or expiry.
pub fn decode_unverified(token: &str) -> Option<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> ProviderSession {
        ProviderSession {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at,
            user_id: "user-1".to_string(),
            email: Some("a@b.co".to_string()),
        }
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now().timestamp();
        assert!(session(now - 10).is_expired());
        assert!(!session(now + 3600).is_expired());
        assert!(session(now + 30).expires_within(60));
        assert!(!session(now + 3600).expires_within(60));
    }

    #[test]
    fn test_cookie_round_trip() {
        let s = session(Utc::now().timestamp() + 3600);
        let parsed = ProviderSession::from_cookie_value(&s.to_cookie_value()).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn test_from_cookie_value_accepts_legacy_bare_json() {
        let s = session(Utc::now().timestamp() + 3600);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(ProviderSession::from_cookie_value(&json), Some(s));
    }

    #[test]
    fn test_from_cookie_value_rejects_garbage() {
        assert!(ProviderSession::from_cookie_value("not json").is_none());
        assert!(ProviderSession::from_cookie_value("base64-!!!").is_none());
        assert!(ProviderSession::from_cookie_value("").is_none());
    }
}
