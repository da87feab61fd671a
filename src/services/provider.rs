//! Identity provider client.
//!
//! Thin REST client for a GoTrue-compatible hosted auth provider. The
//! provider owns sessions end to end; this client only performs the four
//! exchanges the service needs. Every call is a single attempt with a
//! fixed 8 second timeout. No retries.

use serde::Deserialize;
use tracing::warn;

use crate::config::ProviderConfig;
use crate::models::ProviderSession;
use crate::{Error, Result};

/// Timeout applied to every provider call.
const PROVIDER_TIMEOUT_SECS: u64 = 8;

/// One-time token types accepted by the verify endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpType {
    Signup,
    Recovery,
    EmailChange,
    Magiclink,
    Invite,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::Magiclink => "magiclink",
            Self::Invite => "invite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "signup" => Some(Self::Signup),
            "recovery" => Some(Self::Recovery),
            "email_change" => Some(Self::EmailChange),
            "magiclink" => Some(Self::Magiclink),
            "invite" => Some(Self::Invite),
            _ => None,
        }
    }
}

/// Provider user record, as returned by the user endpoint.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: Option<String>,
}

/// Token grant response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Seconds until the access token expires
    expires_in: Option<i64>,
    /// Unix timestamp variant some deployments send instead
    expires_at: Option<i64>,
    user: Option<ProviderUser>,
}

impl TokenResponse {
    fn into_session(self) -> ProviderSession {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            chrono::Utc::now().timestamp() + self.expires_in.unwrap_or(3600)
        });
        let (user_id, email) = match self.user {
            Some(u) => (u.id, u.email),
            None => {
                // Fall back to the token's own claims
                let claims = crate::models::decode_unverified(&self.access_token);
                (
                    claims.as_ref().map(|c| c.sub.clone()).unwrap_or_default(),
                    claims.and_then(|c| c.email),
                )
            }
        };
        ProviderSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_id,
            email,
        }
    }
}

/// Error body shapes the provider is known to emit.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Self {
        // Construction only fails on TLS/resolver misconfiguration
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .expect("provider HTTP client");
        Self { http, config }
    }

    /// Base URL the client was configured with.
    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    /// Exchange an authorization code (PKCE grant) for a session.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<ProviderSession> {
        let url = format!("{}/auth/v1/token?grant_type=pkce", self.config.url);
        let body = serde_json::json!({
            "auth_code": code,
            "code_verifier": pkce_verifier,
        });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        self.session_from(response).await
    }

    /// Verify a one-time token (email confirmation, recovery, magic link).
    pub async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<ProviderSession> {
        let url = format!("{}/auth/v1/verify", self.config.url);
        let body = serde_json::json!({
            "token_hash": token_hash,
            "type": otp_type.as_str(),
        });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        self.session_from(response).await
    }

    /// Rotate a session using its refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.config.url);
        let body = serde_json::json!({ "refresh_token": refresh_token });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        self.session_from(response).await
    }

    /// Fetch the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<ProviderUser> {
        let url = format!("{}/auth/v1/user", self.config.url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Provider(Self::error_message(response).await));
        }

        response.json::<ProviderUser>().await.map_err(Error::from)
    }

    /// Invalidate a session server-side.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.config.url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            warn!(error = %message, "Provider sign-out rejected");
            return Err(Error::Provider(message));
        }

        Ok(())
    }

    async fn session_from(&self, response: reqwest::Response) -> Result<ProviderSession> {
        if !response.status().is_success() {
            return Err(Error::Provider(Self::error_message(response).await));
        }

        let tokens: TokenResponse = response.json().await?;
        Ok(tokens.into_session())
    }

    /// Pull the most specific message out of a provider error body.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            if let Some(message) = body.error_description.or(body.msg).or(body.error) {
                return message;
            }
        }

        format!("provider returned {}", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_type_parsing() {
        assert_eq!(OtpType::parse("signup"), Some(OtpType::Signup));
        assert_eq!(OtpType::parse("email_change"), Some(OtpType::EmailChange));
        assert_eq!(OtpType::parse("sms"), None);
        assert_eq!(OtpType::parse(""), None);
    }

    #[test]
    fn test_token_response_expiry_fallbacks() {
        let now = chrono::Utc::now().timestamp();

        let explicit = TokenResponse {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_in: None,
            expires_at: Some(12345),
            user: Some(ProviderUser { id: "u1".into(), email: None }),
        };
        assert_eq!(explicit.into_session().expires_at, 12345);

        let relative = TokenResponse {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_in: Some(60),
            expires_at: None,
            user: Some(ProviderUser { id: "u1".into(), email: None }),
        };
        let expires = relative.into_session().expires_at;
        assert!((now + 55..=now + 65).contains(&expires));
    }
}
