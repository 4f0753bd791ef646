//! OAuth 2.0 authorization-code exchange.
//!
//! The callback receives a one-time `code` from the provider. It is traded at
//! the token endpoint for an access token, which is then used once against
//! the userinfo endpoint to learn who signed in.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::OAuthConfig;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth provider is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint returned {0}")]
    TokenRejected(u16),

    #[error("Userinfo endpoint returned {0}")]
    UserinfoRejected(u16),

    #[error("Provider did not return an email address")]
    MissingEmail,
}

/// Identity claims returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A provider able to turn an authorization code into a user identity.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Name stored on linked accounts, e.g. `google`.
    fn name(&self) -> &str;

    async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo, OAuthError>;
}

/// Standard authorization-code flow over HTTP.
pub struct HttpOAuthProvider {
    client: Client,
    config: OAuthConfig,
}

impl HttpOAuthProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        if !config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn request_access_token(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenRejected(response.status().as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<OAuthUserInfo, OAuthError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::UserinfoRejected(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl OAuthProvider for HttpOAuthProvider {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo, OAuthError> {
        let access_token = self.request_access_token(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        if info.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
            return Err(OAuthError::MissingEmail);
        }

        tracing::debug!(provider = %self.config.provider, "OAuth code exchanged");
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_provider_is_rejected() {
        let result = HttpOAuthProvider::new(OAuthConfig::default());
        assert!(matches!(result, Err(OAuthError::NotConfigured)));
    }

    #[test]
    fn test_configured_provider_reports_name() {
        let config = OAuthConfig {
            provider: "google".to_string(),
            client_id: "client".to_string(),
            token_url: "https://oauth2.example.com/token".to_string(),
            userinfo_url: "https://oauth2.example.com/userinfo".to_string(),
            ..OAuthConfig::default()
        };
        let provider = HttpOAuthProvider::new(config).unwrap();
        assert_eq!(provider.name(), "google");
    }

    #[test]
    fn test_userinfo_deserialization() {
        let info: OAuthUserInfo = serde_json::from_str(
            r#"{"sub":"1234","email":"ana@example.com","name":"Ana","picture":null,"locale":"en"}"#,
        )
        .unwrap();
        assert_eq!(info.sub, "1234");
        assert_eq!(info.email.as_deref(), Some("ana@example.com"));
        assert!(info.picture.is_none());
    }

    #[test]
    fn test_token_response_ignores_extra_fields() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.a0","token_type":"Bearer","expires_in":3599}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.a0");
    }
}
