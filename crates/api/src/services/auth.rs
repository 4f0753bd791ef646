//! Authentication service for registration, login, OAuth sign-in and token rotation.

use chrono::{Duration, Utc};
use domain::models::User;
use persistence::entities::UserEntity;
use persistence::repositories::{NewUser, UserRepository};
use shared::crypto::sha256_hex;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{check_policy, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtAuthConfig;
use crate::services::oauth::OAuthUserInfo;

pub(crate) const USERNAME_INDEX: &str = "idx_users_username";

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("OAuth is not configured")]
    OAuthNotConfigured,

    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Access/refresh token pair handed to clients.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// A signed-in user with a fresh session.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Builds the token signer from PEM keys in configuration.
pub fn build_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
    JwtConfig::from_rsa_pem(
        &normalize_pem_key(&config.private_key),
        &normalize_pem_key(&config.public_key),
        config.access_token_expiry_secs,
        config.refresh_token_expiry_secs,
        config.leeway_secs,
    )
}

/// Turns escaped `\n` sequences from env files back into newlines and strips quotes.
fn normalize_pem_key(key: &str) -> String {
    key.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .replace("\\n", "\n")
}

pub(crate) fn is_unique_violation(err: &sqlx::Error, index: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && index.map_or(true, |name| db_err.constraint() == Some(name))
        }
        _ => false,
    }
}

/// Authentication service.
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Register a new user with email and password.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<AuthResult, AuthError> {
        check_policy(password).map_err(AuthError::WeakPassword)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let created = self
            .users
            .create_user(&NewUser {
                email,
                password_hash: Some(&password_hash),
                username,
                full_name,
                avatar_url: None,
            })
            .await;

        // Concurrent registrations race past the lookup above.
        let entity = match created {
            Ok(entity) => entity,
            Err(e) if is_unique_violation(&e, Some(USERNAME_INDEX)) => {
                return Err(AuthError::UsernameTaken)
            }
            Err(e) if is_unique_violation(&e, None) => return Err(AuthError::EmailAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %entity.id, "User registered");
        self.start_session(entity).await
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let entity = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !entity.is_active {
            return Err(AuthError::UserDisabled);
        }

        let hash = entity
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.start_session(entity).await
    }

    /// Sign in with an identity returned by an OAuth provider.
    ///
    /// Resolves the user by linked account first, then by email (linking the
    /// account), and creates a password-less user otherwise.
    pub async fn oauth_login(
        &self,
        provider: &str,
        info: &OAuthUserInfo,
    ) -> Result<AuthResult, AuthError> {
        if let Some(account) = self.users.find_oauth_account(provider, &info.sub).await? {
            let entity = self
                .users
                .find_by_id(account.user_id)
                .await?
                .ok_or(AuthError::UserNotFound)?;
            if !entity.is_active {
                return Err(AuthError::UserDisabled);
            }
            return self.start_session(entity).await;
        }

        let email = info
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::OAuthProvider("missing email".to_string()))?;

        let entity = match self.users.find_by_email(email).await? {
            Some(existing) => existing,
            None => {
                let created = self
                    .users
                    .create_user(&NewUser {
                        email,
                        password_hash: None,
                        username: None,
                        full_name: info.name.as_deref(),
                        avatar_url: info.picture.as_deref(),
                    })
                    .await;
                match created {
                    Ok(entity) => {
                        tracing::info!(user_id = %entity.id, provider, "User created via OAuth");
                        entity
                    }
                    Err(e) if is_unique_violation(&e, None) => self
                        .users
                        .find_by_email(email)
                        .await?
                        .ok_or(AuthError::UserNotFound)?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if !entity.is_active {
            return Err(AuthError::UserDisabled);
        }

        self.users
            .create_oauth_account(entity.id, provider, &info.sub, Some(email))
            .await?;

        self.start_session(entity).await
    }

    /// Exchange a refresh token for a new pair. The old refresh token stops working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let (user_id, jti_hash) = self.decode_refresh(refresh_token)?;

        let session = self
            .users
            .find_session_by_refresh_hash(&jti_hash, user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.expires_at < Utc::now() {
            self.users.delete_session(session.id).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let (tokens, access_hash, refresh_hash) = self.issue_tokens(user_id)?;
        self.users
            .rotate_session(session.id, &access_hash, &refresh_hash, self.session_expiry())
            .await?;

        Ok(tokens)
    }

    /// Invalidate the session holding `refresh_token`. Unknown sessions are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let (user_id, jti_hash) = self.decode_refresh(refresh_token)?;
        let removed = self
            .users
            .delete_session_by_refresh_hash(&jti_hash, user_id)
            .await?;
        if removed == 0 {
            tracing::debug!(user_id = %user_id, "Session already gone at logout");
        }
        Ok(())
    }

    fn decode_refresh(&self, refresh_token: &str) -> Result<(Uuid, String), AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                    AuthError::InvalidRefreshToken
                }
                other => AuthError::TokenError(other),
            })?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;
        Ok((user_id, sha256_hex(&claims.jti)))
    }

    /// Returns the pair plus the hashes of both token ids.
    fn issue_tokens(&self, user_id: Uuid) -> Result<(TokenPair, String, String), AuthError> {
        let access = self.jwt.generate_access_token(user_id)?;
        let refresh = self.jwt.generate_refresh_token(user_id)?;
        let access_hash = sha256_hex(&access.jti);
        let refresh_hash = sha256_hex(&refresh.jti);
        Ok((
            TokenPair {
                access_token: access.token,
                refresh_token: refresh.token,
                expires_in: self.jwt.access_token_expiry_secs,
            },
            access_hash,
            refresh_hash,
        ))
    }

    fn session_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry_secs)
    }

    async fn start_session(&self, entity: UserEntity) -> Result<AuthResult, AuthError> {
        let now = Utc::now();
        self.users.update_last_login(entity.id, now).await?;

        let (tokens, access_hash, refresh_hash) = self.issue_tokens(entity.id)?;
        self.users
            .create_session(entity.id, &access_hash, &refresh_hash, self.session_expiry())
            .await?;

        let mut user: User = entity.into();
        user.last_login_at = Some(now);
        Ok(AuthResult { user, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pem_key_escaped_newlines() {
        let key = "\"-----BEGIN PUBLIC KEY-----\\nABC\\n-----END PUBLIC KEY-----\"";
        assert_eq!(
            normalize_pem_key(key),
            "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----"
        );
    }

    #[test]
    fn test_normalize_pem_key_already_multiline() {
        let key = "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----\n";
        assert_eq!(
            normalize_pem_key(key),
            "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----"
        );
    }

    #[test]
    fn test_build_jwt_config_rejects_garbage() {
        let config = JwtAuthConfig {
            private_key: "not a key".to_string(),
            public_key: "not a key".to_string(),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 86400,
            leeway_secs: 30,
        };
        assert!(matches!(
            build_jwt_config(&config),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_is_unique_violation_ignores_other_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, None));
        assert!(!is_unique_violation(
            &sqlx::Error::RowNotFound,
            Some(USERNAME_INDEX)
        ));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::WeakPassword("too short".into()).to_string(),
            "Password does not meet requirements: too short"
        );
        assert_eq!(AuthError::UsernameTaken.to_string(), "Username already taken");
    }
}
