//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{OAuthAccountEntity, UserEntity, UserSessionEntity};
use crate::metrics::QueryTimer;

/// Fields for a new user row.
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub username: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Profile fields to change. `None` leaves a column as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate<'a> {
    pub username: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, username, full_name, avatar_url, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, username, full_name, avatar_url, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a new user account. The email is stored lowercased.
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, password_hash, username, full_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, username, full_name, avatar_url, is_active,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(user.email.to_lowercase())
        .bind(user.password_hash)
        .bind(user.username)
        .bind(user.full_name)
        .bind(user.avatar_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply a partial profile update.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate<'_>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_profile");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                full_name = COALESCE($3, full_name),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, username, full_name, avatar_url, is_active,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(user_id)
        .bind(update.username)
        .bind(update.full_name)
        .bind(update.avatar_url)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update user's last login timestamp.
    pub async fn update_last_login(
        &self,
        user_id: Uuid,
        last_login_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_user_last_login");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(last_login_at)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Find an OAuth account by provider and provider user ID.
    pub async fn find_oauth_account(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthAccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_oauth_account");
        let result = sqlx::query_as::<_, OAuthAccountEntity>(
            r#"
            SELECT id, user_id, provider, provider_user_id, provider_email, created_at
            FROM oauth_accounts
            WHERE provider = $1 AND provider_user_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Link an OAuth identity to a user. Existing links are left untouched.
    pub async fn create_oauth_account(
        &self,
        user_id: Uuid,
        provider: &str,
        provider_user_id: &str,
        provider_email: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("create_oauth_account");
        let result = sqlx::query(
            r#"
            INSERT INTO oauth_accounts (user_id, provider, provider_user_id, provider_email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, provider_user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_user_id)
        .bind(provider_email.map(str::to_lowercase))
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Create a new user session.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            INSERT INTO user_sessions (user_id, token_hash, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, refresh_token_hash, expires_at, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a session by refresh token hash.
    pub async fn find_session_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
        user_id: Uuid,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_refresh_hash");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            SELECT id, user_id, token_hash, refresh_token_hash, expires_at, created_at, last_used_at
            FROM user_sessions
            WHERE refresh_token_hash = $1 AND user_id = $2
            "#,
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace a session's token hashes (refresh token rotation).
    pub async fn rotate_session(
        &self,
        session_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("rotate_user_session");
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET token_hash = $2, refresh_token_hash = $3, expires_at = $4, last_used_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Delete a session by ID.
    pub async fn delete_session(&self, session_id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("delete_user_session");
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    /// Delete the session holding a refresh token hash (logout).
    ///
    /// Returns the number of sessions removed.
    pub async fn delete_session_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_session_by_refresh_hash");
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE refresh_token_hash = $1 AND user_id = $2
            "#,
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
