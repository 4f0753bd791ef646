//! User, OAuth account and session entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::user::{AuthorProfile, OAuthAccount, UserSession};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            username: entity.username,
            full_name: entity.full_name,
            avatar_url: entity.avatar_url,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            last_login_at: entity.last_login_at,
        }
    }
}

/// Author columns selected alongside announcements, comments and participants.
///
/// Queries alias them as `author_id`, `author_username`, `author_full_name`
/// and `author_avatar_url`.
#[derive(Debug, Clone, FromRow)]
pub struct AuthorColumns {
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub author_full_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl From<AuthorColumns> for AuthorProfile {
    fn from(cols: AuthorColumns) -> Self {
        Self {
            id: cols.author_id,
            username: cols.author_username,
            full_name: cols.author_full_name,
            avatar_url: cols.author_avatar_url,
        }
    }
}

/// Database row mapping for the oauth_accounts table.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthAccountEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OAuthAccountEntity> for OAuthAccount {
    fn from(entity: OAuthAccountEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            provider: entity.provider,
            provider_user_id: entity.provider_user_id,
            provider_email: entity.provider_email,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the user_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSessionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl From<UserSessionEntity> for UserSession {
    fn from(entity: UserSessionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            refresh_token_hash: entity.refresh_token_hash,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
            last_used_at: entity.last_used_at,
        }
    }
}
