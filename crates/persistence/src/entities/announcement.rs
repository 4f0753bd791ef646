//! Announcement and comment entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::announcement::{
    Announcement, AnnouncementSummary, Comment, CommentWithAuthor,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::AuthorColumns;

/// Database row mapping for the announcements table.
#[derive(Debug, Clone, FromRow)]
pub struct AnnouncementEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnnouncementEntity> for Announcement {
    fn from(entity: AnnouncementEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            author_id: entity.author_id,
            title: entity.title,
            content: entity.content,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Announcement row with author profile and comment count.
#[derive(Debug, Clone, FromRow)]
pub struct AnnouncementWithAuthorEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub author: AuthorColumns,
    pub comment_count: i64,
}

impl From<AnnouncementWithAuthorEntity> for AnnouncementSummary {
    fn from(entity: AnnouncementWithAuthorEntity) -> Self {
        Self {
            announcement: Announcement {
                id: entity.id,
                event_id: entity.event_id,
                author_id: entity.author.author_id,
                title: entity.title,
                content: entity.content,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            author: entity.author.into(),
            comment_count: entity.comment_count,
        }
    }
}

/// Database row mapping for the announcement_comments table.
#[derive(Debug, Clone, FromRow)]
pub struct CommentEntity {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentEntity> for Comment {
    fn from(entity: CommentEntity) -> Self {
        Self {
            id: entity.id,
            announcement_id: entity.announcement_id,
            author_id: entity.author_id,
            content: entity.content,
            created_at: entity.created_at,
        }
    }
}

/// Comment row with its author's profile.
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithAuthorEntity {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub author: AuthorColumns,
}

impl From<CommentWithAuthorEntity> for CommentWithAuthor {
    fn from(entity: CommentWithAuthorEntity) -> Self {
        Self {
            comment: Comment {
                id: entity.id,
                announcement_id: entity.announcement_id,
                author_id: entity.author.author_id,
                content: entity.content,
                created_at: entity.created_at,
            },
            author: entity.author.into(),
        }
    }
}
