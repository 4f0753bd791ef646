//! Announcement and comment repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    AnnouncementEntity, AnnouncementWithAuthorEntity, CommentEntity, CommentWithAuthorEntity,
};
use crate::metrics::QueryTimer;

/// Repository for announcements and their comments.
#[derive(Clone)]
pub struct AnnouncementRepository {
    pool: PgPool,
}

impl AnnouncementRepository {
    /// Creates a new AnnouncementRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an announcement on an event.
    pub async fn create(
        &self,
        event_id: Uuid,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<AnnouncementEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_announcement");
        let result = sqlx::query_as::<_, AnnouncementEntity>(
            r#"
            INSERT INTO announcements (event_id, author_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, author_id, title, content, created_at, updated_at
            "#,
        )
        .bind(event_id)
        .bind(author_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an announcement by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AnnouncementEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_announcement_by_id");
        let result = sqlx::query_as::<_, AnnouncementEntity>(
            r#"
            SELECT id, event_id, author_id, title, content, created_at, updated_at
            FROM announcements
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an announcement with its author and comment count.
    pub async fn find_with_author(
        &self,
        id: Uuid,
    ) -> Result<Option<AnnouncementWithAuthorEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_announcement_with_author");
        let result = sqlx::query_as::<_, AnnouncementWithAuthorEntity>(
            r#"
            SELECT a.id, a.event_id, a.title, a.content, a.created_at, a.updated_at,
                   u.id AS author_id, u.username AS author_username,
                   u.full_name AS author_full_name, u.avatar_url AS author_avatar_url,
                   (SELECT COUNT(*) FROM announcement_comments c WHERE c.announcement_id = a.id)
                       AS comment_count
            FROM announcements a
            JOIN users u ON u.id = a.author_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List an event's announcements, newest first.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<AnnouncementWithAuthorEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_announcements");
        let result = sqlx::query_as::<_, AnnouncementWithAuthorEntity>(
            r#"
            SELECT a.id, a.event_id, a.title, a.content, a.created_at, a.updated_at,
                   u.id AS author_id, u.username AS author_username,
                   u.full_name AS author_full_name, u.avatar_url AS author_avatar_url,
                   (SELECT COUNT(*) FROM announcement_comments c WHERE c.announcement_id = a.id)
                       AS comment_count
            FROM announcements a
            JOIN users u ON u.id = a.author_id
            WHERE a.event_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update title and content.
    pub async fn update(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<AnnouncementEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_announcement");
        let result = sqlx::query_as::<_, AnnouncementEntity>(
            r#"
            UPDATE announcements
            SET title = $2, content = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, event_id, author_id, title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete an announcement. Its comments are removed by cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_announcement");
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Add a comment to an announcement.
    pub async fn create_comment(
        &self,
        announcement_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<CommentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_comment");
        let result = sqlx::query_as::<_, CommentEntity>(
            r#"
            INSERT INTO announcement_comments (announcement_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, announcement_id, author_id, content, created_at
            "#,
        )
        .bind(announcement_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a comment by ID.
    pub async fn find_comment(&self, id: Uuid) -> Result<Option<CommentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_comment_by_id");
        let result = sqlx::query_as::<_, CommentEntity>(
            r#"
            SELECT id, announcement_id, author_id, content, created_at
            FROM announcement_comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List comments on an announcement, oldest first.
    pub async fn list_comments(
        &self,
        announcement_id: Uuid,
    ) -> Result<Vec<CommentWithAuthorEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_announcement_comments");
        let result = sqlx::query_as::<_, CommentWithAuthorEntity>(
            r#"
            SELECT c.id, c.announcement_id, c.content, c.created_at,
                   u.id AS author_id, u.username AS author_username,
                   u.full_name AS author_full_name, u.avatar_url AS author_avatar_url
            FROM announcement_comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.announcement_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(announcement_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_comment");
        let result = sqlx::query("DELETE FROM announcement_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
