//! Announcement and comment domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::AuthorProfile;

/// A host's announcement on an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Announcement {
    pub id: Uuid,
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on an announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Comment {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Announcement list item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnnouncementSummary {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub author: AuthorProfile,
    pub comment_count: i64,
}

/// Comment with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorProfile,
}

/// Announcement detail with comments, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnnouncementDetail {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub author: AuthorProfile,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnnouncementListResponse {
    pub data: Vec<AnnouncementSummary>,
}

/// Create/update payload for an announcement.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AnnouncementRequest {
    #[validate(
        length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, message = "Content is required"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,
}

/// Create payload for a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CommentRequest {
    #[validate(
        length(min = 1, max = 500, message = "Comment must be between 1 and 500 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,
}

/// Response for `DELETE /announcements/:id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DeleteAnnouncementResponse {
    pub event_id: Uuid,
}
