//! Comments on announcements.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::announcement::CommentRequest;
use domain::models::Comment;
use persistence::repositories::AnnouncementRepository;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::announcements::{load_announcement, require_member};
use crate::routes::events::load_event;

/// POST /api/v1/announcements/:announcement_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(announcement_id): Path<Uuid>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    request.validate()?;

    let announcement = load_announcement(&state, announcement_id).await?;
    let event = load_event(&state, announcement.event_id).await?;
    require_member(&state, &event, user_auth.user_id).await?;

    let comment = AnnouncementRepository::new(state.pool.clone())
        .create_comment(announcement_id, user_auth.user_id, request.content.trim())
        .await?;

    tracing::info!(
        %announcement_id,
        comment_id = %comment.id,
        author_id = %user_auth.user_id,
        "Comment added"
    );
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// DELETE /api/v1/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = AnnouncementRepository::new(state.pool.clone());
    let comment = repo
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != user_auth.user_id {
        tracing::warn!(%comment_id, user_id = %user_auth.user_id, "Comment delete refused");
        return Err(ApiError::Forbidden(
            "Only the author can delete this comment".to_string(),
        ));
    }

    if !repo.delete_comment(comment_id).await? {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(%comment_id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
