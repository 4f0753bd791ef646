//! Event announcements. Readable by the host and approved participants.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::announcement::{
    AnnouncementDetail, AnnouncementListResponse, AnnouncementRequest, AnnouncementSummary,
    CommentWithAuthor, DeleteAnnouncementResponse,
};
use domain::models::Announcement;
use domain::services::can_access_announcements;
use persistence::entities::{AnnouncementEntity, EventEntity};
use persistence::repositories::{AnnouncementRepository, ParticipantRepository};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::events::{load_event, require_host};

/// Fails with 403 unless the user hosts the event or is an approved participant.
pub(crate) async fn require_member(
    state: &AppState,
    event: &EventEntity,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if event.host_id == user_id {
        return Ok(());
    }
    let status = ParticipantRepository::new(state.pool.clone())
        .find_by_event_and_user(event.id, user_id)
        .await?
        .map(|p| p.status.into());

    if can_access_announcements(event.host_id, user_id, status) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the host and approved participants can view announcements".to_string(),
        ))
    }
}

pub(crate) async fn load_announcement(
    state: &AppState,
    announcement_id: Uuid,
) -> Result<AnnouncementEntity, ApiError> {
    AnnouncementRepository::new(state.pool.clone())
        .find_by_id(announcement_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Announcement not found".to_string()))
}

fn require_author(announcement: &AnnouncementEntity, user_id: Uuid) -> Result<(), ApiError> {
    if announcement.author_id == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the author can change this announcement".to_string(),
        ))
    }
}

/// GET /api/v1/events/:event_id/announcements
pub async fn list_announcements(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<AnnouncementListResponse>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_member(&state, &event, user_auth.user_id).await?;

    let rows = AnnouncementRepository::new(state.pool.clone())
        .list_for_event(event_id)
        .await?;

    Ok(Json(AnnouncementListResponse {
        data: rows.into_iter().map(AnnouncementSummary::from).collect(),
    }))
}

/// POST /api/v1/events/:event_id/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    request.validate()?;

    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let announcement = AnnouncementRepository::new(state.pool.clone())
        .create(
            event_id,
            user_auth.user_id,
            request.title.trim(),
            request.content.trim(),
        )
        .await?;

    tracing::info!(
        %event_id,
        announcement_id = %announcement.id,
        "Announcement created"
    );
    Ok((StatusCode::CREATED, Json(announcement.into())))
}

/// GET /api/v1/announcements/:announcement_id
pub async fn get_announcement(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(announcement_id): Path<Uuid>,
) -> Result<Json<AnnouncementDetail>, ApiError> {
    let repo = AnnouncementRepository::new(state.pool.clone());
    let summary: AnnouncementSummary = repo
        .find_with_author(announcement_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Announcement not found".to_string()))?
        .into();

    let event = load_event(&state, summary.announcement.event_id).await?;
    require_member(&state, &event, user_auth.user_id).await?;

    let comments = repo
        .list_comments(announcement_id)
        .await?
        .into_iter()
        .map(CommentWithAuthor::from)
        .collect();

    Ok(Json(AnnouncementDetail {
        announcement: summary.announcement,
        author: summary.author,
        comments,
    }))
}

/// PUT /api/v1/announcements/:announcement_id
pub async fn update_announcement(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(announcement_id): Path<Uuid>,
    Json(request): Json<AnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    request.validate()?;

    let existing = load_announcement(&state, announcement_id).await?;
    require_author(&existing, user_auth.user_id)?;

    let updated = AnnouncementRepository::new(state.pool.clone())
        .update(announcement_id, request.title.trim(), request.content.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Announcement not found".to_string()))?;

    tracing::info!(%announcement_id, "Announcement updated");
    Ok(Json(updated.into()))
}

/// DELETE /api/v1/announcements/:announcement_id
pub async fn delete_announcement(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(announcement_id): Path<Uuid>,
) -> Result<Json<DeleteAnnouncementResponse>, ApiError> {
    let existing = load_announcement(&state, announcement_id).await?;
    require_author(&existing, user_auth.user_id)?;

    let deleted = AnnouncementRepository::new(state.pool.clone())
        .delete(announcement_id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Announcement not found".to_string()));
    }

    tracing::info!(%announcement_id, event_id = %existing.event_id, "Announcement deleted");
    Ok(Json(DeleteAnnouncementResponse {
        event_id: existing.event_id,
    }))
}
