//! Participant management routes. All but self-cancel are host only.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use domain::models::participant::{
    AttendanceRequest, ListParticipantsQuery, ParticipantListResponse, ParticipantSummary,
    ParticipantWithProfile, RejectParticipantRequest,
};
use domain::models::{Participant, ParticipantStatus};
use persistence::repositories::{ParticipantRepository, WorkflowError};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_participant_transition;
use crate::routes::events::{load_event, require_host};

/// Logs a refused transition before handing the error back.
fn log_rejected(action: &'static str, event_id: Uuid, e: WorkflowError) -> WorkflowError {
    if let WorkflowError::Transition(reason) = &e {
        tracing::warn!(%event_id, action, reason = %reason, "Participant transition rejected");
    }
    e
}

/// GET /api/v1/events/:event_id/participants
pub async fn list_participants(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListParticipantsQuery>,
) -> Result<Json<ParticipantListResponse>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let repo = ParticipantRepository::new(state.pool.clone());
    let rows = repo
        .list_for_event(event_id, query.status.map(Into::into))
        .await?;
    let counts = repo.count_by_status(event_id).await?;

    let summary = ParticipantSummary::from_counts(
        counts.into_iter().map(<(ParticipantStatus, i64)>::from),
        event.max_capacity,
    );

    Ok(Json(ParticipantListResponse {
        data: rows.into_iter().map(ParticipantWithProfile::from).collect(),
        summary,
    }))
}

/// POST /api/v1/events/:event_id/participants/:participant_id/approve
pub async fn approve_participant(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((event_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Participant>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let participant = ParticipantRepository::new(state.pool.clone())
        .approve(event_id, participant_id)
        .await
        .map_err(|e| log_rejected("approve", event_id, e))?;

    tracing::info!(%event_id, %participant_id, "Participant approved");
    record_participant_transition("approve");
    Ok(Json(participant.into()))
}

/// POST /api/v1/events/:event_id/participants/:participant_id/reject
pub async fn reject_participant(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((event_id, participant_id)): Path<(Uuid, Uuid)>,
    body: Result<Json<RejectParticipantRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let request = reject_request(body)?;
    request.validate()?;

    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let participant = ParticipantRepository::new(state.pool.clone())
        .reject(event_id, participant_id, reason)
        .await
        .map_err(|e| log_rejected("reject", event_id, e))?;

    tracing::info!(%event_id, %participant_id, "Participant rejected");
    record_participant_transition("reject");
    Ok(Json(participant.into()))
}

/// The reject body is optional; a body that is present must be valid JSON.
fn reject_request(
    body: Result<Json<RejectParticipantRequest>, JsonRejection>,
) -> Result<RejectParticipantRequest, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(RejectParticipantRequest::default()),
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    }
}

/// PATCH /api/v1/events/:event_id/participants/:participant_id/attendance
pub async fn mark_attendance(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((event_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<Participant>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let participant = ParticipantRepository::new(state.pool.clone())
        .set_attendance(event_id, participant_id, request.attended)
        .await
        .map_err(|e| log_rejected("attendance", event_id, e))?;

    tracing::info!(
        %event_id,
        %participant_id,
        attended = request.attended,
        "Attendance recorded"
    );
    record_participant_transition("attendance");
    Ok(Json(participant.into()))
}

/// POST /api/v1/events/:event_id/participation/cancel
pub async fn cancel_participation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Participant>, ApiError> {
    let participant = ParticipantRepository::new(state.pool.clone())
        .cancel_own(event_id, user_auth.user_id)
        .await
        .map_err(|e| log_rejected("cancel", event_id, e))?;

    tracing::info!(%event_id, user_id = %user_auth.user_id, "Participation cancelled");
    record_participant_transition("cancel");
    Ok(Json(participant.into()))
}
