//! Invite link routes: public preview and join.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::event::{InvitePreview, InviteViewer, PublicEventInfo};
use domain::models::{Event, Participant, User};
use domain::services::JoinRejection;
use persistence::repositories::{
    EventRepository, ParticipantRepository, UserRepository, WorkflowError,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{OptionalUserAuth, UserAuth};
use crate::middleware::metrics::record_join;

/// Invite codes are matched case-insensitively.
fn normalize_code(code: &str) -> Result<String, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    shared::validation::validate_invite_code(&code)
        .map_err(|_| ApiError::NotFound("Invite not found".to_string()))?;
    Ok(code)
}

fn rejection_label(rejection: &JoinRejection) -> &'static str {
    match rejection {
        JoinRejection::EventNotActive(_) => "event_not_active",
        JoinRejection::HostCannotJoin => "host",
        JoinRejection::AlreadyParticipating(_) => "duplicate",
        JoinRejection::EventFull => "full",
    }
}

/// GET /api/v1/invites/:code
pub async fn preview_invite(
    State(state): State<AppState>,
    OptionalUserAuth(viewer): OptionalUserAuth,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, ApiError> {
    let code = normalize_code(&code)?;
    let events = EventRepository::new(state.pool.clone());

    let event: Event = events
        .find_by_invite_code(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?
        .into();

    let host_name = UserRepository::new(state.pool.clone())
        .find_by_id(event.host_id)
        .await?
        .map(|host| User::from(host).display_name().to_string())
        .unwrap_or_default();

    let participant_count = events.count_approved(event.id).await?;

    let viewer = match viewer {
        Some(auth) => {
            let status = ParticipantRepository::new(state.pool.clone())
                .find_by_event_and_user(event.id, auth.user_id)
                .await?
                .map(|p| p.status.into());
            InviteViewer {
                is_logged_in: true,
                is_host: auth.user_id == event.host_id,
                status,
            }
        }
        None => InviteViewer {
            is_logged_in: false,
            is_host: false,
            status: None,
        },
    };

    let is_full = event.is_full(participant_count);
    Ok(Json(InvitePreview {
        event: PublicEventInfo {
            id: event.id,
            title: event.title,
            description: event.description,
            event_at: event.event_at,
            location: event.location,
            max_capacity: event.max_capacity,
            join_policy: event.join_policy,
            status: event.status,
            cover_image_url: event.cover_image_url,
            host_name,
        },
        participant_count,
        is_full,
        viewer,
    }))
}

/// POST /api/v1/invites/:code/join
pub async fn join_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let code = normalize_code(&code)?;

    let result = ParticipantRepository::new(state.pool.clone())
        .join_by_invite_code(&code, user_auth.user_id)
        .await
        .map_err(|e| {
            if let WorkflowError::Join(rejection) = &e {
                tracing::warn!(
                    user_id = %user_auth.user_id,
                    reason = %rejection,
                    "Join rejected"
                );
                record_join(rejection_label(rejection));
            }
            e
        })?;

    tracing::info!(
        event_id = %result.event.id,
        participant_id = %result.participant.id,
        user_id = %user_auth.user_id,
        status = %result.outcome.status,
        rejoin = result.outcome.rejoin,
        "Participant joined"
    );
    record_join(result.outcome.status.as_str());

    Ok((StatusCode::CREATED, Json(result.participant.into())))
}
