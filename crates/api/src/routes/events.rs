//! Event routes: create, list, view, edit and cancel.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::event::{
    generate_invite_code, EventFormRequest, EventListResponse, EventWithRole, HostedEventsQuery,
    ParticipatingEventsQuery,
};
use domain::models::participant::{ParticipationListResponse, ParticipationWithEvent};
use domain::models::{Event, EventStatus};
use domain::services::resolve_role;
use persistence::entities::{EventEntity, EventStatusDb, EventWrite};
use persistence::repositories::{EventRepository, ParticipantRepository};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_event_created;
use crate::services::auth::is_unique_violation;

const INVITE_CODE_INDEX: &str = "idx_events_invite_code";
const INVITE_CODE_ATTEMPTS: usize = 5;

/// Loads an event or fails with 404.
pub(crate) async fn load_event(state: &AppState, event_id: Uuid) -> Result<EventEntity, ApiError> {
    EventRepository::new(state.pool.clone())
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Fails with 403 unless `user_id` hosts the event.
pub(crate) fn require_host(event: &EventEntity, user_id: Uuid) -> Result<(), ApiError> {
    if event.host_id == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the event host can do this".to_string(),
        ))
    }
}

/// Validates the form and resolves its timestamp.
fn parse_form(
    request: EventFormRequest,
) -> Result<(EventFormRequest, chrono::DateTime<chrono::Utc>), ApiError> {
    let form = request.into_validated()?;
    let event_at = form
        .event_at()
        .ok_or_else(|| ApiError::Validation("Invalid event date or time".to_string()))?;
    Ok((form, event_at))
}

fn event_write(form: &EventFormRequest, event_at: chrono::DateTime<chrono::Utc>) -> EventWrite<'_> {
    EventWrite {
        title: &form.title,
        description: form.description.as_deref(),
        event_at,
        location: form.location.as_deref(),
        max_capacity: form.max_capacity,
        join_policy: form.join_policy.into(),
        cover_image_url: form.cover_image_url.as_deref(),
    }
}

/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<EventFormRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let (form, event_at) = parse_form(request)?;
    let data = event_write(&form, event_at);
    let repo = EventRepository::new(state.pool.clone());

    let mut attempt = 0;
    let entity = loop {
        attempt += 1;
        let code = generate_invite_code();
        match repo.create(user_auth.user_id, &code, &data).await {
            Ok(entity) => break entity,
            Err(e)
                if attempt < INVITE_CODE_ATTEMPTS
                    && is_unique_violation(&e, Some(INVITE_CODE_INDEX)) =>
            {
                tracing::debug!(attempt, "Invite code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    };

    tracing::info!(
        event_id = %entity.id,
        host_id = %entity.host_id,
        "Event created"
    );
    record_event_created();

    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// GET /api/v1/events/hosted
pub async fn list_hosted(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<HostedEventsQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let events = EventRepository::new(state.pool.clone())
        .list_hosted(
            user_auth.user_id,
            query.status.map(EventStatusDb::from),
            query.search.as_deref(),
        )
        .await?;

    Ok(Json(EventListResponse {
        data: events.into_iter().map(Event::from).collect(),
    }))
}

/// GET /api/v1/events/participating
pub async fn list_participating(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ParticipatingEventsQuery>,
) -> Result<Json<ParticipationListResponse>, ApiError> {
    let rows = ParticipantRepository::new(state.pool.clone())
        .list_for_user(user_auth.user_id, query.status.map(Into::into))
        .await?;

    Ok(Json(ParticipationListResponse {
        data: rows.into_iter().map(ParticipationWithEvent::from).collect(),
    }))
}

/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventWithRole>, ApiError> {
    let event = load_event(&state, event_id).await?;

    let participant_status = ParticipantRepository::new(state.pool.clone())
        .find_by_event_and_user(event_id, user_auth.user_id)
        .await?
        .map(|p| p.status.into());
    let participant_count = EventRepository::new(state.pool.clone())
        .count_approved(event_id)
        .await?;

    let role = resolve_role(event.host_id, user_auth.user_id, participant_status);

    Ok(Json(EventWithRole {
        event: event.into(),
        role,
        participant_status,
        participant_count,
    }))
}

/// PUT /api/v1/events/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<EventFormRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let status = EventStatus::from(event.status);
    if status != EventStatus::Active {
        return Err(ApiError::Conflict(format!(
            "A {} event cannot be edited",
            status
        )));
    }

    let (form, event_at) = parse_form(request)?;
    let updated = EventRepository::new(state.pool.clone())
        .update(event_id, &event_write(&form, event_at))
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %event_id, "Event updated");
    Ok(Json(updated.into()))
}

/// POST /api/v1/events/:event_id/cancel
pub async fn cancel_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let event = load_event(&state, event_id).await?;
    require_host(&event, user_auth.user_id)?;

    let status = EventStatus::from(event.status);
    if status != EventStatus::Active {
        return Err(ApiError::Conflict(format!("Event is already {}", status)));
    }

    let cancelled = EventRepository::new(state.pool.clone())
        .set_status(event_id, EventStatusDb::Cancelled)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %event_id, "Event cancelled");
    Ok(Json(cancelled.into()))
}
