//! Join and approval workflow.
//!
//! Pure decision functions over an event snapshot, the caller's existing
//! participation (if any) and the current approved count. Repositories call
//! these inside a transaction that holds a lock on the event row, so the
//! count passed in cannot change before the write lands.

use thiserror::Error;
use uuid::Uuid;

use crate::models::event::{is_at_capacity, EventRole, EventStatus, JoinPolicy};
use crate::models::participant::ParticipantStatus;

/// The event fields the workflow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSnapshot {
    pub host_id: Uuid,
    pub status: EventStatus,
    pub join_policy: JoinPolicy,
    pub max_capacity: Option<i32>,
}

/// Why a join attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinRejection {
    #[error("This event is {0} and no longer accepts participants")]
    EventNotActive(EventStatus),

    #[error("The host cannot join their own event")]
    HostCannotJoin,

    #[error("You have already joined this event ({0})")]
    AlreadyParticipating(ParticipantStatus),

    #[error("This event is full")]
    EventFull,
}

/// Outcome of an accepted join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub status: ParticipantStatus,
    /// An existing cancelled/rejected row is reset instead of inserting.
    pub rejoin: bool,
}

/// Decides whether `user_id` may join the event.
pub fn evaluate_join(
    event: &EventSnapshot,
    user_id: Uuid,
    existing: Option<ParticipantStatus>,
    approved_count: i64,
) -> Result<JoinOutcome, JoinRejection> {
    if !event.status.accepts_joins() {
        return Err(JoinRejection::EventNotActive(event.status));
    }
    if event.host_id == user_id {
        return Err(JoinRejection::HostCannotJoin);
    }
    if let Some(status) = existing.filter(ParticipantStatus::is_active) {
        return Err(JoinRejection::AlreadyParticipating(status));
    }
    if is_at_capacity(event.max_capacity, approved_count) {
        return Err(JoinRejection::EventFull);
    }

    let status = match event.join_policy {
        JoinPolicy::Open => ParticipantStatus::Approved,
        JoinPolicy::Approval => ParticipantStatus::Pending,
    };

    Ok(JoinOutcome {
        status,
        rejoin: existing.is_some(),
    })
}

/// Why a participant status change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Only pending requests can be approved or rejected (current: {0})")]
    NotPending(ParticipantStatus),

    #[error("Only pending or approved participation can be cancelled (current: {0})")]
    NotCancellable(ParticipantStatus),

    #[error("Attendance can only be recorded for approved participants (current: {0})")]
    NotApproved(ParticipantStatus),

    #[error("This event is full")]
    EventFull,
}

/// Host approval of a pending request. Capacity is re-checked here.
pub fn approve(
    current: ParticipantStatus,
    max_capacity: Option<i32>,
    approved_count: i64,
) -> Result<ParticipantStatus, TransitionError> {
    if current != ParticipantStatus::Pending {
        return Err(TransitionError::NotPending(current));
    }
    if is_at_capacity(max_capacity, approved_count) {
        return Err(TransitionError::EventFull);
    }
    Ok(ParticipantStatus::Approved)
}

/// Host rejection of a pending request.
pub fn reject(current: ParticipantStatus) -> Result<ParticipantStatus, TransitionError> {
    if current != ParticipantStatus::Pending {
        return Err(TransitionError::NotPending(current));
    }
    Ok(ParticipantStatus::Rejected)
}

/// The participant withdrawing on their own.
pub fn cancel(current: ParticipantStatus) -> Result<ParticipantStatus, TransitionError> {
    if !current.is_active() {
        return Err(TransitionError::NotCancellable(current));
    }
    Ok(ParticipantStatus::Cancelled)
}

/// Guard for host attendance marking.
pub fn check_attendance(current: ParticipantStatus) -> Result<(), TransitionError> {
    match current {
        ParticipantStatus::Approved => Ok(()),
        other => Err(TransitionError::NotApproved(other)),
    }
}

/// The caller's role with respect to an event.
pub fn resolve_role(
    host_id: Uuid,
    user_id: Uuid,
    participation: Option<ParticipantStatus>,
) -> EventRole {
    if host_id == user_id {
        EventRole::Host
    } else if participation.is_some() {
        EventRole::Participant
    } else {
        EventRole::None
    }
}

/// Host and approved participants may read and comment on announcements.
pub fn can_access_announcements(
    host_id: Uuid,
    user_id: Uuid,
    participation: Option<ParticipantStatus>,
) -> bool {
    host_id == user_id || participation == Some(ParticipantStatus::Approved)
}
