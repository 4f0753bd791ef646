//! Event participation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::event::Event;
use super::user::AuthorProfile;

/// Status of a participation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Approved => "approved",
            ParticipantStatus::Rejected => "rejected",
            ParticipantStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and approved records block a second join.
    pub fn is_active(&self) -> bool {
        matches!(self, ParticipantStatus::Pending | ParticipantStatus::Approved)
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ParticipantStatus::Pending),
            "approved" => Ok(ParticipantStatus::Approved),
            "rejected" => Ok(ParticipantStatus::Rejected),
            "cancelled" => Ok(ParticipantStatus::Cancelled),
            _ => Err(format!("Invalid participant status: {}", s)),
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's participation in an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub attended: Option<bool>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Participant row for the host's management view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipantWithProfile {
    #[serde(flatten)]
    pub participant: Participant,
    pub profile: AuthorProfile,
    pub email: String,
}

/// Per-status counts for an event's participants.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ParticipantSummary {
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
    pub cancelled: i64,
    pub total: i64,
    pub max_capacity: Option<i32>,
}

impl ParticipantSummary {
    /// Builds a summary from `(status, count)` pairs.
    pub fn from_counts(
        counts: impl IntoIterator<Item = (ParticipantStatus, i64)>,
        max_capacity: Option<i32>,
    ) -> Self {
        let mut summary = Self {
            max_capacity,
            ..Self::default()
        };
        for (status, count) in counts {
            match status {
                ParticipantStatus::Approved => summary.approved += count,
                ParticipantStatus::Pending => summary.pending += count,
                ParticipantStatus::Rejected => summary.rejected += count,
                ParticipantStatus::Cancelled => summary.cancelled += count,
            }
            summary.total += count;
        }
        summary
    }
}

/// Query for `GET /events/:id/participants`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParticipantsQuery {
    pub status: Option<ParticipantStatus>,
}

/// Response for `GET /events/:id/participants`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipantListResponse {
    pub data: Vec<ParticipantWithProfile>,
    pub summary: ParticipantSummary,
}

/// Request payload for rejecting a participant.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RejectParticipantRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Request payload for marking attendance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceRequest {
    pub attended: bool,
}

/// One of the caller's participations together with its event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipationWithEvent {
    #[serde(flatten)]
    pub participant: Participant,
    pub event: Event,
}

/// Response for `GET /events/participating`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipationListResponse {
    pub data: Vec<ParticipationWithEvent>,
}
