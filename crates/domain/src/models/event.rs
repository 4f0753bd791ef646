//! Event domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use shared::crypto::{random_string, UPPER_ALPHANUMERIC};
use shared::validation::INVITE_CODE_LENGTH;

use super::participant::ParticipantStatus;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    /// Only active events accept new participants.
    pub fn accepts_joins(&self) -> bool {
        matches!(self, EventStatus::Active)
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EventStatus::Active),
            "cancelled" => Ok(EventStatus::Cancelled),
            "completed" => Ok(EventStatus::Completed),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How join requests are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Joins are approved immediately.
    Open,
    /// The host approves each join.
    Approval,
}

impl JoinPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinPolicy::Open => "open",
            JoinPolicy::Approval => "approval",
        }
    }
}

impl FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(JoinPolicy::Open),
            "approval" => Ok(JoinPolicy::Approval),
            _ => Err(format!("Invalid join policy: {}", s)),
        }
    }
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_at: DateTime<Utc>,
    pub location: Option<String>,
    pub max_capacity: Option<i32>,
    pub join_policy: JoinPolicy,
    pub status: EventStatus,
    pub invite_code: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// True when a capacity is set and `approved_count` has reached it.
    pub fn is_full(&self, approved_count: i64) -> bool {
        is_at_capacity(self.max_capacity, approved_count)
    }
}

/// True when `max_capacity` is set and `approved_count` has reached it.
pub fn is_at_capacity(max_capacity: Option<i32>, approved_count: i64) -> bool {
    max_capacity.is_some_and(|cap| approved_count >= i64::from(cap))
}

/// Generates an 8-character uppercase alphanumeric invite code.
pub fn generate_invite_code() -> String {
    random_string(INVITE_CODE_LENGTH, UPPER_ALPHANUMERIC)
}

/// Create/update payload for an event.
///
/// Date and time arrive as separate form fields and are combined into
/// `event_at` in UTC.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct EventFormRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Title must be between 2 and 100 characters"
    ))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "shared::validation::validate_event_date"))]
    pub event_date: String,

    #[validate(custom(function = "shared::validation::validate_event_time"))]
    pub event_time: String,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    #[validate(range(min = 1, message = "Capacity must be a positive number"))]
    pub max_capacity: Option<i32>,

    pub join_policy: JoinPolicy,

    #[validate(url(message = "Invalid cover image URL format"))]
    pub cover_image_url: Option<String>,
}

impl EventFormRequest {
    /// Combines `event_date` and `event_time` into a UTC timestamp.
    ///
    /// Returns `None` when either part does not parse; call after `validate()`.
    pub fn event_at(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(&self.event_date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.event_time, "%H:%M").ok()?;
        Some(NaiveDateTime::new(date, time).and_utc())
    }

    /// Normalizes the form, then validates the trimmed values.
    pub fn into_validated(self) -> Result<Self, ValidationErrors> {
        let form = self.normalized();
        form.validate()?;
        Ok(form)
    }

    /// Trimmed copy with blank optional strings turned into `None`.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = non_blank(self.description);
        self.location = non_blank(self.location);
        self.cover_image_url = non_blank(self.cover_image_url);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Query for `GET /events/hosted`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostedEventsQuery {
    pub status: Option<EventStatus>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

/// Query for `GET /events/participating`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipatingEventsQuery {
    pub status: Option<ParticipantStatus>,
}

/// The caller's relationship to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    Host,
    Participant,
    None,
}

impl EventRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventRole::Host => "host",
            EventRole::Participant => "participant",
            EventRole::None => "none",
        }
    }
}

impl fmt::Display for EventRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event detail as seen by a particular user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventWithRole {
    pub event: Event,
    pub role: EventRole,
    pub participant_status: Option<ParticipantStatus>,
    /// Approved participants only.
    pub participant_count: i64,
}

/// Response for event listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventListResponse {
    pub data: Vec<Event>,
}

/// Event fields shown on the public invite page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicEventInfo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_at: DateTime<Utc>,
    pub location: Option<String>,
    pub max_capacity: Option<i32>,
    pub join_policy: JoinPolicy,
    pub status: EventStatus,
    pub cover_image_url: Option<String>,
    pub host_name: String,
}

/// What the invite page knows about the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InviteViewer {
    pub is_logged_in: bool,
    pub is_host: bool,
    pub status: Option<ParticipantStatus>,
}

/// Response for `GET /invites/:code`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitePreview {
    pub event: PublicEventInfo,
    pub participant_count: i64,
    pub is_full: bool,
    pub viewer: InviteViewer,
}
