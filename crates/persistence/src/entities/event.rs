//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::event::{Event, EventStatus, JoinPolicy};
use domain::services::participation::EventSnapshot;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Active,
    Cancelled,
    Completed,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Active => EventStatus::Active,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
            EventStatusDb::Completed => EventStatus::Completed,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Active => EventStatusDb::Active,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
            EventStatus::Completed => EventStatusDb::Completed,
        }
    }
}

/// Database enum for join_policy that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "join_policy", rename_all = "lowercase")]
pub enum JoinPolicyDb {
    Open,
    Approval,
}

impl From<JoinPolicyDb> for JoinPolicy {
    fn from(db: JoinPolicyDb) -> Self {
        match db {
            JoinPolicyDb::Open => JoinPolicy::Open,
            JoinPolicyDb::Approval => JoinPolicy::Approval,
        }
    }
}

impl From<JoinPolicy> for JoinPolicyDb {
    fn from(policy: JoinPolicy) -> Self {
        match policy {
            JoinPolicy::Open => JoinPolicyDb::Open,
            JoinPolicy::Approval => JoinPolicyDb::Approval,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_at: DateTime<Utc>,
    pub location: Option<String>,
    pub max_capacity: Option<i32>,
    pub join_policy: JoinPolicyDb,
    pub status: EventStatusDb,
    pub invite_code: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            host_id: entity.host_id,
            title: entity.title,
            description: entity.description,
            event_at: entity.event_at,
            location: entity.location,
            max_capacity: entity.max_capacity,
            join_policy: entity.join_policy.into(),
            status: entity.status.into(),
            invite_code: entity.invite_code,
            cover_image_url: entity.cover_image_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&EventEntity> for EventSnapshot {
    fn from(entity: &EventEntity) -> Self {
        Self {
            host_id: entity.host_id,
            status: entity.status.into(),
            join_policy: entity.join_policy.into(),
            max_capacity: entity.max_capacity,
        }
    }
}

/// Values written by create and update.
#[derive(Debug, Clone)]
pub struct EventWrite<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub event_at: DateTime<Utc>,
    pub location: Option<&'a str>,
    pub max_capacity: Option<i32>,
    pub join_policy: JoinPolicyDb,
    pub cover_image_url: Option<&'a str>,
}
