//! Event participant entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::participant::{
    Participant, ParticipantStatus, ParticipantWithProfile, ParticipationWithEvent,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::EventEntity;
use super::user::AuthorColumns;

/// Database enum for participant_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "lowercase")]
pub enum ParticipantStatusDb {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl From<ParticipantStatusDb> for ParticipantStatus {
    fn from(db: ParticipantStatusDb) -> Self {
        match db {
            ParticipantStatusDb::Pending => ParticipantStatus::Pending,
            ParticipantStatusDb::Approved => ParticipantStatus::Approved,
            ParticipantStatusDb::Rejected => ParticipantStatus::Rejected,
            ParticipantStatusDb::Cancelled => ParticipantStatus::Cancelled,
        }
    }
}

impl From<ParticipantStatus> for ParticipantStatusDb {
    fn from(status: ParticipantStatus) -> Self {
        match status {
            ParticipantStatus::Pending => ParticipantStatusDb::Pending,
            ParticipantStatus::Approved => ParticipantStatusDb::Approved,
            ParticipantStatus::Rejected => ParticipantStatusDb::Rejected,
            ParticipantStatus::Cancelled => ParticipantStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the event_participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatusDb,
    pub joined_at: DateTime<Utc>,
    pub attended: Option<bool>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            joined_at: entity.joined_at,
            attended: entity.attended,
            rejection_reason: entity.rejection_reason,
            updated_at: entity.updated_at,
        }
    }
}

/// Participant joined with the participating user's profile.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantWithUserEntity {
    #[sqlx(flatten)]
    pub participant: ParticipantEntity,
    #[sqlx(flatten)]
    pub author: AuthorColumns,
    pub email: String,
}

impl From<ParticipantWithUserEntity> for ParticipantWithProfile {
    fn from(entity: ParticipantWithUserEntity) -> Self {
        Self {
            participant: entity.participant.into(),
            profile: entity.author.into(),
            email: entity.email,
        }
    }
}

/// Participation joined with its event.
///
/// Participant columns are aliased with a `participant_` prefix where they
/// would collide with event columns.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationWithEventEntity {
    pub participant_id: Uuid,
    pub participant_user_id: Uuid,
    pub participant_status: ParticipantStatusDb,
    pub joined_at: DateTime<Utc>,
    pub attended: Option<bool>,
    pub rejection_reason: Option<String>,
    pub participant_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub event: EventEntity,
}

impl From<ParticipationWithEventEntity> for ParticipationWithEvent {
    fn from(entity: ParticipationWithEventEntity) -> Self {
        Self {
            participant: Participant {
                id: entity.participant_id,
                event_id: entity.event.id,
                user_id: entity.participant_user_id,
                status: entity.participant_status.into(),
                joined_at: entity.joined_at,
                attended: entity.attended,
                rejection_reason: entity.rejection_reason,
                updated_at: entity.participant_updated_at,
            },
            event: entity.event.into(),
        }
    }
}

/// Count of participants in one status.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCountEntity {
    pub status: ParticipantStatusDb,
    pub count: i64,
}

impl From<StatusCountEntity> for (ParticipantStatus, i64) {
    fn from(entity: StatusCountEntity) -> Self {
        (entity.status.into(), entity.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversions() {
        for status in [
            ParticipantStatus::Pending,
            ParticipantStatus::Approved,
            ParticipantStatus::Rejected,
            ParticipantStatus::Cancelled,
        ] {
            let db: ParticipantStatusDb = status.into();
            assert_eq!(ParticipantStatus::from(db), status);
        }
    }

    #[test]
    fn test_entity_into_domain() {
        let entity = ParticipantEntity {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: ParticipantStatusDb::Rejected,
            joined_at: Utc::now(),
            attended: None,
            rejection_reason: Some("Members only".to_string()),
            updated_at: Utc::now(),
        };
        let participant: Participant = entity.clone().into();
        assert_eq!(participant.id, entity.id);
        assert_eq!(participant.status, ParticipantStatus::Rejected);
        assert_eq!(participant.rejection_reason.as_deref(), Some("Members only"));
    }
}
