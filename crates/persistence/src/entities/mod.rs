//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod announcement;
pub mod event;
pub mod participant;
pub mod user;

pub use announcement::{
    AnnouncementEntity, AnnouncementWithAuthorEntity, CommentEntity, CommentWithAuthorEntity,
};
pub use event::{EventEntity, EventStatusDb, EventWrite, JoinPolicyDb};
pub use participant::{
    ParticipantEntity, ParticipantStatusDb, ParticipantWithUserEntity,
    ParticipationWithEventEntity, StatusCountEntity,
};
pub use user::{AuthorColumns, OAuthAccountEntity, UserEntity, UserSessionEntity};
