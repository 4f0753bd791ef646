//! Domain models for Meetup.

pub mod announcement;
pub mod event;
pub mod participant;
pub mod user;

pub use announcement::{Announcement, Comment};
pub use event::{Event, EventRole, EventStatus, JoinPolicy};
pub use participant::{Participant, ParticipantStatus};
pub use user::{AuthorProfile, User};
