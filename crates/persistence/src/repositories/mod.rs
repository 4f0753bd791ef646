//! Repository implementations for database operations.

pub mod announcement;
pub mod event;
pub mod participant;
pub mod user;

pub use announcement::AnnouncementRepository;
pub use event::EventRepository;
pub use participant::{JoinResult, ParticipantRepository, WorkflowError};
pub use user::{NewUser, ProfileUpdate, UserRepository};
