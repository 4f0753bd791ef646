//! Domain services for Meetup.
//!
//! Services contain business logic that operates on domain models.

pub mod participation;

pub use participation::{
    can_access_announcements, evaluate_join, resolve_role, EventSnapshot, JoinOutcome,
    JoinRejection, TransitionError,
};
