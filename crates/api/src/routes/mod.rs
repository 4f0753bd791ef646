//! HTTP route handlers.

pub mod announcements;
pub mod auth;
pub mod comments;
pub mod events;
pub mod health;
pub mod invites;
pub mod participants;
pub mod users;
