//! Domain layer for the Meetup backend.
//!
//! This crate contains:
//! - Domain models (Event, Participant, Announcement, User) and request DTOs
//! - The join/approval workflow and role resolution

pub mod models;
pub mod services;
