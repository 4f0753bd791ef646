//! Shared utilities and common types for the Meetup backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing and random token helpers
//! - JWT access/refresh tokens
//! - Password policy and Argon2id hashing
//! - Field validators shared by request DTOs
//! - Redirect path sanitizing for auth flows

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod redirect;
pub mod validation;
