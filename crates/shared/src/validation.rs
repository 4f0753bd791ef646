//! Common validation utilities.
//!
//! Custom validators for use with `#[validate(custom(function = ...))]`.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Length of a generated invite code.
pub const INVITE_CODE_LENGTH: usize = 8;

lazy_static! {
    static ref TIME_REGEX: Regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();
    static ref INVITE_CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9]{8}$").unwrap();
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]{3,30}$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a calendar date in `YYYY-MM-DD` form.
pub fn validate_event_date(date: &str) -> Result<(), ValidationError> {
    if date.trim().is_empty() {
        return Err(error("event_date_required", "Please select a date"));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| error("event_date_format", "Date must be in YYYY-MM-DD format"))
}

/// Validates a wall-clock time in `HH:MM` form.
pub fn validate_event_time(time: &str) -> Result<(), ValidationError> {
    if !TIME_REGEX.is_match(time) {
        return Err(error("event_time_format", "Time must be in HH:MM format"));
    }
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| error("event_time_range", "Time is out of range"))
}

/// Validates an invite code: eight uppercase letters or digits.
pub fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if INVITE_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        Err(error(
            "invite_code_format",
            "Invite code must be 8 uppercase letters or digits",
        ))
    }
}

/// Validates a username: 3-30 characters of letters, digits or underscore.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(error(
            "username_format",
            "Username must be 3-30 letters, digits or underscores",
        ))
    }
}

/// Rejects strings that are empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Must not be blank"))
    } else {
        Ok(())
    }
}
