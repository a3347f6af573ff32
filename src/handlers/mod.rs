//! HTTP route handlers

pub mod admin;
pub mod auth;
pub mod content;
pub mod therapist;

/// Attempts for the load-mutate-CAS cycle on therapist records before a
/// concurrent-modification conflict is surfaced to the caller
pub(crate) const MAX_WRITE_RETRIES: usize = 3;
