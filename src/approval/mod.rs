//! Therapist profile update-request workflow
//!
//! Profile edits to governed fields are diverted into a pending-approval
//! ledger embedded in the therapist record; an admin applies or rejects them
//! later. Direct fields bypass the ledger and take effect immediately.
//!
//! The functions here are pure over `serde_json::Value` documents; handlers
//! own loading, persistence and the optimistic-concurrency retry loop.

pub mod fields;
pub mod ledger;
pub mod resolver;

pub use fields::FieldPath;
pub use ledger::{submit_update, SubmitOutcome};
pub use resolver::{approve_all, resolve, BulkOutcome, Decision};
