//! Classification of profile update submissions
//!
//! Splits an incoming partial-update payload into direct mutations (applied
//! to the document here) and pending update requests (queued for admin
//! review). Classification is pure; the caller persists the outcome in a
//! single write.

use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::UpdateRequest;

use super::fields;

/// Result of classifying one submission
#[derive(Debug)]
pub struct SubmitOutcome {
    /// The profile document with direct changes already applied
    pub doc: Value,
    /// Newly created pending requests, one per changed governed leaf
    pub new_requests: Vec<UpdateRequest>,
    /// Whether any direct field was mutated
    pub direct_changed: bool,
}

/// Classify `payload` against the current profile document.
///
/// Disallowed and unknown keys are skipped silently. Null proposed values are
/// never treated as a change; explicitly clearing a field is not supported
/// through this path. Governed values are compared leaf-by-leaf with deep
/// equality, and each changed leaf becomes its own pending request.
///
/// Returns `BadRequest` when the submission produced neither a direct
/// mutation nor a new request, so callers never persist a no-op.
pub fn submit_update(current: &Value, payload: &Map<String, Value>) -> Result<SubmitOutcome> {
    let mut doc = current.clone();
    let mut new_requests = Vec::new();
    let mut direct_changed = false;

    for (key, proposed) in payload {
        if fields::is_disallowed(key) || proposed.is_null() {
            continue;
        }

        if fields::is_governed(key) {
            for (path_str, leaf_value) in fields::expand_governed(key, proposed) {
                if leaf_value.is_null() {
                    continue;
                }
                let path = fields::FieldPath::parse(&path_str)?;
                let old_value = path.get(current).cloned().unwrap_or(Value::Null);
                if old_value != leaf_value {
                    new_requests.push(UpdateRequest::new(path_str, old_value, leaf_value));
                }
            }
        } else if fields::is_direct(key) {
            let old_value = doc.get(key).cloned().unwrap_or(Value::Null);
            if old_value != *proposed {
                let path = fields::FieldPath::parse(key)?;
                path.set(&mut doc, proposed.clone())?;
                direct_changed = true;
            }
        }
        // Unknown keys fall through: not part of the profile schema
    }

    if new_requests.is_empty() && !direct_changed {
        return Err(AppError::BadRequest("No valid changes".to_string()));
    }

    Ok(SubmitOutcome {
        doc,
        new_requests,
        direct_changed,
    })
}
