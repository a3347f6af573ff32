//! Resolution of pending update requests
//!
//! Single-request resolution (admin approves or rejects one ledger entry)
//! and the bulk pass run when a therapist's account itself is approved.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{RequestStatus, UpdateRequest};

use super::fields::FieldPath;

/// Admin decision on a single pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Counts from a bulk resolution pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub approved: usize,
    pub rejected: usize,
}

/// Resolve one pending request in the ledger.
///
/// On approve, writes the request's `newValue` at its dot-path in `doc` and
/// then removes every *other* still-pending entry for the same field; they
/// are superseded, not individually rejected. On reject, the document is
/// left untouched. A request that is already terminal fails with
/// `InvalidState`; resolving twice is an error, not a no-op.
///
/// Returns the resolved request.
pub fn resolve(
    doc: &mut Value,
    ledger: &mut Vec<UpdateRequest>,
    request_id: Uuid,
    decision: Decision,
) -> Result<UpdateRequest> {
    let idx = ledger
        .iter()
        .position(|r| r.id == request_id)
        .ok_or_else(|| AppError::NotFound("Update request not found".to_string()))?;

    if ledger[idx].status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Update request already {}",
            ledger[idx].status.as_str()
        )));
    }

    match decision {
        Decision::Approve => {
            let path = FieldPath::parse(&ledger[idx].field)?;
            path.set(doc, ledger[idx].new_value.clone())?;
            ledger[idx].status = RequestStatus::Approved;
            ledger[idx].reviewed_at = Some(Utc::now());

            let resolved = ledger[idx].clone();
            // Clear superseded siblings: other pending entries for this field
            ledger.retain(|r| {
                r.id == resolved.id
                    || r.status != RequestStatus::Pending
                    || r.field != resolved.field
            });
            Ok(resolved)
        }
        Decision::Reject => {
            ledger[idx].status = RequestStatus::Rejected;
            ledger[idx].reviewed_at = Some(Utc::now());
            Ok(ledger[idx].clone())
        }
    }
}

/// Resolve every pending request in ledger order, as part of approving the
/// therapist's account.
///
/// A pending request with a null `newValue` should not exist (submission
/// skips null values) but is auto-rejected here rather than applied. All
/// others are applied and approved. Entries are resolved independently, so
/// no sibling-clearing happens in this pass.
pub fn approve_all(doc: &mut Value, ledger: &mut [UpdateRequest]) -> Result<BulkOutcome> {
    let mut outcome = BulkOutcome::default();
    let now = Utc::now();

    for request in ledger.iter_mut() {
        if request.status != RequestStatus::Pending {
            continue;
        }

        if request.new_value.is_null() {
            request.status = RequestStatus::Rejected;
            outcome.rejected += 1;
        } else {
            let path = FieldPath::parse(&request.field)?;
            path.set(doc, request.new_value.clone())?;
            request.status = RequestStatus::Approved;
            outcome.approved += 1;
        }
        request.reviewed_at = Some(now);
    }

    Ok(outcome)
}
