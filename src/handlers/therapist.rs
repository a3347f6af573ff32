//! Therapist profile handlers, including the update-request submission path

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::approval;
use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{RequestStatus, Role};
use crate::AppState;

use super::MAX_WRITE_RETRIES;

/// Submit a partial profile update.
///
/// Direct fields are applied immediately; governed fields become pending
/// update requests in the ledger. The whole submission persists in one
/// compare-and-swap write, retried on concurrent modification.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<Map<String, Value>>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Therapist)?;

    for _ in 0..MAX_WRITE_RETRIES {
        let mut therapist = state.store.get_therapist(auth.id).await?;

        let doc = serde_json::to_value(&therapist.profile)
            .map_err(|e| AppError::Internal(format!("Profile serialization failed: {}", e)))?;
        let outcome = approval::submit_update(&doc, &payload)?;

        therapist.profile = serde_json::from_value(outcome.doc)
            .map_err(|e| AppError::BadRequest(format!("Invalid profile value: {}", e)))?;
        let new_requests = outcome.new_requests;
        therapist.update_requests.extend(new_requests.iter().cloned());

        if state.store.try_save_therapist(&therapist).await? {
            tracing::info!(
                therapist_id = %auth.id,
                queued = new_requests.len(),
                direct = outcome.direct_changed,
                "profile update submitted"
            );

            if new_requests.is_empty() {
                return Ok(Json(json!({
                    "message": "Profile updated successfully"
                })));
            }
            return Ok(Json(json!({
                "message": "Profile update requests submitted. Waiting for admin approval.",
                "pendingRequests": new_requests,
            })));
        }
        tracing::debug!(therapist_id = %auth.id, "concurrent profile write, retrying");
    }

    Err(AppError::Conflict(
        "Profile was modified concurrently, please retry".to_string(),
    ))
}

pub async fn list_therapists(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let therapists = state.store.list_therapists().await?;
    Ok(Json(json!({
        "count": therapists.len(),
        "therapists": therapists,
    })))
}

pub async fn list_approved(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let therapists = state.store.list_approved_therapists().await?;
    Ok(Json(json!({
        "count": therapists.len(),
        "therapists": therapists,
    })))
}

/// Fetch one therapist. Resolved ledger entries are audit trail and stay
/// internal; the response carries only the pending ones.
pub async fn get_therapist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let mut therapist = state.store.get_therapist(id).await?;
    therapist
        .update_requests
        .retain(|r| r.status == RequestStatus::Pending);

    Ok(Json(json!({ "therapist": therapist })))
}
