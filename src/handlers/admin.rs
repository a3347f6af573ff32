//! Admin handlers: therapist account approval and update-request resolution

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::approval::{self, Decision};
use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::Role;
use crate::AppState;

use super::MAX_WRITE_RETRIES;

/// Therapists waiting on an admin: unapproved accounts or pending requests
pub async fn pending_therapists(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;
    let therapists = state.store.list_pending_therapists().await?;
    Ok(Json(json!({ "therapists": therapists })))
}

/// Approve a therapist account. Every pending ledger entry is resolved in
/// one pass: entries with a null new value are auto-rejected, everything
/// else is applied to the live profile and marked approved.
pub async fn approve_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;

    for _ in 0..MAX_WRITE_RETRIES {
        let mut therapist = state.store.get_therapist(id).await?;

        let mut doc = serde_json::to_value(&therapist.profile)
            .map_err(|e| AppError::Internal(format!("Profile serialization failed: {}", e)))?;
        let outcome = approval::approve_all(&mut doc, &mut therapist.update_requests)?;

        therapist.profile = serde_json::from_value(doc)
            .map_err(|e| AppError::BadRequest(format!("Invalid profile value: {}", e)))?;
        therapist.approved = true;

        if state.store.try_save_therapist(&therapist).await? {
            tracing::info!(
                therapist_id = %id,
                approved = outcome.approved,
                rejected = outcome.rejected,
                "therapist account approved"
            );
            return Ok(Json(json!({
                "message": "Therapist account approved and all valid pending updates applied",
                "therapist": therapist,
            })));
        }
        tracing::debug!(therapist_id = %id, "concurrent write during account approval, retrying");
    }

    Err(AppError::Conflict(
        "Therapist record was modified concurrently, please retry".to_string(),
    ))
}

/// Reject a therapist account. Destructive: the record, its profile and its
/// ledger are deleted.
pub async fn reject_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;
    state.store.delete_therapist(id).await?;

    tracing::info!(therapist_id = %id, "therapist account rejected and deleted");
    Ok(Json(json!({
        "message": "Therapist account rejected and deleted"
    })))
}

pub async fn approve_request(
    state: State<Arc<AppState>>,
    auth: AuthUser,
    path: Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    resolve_request(state, auth, path, Decision::Approve).await
}

pub async fn reject_request(
    state: State<Arc<AppState>>,
    auth: AuthUser,
    path: Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    resolve_request(state, auth, path, Decision::Reject).await
}

/// Resolve one pending update request. Approval writes the value into the
/// live profile and clears superseded pending requests for the same field.
async fn resolve_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((therapist_id, request_id)): Path<(Uuid, Uuid)>,
    decision: Decision,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;

    for _ in 0..MAX_WRITE_RETRIES {
        let mut therapist = state.store.get_therapist(therapist_id).await?;

        let mut doc = serde_json::to_value(&therapist.profile)
            .map_err(|e| AppError::Internal(format!("Profile serialization failed: {}", e)))?;
        let resolved = approval::resolve(
            &mut doc,
            &mut therapist.update_requests,
            request_id,
            decision,
        )?;

        therapist.profile = serde_json::from_value(doc)
            .map_err(|e| AppError::BadRequest(format!("Invalid profile value: {}", e)))?;

        if state.store.try_save_therapist(&therapist).await? {
            tracing::info!(
                therapist_id = %therapist_id,
                request_id = %request_id,
                field = %resolved.field,
                status = resolved.status.as_str(),
                "update request resolved"
            );
            return Ok(Json(json!({
                "message": "Update request processed",
                "request": resolved,
            })));
        }
        tracing::debug!(
            therapist_id = %therapist_id,
            "concurrent write during request resolution, retrying"
        );
    }

    Err(AppError::Conflict(
        "Therapist record was modified concurrently, please retry".to_string(),
    ))
}
