//! Moderated content handlers (blogs, guides, events)
//!
//! The simple approval variant: items are created unapproved, invisible in
//! public listings until an admin flips the approval toggle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{ContentKind, CreateContentRequest, PageQuery, Role};
use crate::AppState;

const MAX_PAGE_SIZE: u32 = 50;
const DEFAULT_PAGE_SIZE: u32 = 10;

fn parse_kind(kind: &str) -> Result<ContentKind> {
    kind.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid content kind: {}", kind)))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(kind): Path<String>,
    Json(req): Json<CreateContentRequest>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Therapist)?;
    let kind = parse_kind(&kind)?;

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let item = state
        .store
        .create_content(kind, auth.id, &auth.name, &req)
        .await?;

    tracing::info!(kind = kind.as_str(), id = %item.id, "content created, pending approval");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} created (pending approval)", kind.as_str()),
            "item": item,
        })),
    ))
}

/// Public listing: approved items only, newest first, paginated
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (items, total) = state.store.list_approved_content(kind, page, limit).await?;
    let pages = (total.max(0) as u64).div_ceil(u64::from(limit));

    Ok(Json(json!({
        "items": items,
        "pagination": { "page": page, "limit": limit, "total": total, "pages": pages },
    })))
}

pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Therapist)?;
    let kind = parse_kind(&kind)?;

    let items = state.store.list_content_by_author(kind, auth.id).await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn list_unapproved(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;
    let kind = parse_kind(&kind)?;

    let items = state.store.list_unapproved_content(kind).await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let item = state.store.get_content(kind, id).await?;
    Ok(Json(json!({ "item": item })))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse> {
    auth.require(Role::Admin)?;
    let kind = parse_kind(&kind)?;

    let item = state
        .store
        .approve_content(kind, id, auth.id, &auth.name)
        .await?;

    tracing::info!(kind = kind.as_str(), id = %id, "content approved");
    Ok(Json(json!({ "item": item })))
}
