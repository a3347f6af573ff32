//! Signup, login and identity handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{self, AuthUser};
use crate::error::{AppError, Result};
use crate::models::{LoginRequest, Role, SignupRequest};
use crate::AppState;

fn validate_signup(req: &SignupRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn signup_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    validate_signup(&req)?;

    if state.store.get_user_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = state
        .store
        .create_user(&req.name, &req.email, &password_hash)
        .await?;
    let token = auth::create_token(user.id, Role::User, &user.name, &state.jwt_secret)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
            "role": Role::User,
            "user": user,
        })),
    ))
}

pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .store
        .get_user_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = auth::create_token(user.id, Role::User, &user.name, &state.jwt_secret)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "role": Role::User,
        "user": user,
    })))
}

/// Register a therapist account; it stays invisible to clients until an
/// admin approves it.
pub async fn signup_therapist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    validate_signup(&req)?;

    if state
        .store
        .get_therapist_by_email(&req.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Therapist already exists".to_string()));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let therapist = state
        .store
        .create_therapist(&req.name, &req.email, &password_hash)
        .await?;
    let token = auth::create_token(
        therapist.id,
        Role::Therapist,
        &therapist.profile.name,
        &state.jwt_secret,
    )?;

    tracing::info!(therapist_id = %therapist.id, "therapist registered, awaiting approval");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Therapist registered successfully",
            "token": token,
            "role": Role::Therapist,
            "therapist": therapist,
        })),
    ))
}

pub async fn login_therapist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let therapist = state
        .store
        .get_therapist_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("Therapist not found".to_string()))?;

    if !auth::verify_password(&req.password, &therapist.password_hash)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = auth::create_token(
        therapist.id,
        Role::Therapist,
        &therapist.profile.name,
        &state.jwt_secret,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "role": Role::Therapist,
        "therapist": therapist,
    })))
}

pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let admin = state
        .store
        .get_admin_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    if !auth::verify_password(&req.password, &admin.password_hash)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = auth::create_token(admin.id, Role::Admin, &admin.name, &state.jwt_secret)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "role": Role::Admin,
        "user": admin,
    })))
}

/// Identity behind the presented token
pub async fn me(auth: AuthUser) -> Result<impl IntoResponse> {
    Ok(Json(json!({
        "id": auth.id,
        "role": auth.role,
        "name": auth.name,
    })))
}
