//! Router assembly

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth, content, therapist};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/api/auth/signup/user", post(auth::signup_user))
        .route("/api/auth/login/user", post(auth::login_user))
        .route("/api/auth/signup/therapist", post(auth::signup_therapist))
        .route("/api/auth/login/therapist", post(auth::login_therapist))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/login", post(auth::login_admin))
        // Therapist profile and directory
        .route("/api/therapist/profile", put(therapist::update_profile))
        .route("/api/therapists", get(therapist::list_therapists))
        .route("/api/therapists/approved", get(therapist::list_approved))
        .route("/api/therapists/:id", get(therapist::get_therapist))
        // Admin approval flow
        .route(
            "/api/admin/therapists/pending",
            get(admin::pending_therapists),
        )
        .route(
            "/api/admin/therapists/:id/approve",
            put(admin::approve_account),
        )
        .route("/api/admin/therapists/:id", delete(admin::reject_account))
        .route(
            "/api/admin/therapists/:id/requests/:request_id/approve",
            put(admin::approve_request),
        )
        .route(
            "/api/admin/therapists/:id/requests/:request_id/reject",
            put(admin::reject_request),
        )
        // Moderated content (blogs, guides, events)
        .route(
            "/api/content/:kind",
            post(content::create).get(content::list_public),
        )
        .route("/api/content/:kind/mine", get(content::list_mine))
        .route(
            "/api/content/:kind/unapproved",
            get(content::list_unapproved),
        )
        .route("/api/content/:kind/:id", get(content::get_one))
        .route("/api/content/:kind/:id/approve", put(content::approve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
