//! Mindhaven server - therapy platform backend

pub mod approval;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;

use sqlx::SqlitePool;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    pub store: store::Store,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt_secret: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            store: store::Store::new(pool),
            jwt_secret: jwt_secret.into(),
        })
    }
}
