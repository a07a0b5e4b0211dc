//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod membership;
pub mod pool;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(pool::routes())
        .merge(membership::routes())
}
