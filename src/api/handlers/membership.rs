//! Membership handlers: join and leave.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{JoinPoolResponse, JoinedPoolDto, MessageResponse};
use crate::api::extract::FullIdentity;
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ApiError, ErrorResponse};

/// `POST /pools/{id}/join` — Take a seat in a pool.
///
/// # Errors
///
/// Returns [`ApiError::AlreadyMember`], [`ApiError::PoolFull`], or
/// [`ApiError::FemaleOnlyPool`] when the seat cannot be taken, and
/// [`ApiError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    post,
    path = "/api/pools/{id}/join",
    tag = "Membership",
    summary = "Join a pool",
    description = "Adds the caller to the pool and answers with the occupancy \
        snapshot after the join, including the recut fare per head.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Seat taken", body = JoinPoolResponse),
        (status = 400, description = "Already a member, pool full, or female-only", body = ErrorResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn join_pool(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Path(id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.membership.join(claims.sub, id).await?;

    Ok(Json(JoinPoolResponse {
        success: true,
        message: "Successfully joined pool".to_string(),
        pool: JoinedPoolDto::from(&pool),
    }))
}

/// `POST /pools/{id}/leave` — Give up a seat.
///
/// # Errors
///
/// Returns [`ApiError::NotMember`] without a membership and
/// [`ApiError::CreatorCannotLeave`] for the pool creator.
#[utoipa::path(
    post,
    path = "/api/pools/{id}/leave",
    tag = "Membership",
    summary = "Leave a pool",
    description = "Removes the caller's membership and frees the seat. The \
        creator must delete the pool instead.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Seat freed", body = MessageResponse),
        (status = 400, description = "Not a member or caller is the creator", body = ErrorResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
    )
)]
pub async fn leave_pool(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Path(id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    state.membership.leave(claims.sub, id).await?;
    Ok(Json(MessageResponse::new("Successfully left pool")))
}

/// Membership routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/join", post(join_pool))
        .route("/pools/{id}/leave", post(leave_pool))
}
