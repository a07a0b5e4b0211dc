//! Pool lifecycle handlers: create, list, get, delete, and the
//! caller's own pools.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    CreatePoolRequest, CreatePoolResponse, MessageResponse, MyPoolsQuery, MyPoolsResponse,
    PoolDetailResponse, PoolDto, PoolListQuery, PoolListResponse,
};
use crate::api::extract::{FullIdentity, ValidJson};
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ApiError, ErrorResponse};

/// `POST /pools` — Create a pool with the caller as first member.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] with per-field messages for a bad
/// body and [`ApiError::FemaleOnlyCreation`] when a non-female user
/// requests the female-only restriction.
#[utoipa::path(
    post,
    path = "/api/pools",
    tag = "Pools",
    summary = "Create a pool",
    description = "Creates a carpool pool. The creator takes the first seat, \
        so occupancy starts at one.",
    request_body = CreatePoolRequest,
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    ValidJson(req): ValidJson<CreatePoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = req.validate(Utc::now()).map_err(ApiError::Validation)?;
    let detail = state.pools.create(claims.sub, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePoolResponse {
            success: true,
            message: "Pool created successfully".to_string(),
            pool: PoolDto::from_detail(detail, None),
        }),
    ))
}

/// `GET /pools` — List pools, optionally filtered.
///
/// # Errors
///
/// Returns a 500 when the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns pools matching the filters, soonest departure first. \
        Every pool carries a `user_is_member` flag for the caller.",
    params(PoolListQuery),
    responses(
        (status = 200, description = "Matching pools", body = PoolListResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Query(query): Query<PoolListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.query.list(&query.into_filter()).await?;
    let pools = details
        .into_iter()
        .map(|detail| PoolDto::from_detail(detail, Some(claims.sub)))
        .collect();

    Ok(Json(PoolListResponse {
        success: true,
        pools,
    }))
}

/// `GET /pools/{id}` — Full pool detail.
///
/// # Errors
///
/// Returns [`ApiError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/pools/{id}",
    tag = "Pools",
    summary = "Get a pool",
    description = "Returns one pool with its creator profile, member roster, \
        and derived fare and seat fields.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Pool detail", body = PoolDetailResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Path(id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.query.detail(id).await?;
    Ok(Json(PoolDetailResponse {
        success: true,
        pool: PoolDto::from_detail(detail, Some(claims.sub)),
    }))
}

/// `DELETE /pools/{id}` — Remove a pool and its memberships.
///
/// # Errors
///
/// Returns [`ApiError::NotCreator`] for anyone but the creator and
/// [`ApiError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    delete,
    path = "/api/pools/{id}",
    tag = "Pools",
    summary = "Delete a pool",
    description = "Removes a pool. Only the creator may do this; every \
        membership goes with it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool UUID"),
    ),
    responses(
        (status = 200, description = "Pool deleted", body = MessageResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn delete_pool(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Path(id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    state.pools.delete(claims.sub, id).await?;
    Ok(Json(MessageResponse::new("Pool deleted successfully")))
}

/// `GET /pools/users/me/pools` — Pools the caller created or joined.
///
/// # Errors
///
/// Returns a 500 when the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/pools/users/me/pools",
    tag = "Pools",
    summary = "My pools",
    description = "Returns the caller's pools split into created and joined. \
        The `type` parameter narrows to one side.",
    params(MyPoolsQuery),
    responses(
        (status = 200, description = "The caller's pools", body = MyPoolsResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
    )
)]
pub async fn my_pools(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
    Query(query): Query<MyPoolsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pools = state.query.user_pools(claims.sub, query.scope()).await?;

    Ok(Json(MyPoolsResponse {
        success: true,
        created_pools: pools
            .created
            .into_iter()
            .map(|detail| PoolDto::from_detail(detail, None))
            .collect(),
        joined_pools: pools
            .joined
            .into_iter()
            .map(|detail| PoolDto::from_detail(detail, None))
            .collect(),
    }))
}

/// Pool lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", get(list_pools).post(create_pool))
        .route("/pools/{id}", get(get_pool).delete(delete_pool))
        .route("/pools/users/me/pools", get(my_pools))
}
