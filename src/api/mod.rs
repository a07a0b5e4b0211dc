//! REST API layer: route handlers, DTOs, extractors, and router
//! composition.
//!
//! Business endpoints are mounted under `/api`; the health check lives
//! at the root. With the `swagger-ui` feature enabled the OpenAPI
//! explorer is served at `/docs`.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::app_state::AppState;
use crate::error::ErrorResponse;

/// OpenAPI document covering every REST endpoint.
#[cfg(feature = "swagger-ui")]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        handlers::auth::exchange_code,
        handlers::auth::complete_onboarding,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::pool::create_pool,
        handlers::pool::list_pools,
        handlers::pool::get_pool,
        handlers::pool::delete_pool,
        handlers::pool::my_pools,
        handlers::membership::join_pool,
        handlers::membership::leave_pool,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Auth", description = "Identity exchange, onboarding, and sessions"),
        (name = "Pools", description = "Pool lifecycle and discovery"),
        (name = "Membership", description = "Seat membership"),
        (name = "System", description = "Health and metadata"),
    )
)]
struct ApiDoc;

/// Unmatched routes answer with the shared JSON error envelope.
async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(ErrorResponse {
            success: false,
            error: "Route not found".to_string(),
            details: None,
        }),
    )
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes())
        .fallback(route_not_found);

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", <ApiDoc as utoipa::OpenApi>::openapi()),
    );

    router
}
