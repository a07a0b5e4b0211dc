//! Data Transfer Objects for REST request/response serialization.
//!
//! Response bodies carry a `success: true` flag alongside their
//! payload; failures are serialized by [`crate::error::ApiError`]
//! with `success: false`.

use serde::Serialize;
use utoipa::ToSchema;

pub mod auth_dto;
pub mod pool_dto;

pub use auth_dto::*;
pub use pool_dto::*;

/// Bare confirmation body for operations with no payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
}

impl MessageResponse {
    /// Confirmation with the given message.
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}
