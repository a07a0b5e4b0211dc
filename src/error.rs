//! Service error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type. Each variant maps to an HTTP
//! status and the JSON error envelope every endpoint shares. Business
//! rejections (4xx) carry their message to the client verbatim; server
//! faults (5xx) answer with a generic message and log the detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "success": false,
///   "error": "This pool is full",
///   "details": ["Start point is required"]
/// }
/// ```
///
/// `details` is present only for request validation failures.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
    /// Per-field validation messages, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Identity exchange was called without an authorization code.
    #[error("Authorization code is required")]
    MissingAuthCode,

    /// The verified email is outside the allowed institutional domain.
    #[error("Only @{0} email addresses are allowed")]
    DomainRejected(String),

    /// Request body validation failed; the list carries one message per
    /// violated rule.
    #[error("Validation failed")]
    Validation(Vec<String>),

    /// Onboarding was attempted with a full session token.
    #[error("Invalid token for onboarding")]
    WrongTokenKind,

    /// Phone number is not exactly ten digits.
    #[error("Phone number must be exactly 10 digits")]
    InvalidPhone,

    /// Gender value outside the accepted labels.
    #[error("Gender must be either Male or Female")]
    InvalidGender,

    /// Phone number is already bound to a different user.
    #[error("Phone number already registered")]
    PhoneTaken,

    /// Join attempt by an existing member.
    #[error("You are already a member of this pool")]
    AlreadyMember,

    /// Join attempt on a pool at capacity.
    #[error("This pool is full")]
    PoolFull,

    /// Join attempt on a female-only pool by a non-female user.
    #[error("This pool is female-only")]
    FemaleOnlyPool,

    /// Female-only pool creation by a non-female user.
    #[error("Only female users can create female-only pools")]
    FemaleOnlyCreation,

    /// Leave attempt without a membership.
    #[error("You are not a member of this pool")]
    NotMember,

    /// Leave attempt by the pool creator.
    #[error("Pool creator cannot leave. Delete the pool instead.")]
    CreatorCannotLeave,

    /// No bearer token on a protected route.
    #[error("Unauthorized - No token provided")]
    MissingToken,

    /// Bearer token failed verification (bad signature, expired, or
    /// malformed). Deliberately carries no reason detail.
    #[error("Unauthorized - Invalid token")]
    InvalidToken,

    /// A provisional onboarding token was used on a route that requires
    /// a full session.
    #[error("Please complete onboarding first")]
    OnboardingIncomplete,

    /// Pool deletion by someone other than the creator.
    #[error("Only the pool creator can delete this pool")]
    NotCreator,

    /// Pool does not exist.
    #[error("Pool not found")]
    PoolNotFound,

    /// User row does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The identity provider could not be reached.
    #[error("Failed to authenticate with Cognito")]
    UpstreamUnavailable {
        /// Transport-level failure description, logged server-side only.
        detail: String,
    },

    /// The identity provider answered with an unusable payload.
    #[error("Failed to authenticate with Cognito")]
    UpstreamInvalid {
        /// Payload or status description, logged server-side only.
        detail: String,
    },

    /// Database or other infrastructure failure.
    #[error("{public}")]
    Internal {
        /// User-facing message for the response body.
        public: &'static str,
        /// Failure description, logged server-side only.
        detail: String,
    },
}

impl ApiError {
    /// Wraps an infrastructure failure with the message shown to the
    /// client; the source error is kept for the server log only.
    #[must_use]
    pub fn internal(public: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Internal {
            public,
            detail: source.to_string(),
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuthCode
            | Self::DomainRejected(_)
            | Self::Validation(_)
            | Self::WrongTokenKind
            | Self::InvalidPhone
            | Self::InvalidGender
            | Self::PhoneTaken
            | Self::AlreadyMember
            | Self::PoolFull
            | Self::FemaleOnlyPool
            | Self::FemaleOnlyCreation
            | Self::NotMember
            | Self::CreatorCannotLeave => StatusCode::BAD_REQUEST,
            Self::MissingToken | Self::InvalidToken | Self::OnboardingIncomplete => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotCreator => StatusCode::FORBIDDEN,
            Self::PoolNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable { .. } | Self::UpstreamInvalid { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx details never reach the client; they only go to the log.
        match &self {
            Self::UpstreamUnavailable { detail } | Self::UpstreamInvalid { detail } => {
                tracing::error!(%detail, "identity provider call failed");
            }
            Self::Internal { public, detail } => {
                tracing::error!(%detail, "{public}");
            }
            rejected => {
                tracing::warn!(status = %status, "request rejected: {rejected}");
            }
        }

        let details = match &self {
            Self::Validation(messages) => Some(messages.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            details,
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
