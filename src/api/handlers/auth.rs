//! Identity handlers: code exchange, onboarding, session introspection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AuthExchangeResponse, CognitoAuthRequest, MeResponse, MessageResponse, OnboardingRequest,
    OnboardingResponse, UserDto,
};
use crate::api::extract::{FullIdentity, Identity, ValidJson};
use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse};
use crate::service::SignInOutcome;

/// `POST /auth/cognito` — Exchange an authorization code for a session.
///
/// # Errors
///
/// Returns [`ApiError::MissingAuthCode`] when the code is absent or
/// blank, [`ApiError::DomainRejected`] for emails outside the allowed
/// domain, and a 500 when the identity provider cannot be used.
#[utoipa::path(
    post,
    path = "/api/auth/cognito",
    tag = "Auth",
    summary = "Sign in via Cognito",
    description = "Exchanges a hosted-UI authorization code for a session. \
        Returning users get a full token with 200; first-time users are \
        registered and get a short-lived onboarding token with 201.",
    request_body = CognitoAuthRequest,
    responses(
        (status = 200, description = "Signed in to an existing account", body = AuthExchangeResponse),
        (status = 201, description = "Account registered, onboarding pending", body = AuthExchangeResponse),
        (status = 400, description = "Missing code or rejected email domain", body = ErrorResponse),
        (status = 500, description = "Identity provider failure", body = ErrorResponse),
    )
)]
pub async fn exchange_code(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CognitoAuthRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = match req.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => return Err(ApiError::MissingAuthCode),
    };

    let SignInOutcome {
        user,
        token,
        is_new_user,
    } = state.auth.exchange(&code).await?;

    let status = if is_new_user {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let (token, temp_token) = if is_new_user {
        (None, Some(token))
    } else {
        (Some(token), None)
    };

    Ok((
        status,
        Json(AuthExchangeResponse {
            success: true,
            is_new_user,
            user: UserDto::from(user),
            token,
            temp_token,
        }),
    ))
}

/// `POST /auth/complete-onboarding` — Record phone number and gender.
///
/// Accepts the onboarding token issued at registration and answers with
/// a full session token.
///
/// # Errors
///
/// Returns [`ApiError::WrongTokenKind`] for a full session token,
/// [`ApiError::InvalidPhone`] / [`ApiError::InvalidGender`] for bad
/// fields, and [`ApiError::PhoneTaken`] when the number belongs to
/// another account.
#[utoipa::path(
    post,
    path = "/api/auth/complete-onboarding",
    tag = "Auth",
    summary = "Complete onboarding",
    description = "Stores the phone number and gender for the authenticated \
        user and upgrades the onboarding token to a full session token.",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Onboarding completed", body = OnboardingResponse),
        (status = 400, description = "Invalid phone, gender, or token kind", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Identity(claims): Identity,
    ValidJson(req): ValidJson<OnboardingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phone = req.phone_number.ok_or(ApiError::InvalidPhone)?;
    let gender = req.gender.ok_or(ApiError::InvalidGender)?;

    let (user, token) = state
        .auth
        .complete_onboarding(claims.sub, claims.is_temp, &phone, &gender)
        .await?;

    Ok(Json(OnboardingResponse {
        success: true,
        user: UserDto::from(user),
        token,
    }))
}

/// `GET /auth/me` — The authenticated user's profile.
///
/// # Errors
///
/// Returns [`ApiError::UserNotFound`] when the token subject no longer
/// exists.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    summary = "Current user",
    description = "Returns the profile of the user the session token belongs to.",
    responses(
        (status = 200, description = "Authenticated user", body = MeResponse),
        (status = 401, description = "Missing, invalid, or onboarding-only token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    FullIdentity(claims): FullIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.current_user(claims.sub).await?;
    Ok(Json(MeResponse {
        success: true,
        user: UserDto::from(user),
    }))
}

/// `POST /auth/logout` — End the session.
///
/// Sessions are stateless JWTs, so there is nothing to revoke
/// server-side; the client discards its token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    description = "Confirms logout. Tokens are stateless; the client drops its copy.",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn logout(FullIdentity(claims): FullIdentity) -> Json<MessageResponse> {
    tracing::info!(user_id = %claims.sub, "user logged out");
    Json(MessageResponse::new("Logged out successfully"))
}

/// Identity and session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/cognito", post(exchange_code))
        .route("/auth/complete-onboarding", post(complete_onboarding))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}
