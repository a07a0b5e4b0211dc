//! Request extractors: bearer-token identities and validated JSON.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};

use crate::auth::{Claims, TokenService};
use crate::error::ApiError;

/// Claims of any authenticated caller, onboarding tokens included.
#[derive(Debug, Clone)]
pub struct Identity(pub Claims);

/// Claims of a fully onboarded caller. Onboarding tokens are rejected
/// with [`ApiError::OnboardingIncomplete`].
#[derive(Debug, Clone)]
pub struct FullIdentity(pub Claims);

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?
        .to_str()
        .map_err(|_| ApiError::MissingToken)?;
    header.strip_prefix("Bearer ").ok_or(ApiError::MissingToken)
}

fn verify(headers: &HeaderMap, tokens: &TokenService) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)?;
    tokens.verify(token)
}

impl<S> FromRequestParts<S> for Identity
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = verify(&parts.headers, &tokens)?;
        Ok(Self(claims))
    }
}

impl<S> FromRequestParts<S> for FullIdentity
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = verify(&parts.headers, &tokens)?;
        if claims.is_temp {
            return Err(ApiError::OnboardingIncomplete);
        }
        Ok(Self(claims))
    }
}

/// JSON body extractor that answers malformed bodies with the 400
/// validation envelope instead of axum's default 422.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(vec![rejection.body_text()]))?;
        Ok(Self(value))
    }
}
