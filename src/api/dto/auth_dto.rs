//! Auth and onboarding DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Gender, User, UserId};

/// Request body for `POST /auth/cognito`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CognitoAuthRequest {
    /// Authorization code from the hosted-UI redirect.
    #[serde(default)]
    pub code: Option<String>,
}

/// Request body for `POST /auth/complete-onboarding`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OnboardingRequest {
    /// Ten-digit phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// `Male` or `Female`.
    #[serde(default)]
    pub gender: Option<String>,
}

/// User payload embedded in auth responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    /// User identifier.
    pub id: UserId,
    /// Institutional email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Ten-digit phone number, absent before onboarding.
    pub phone_number: Option<String>,
    /// Gender, absent before onboarding.
    pub gender: Option<Gender>,
    /// Whether phone number and gender are both on file.
    #[serde(rename = "hasCompletedOnboarding")]
    pub has_completed_onboarding: bool,
    /// Registration timestamp.
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        let has_completed_onboarding = user.has_completed_onboarding();
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            gender: user.gender,
            has_completed_onboarding,
            date_joined: user.date_joined,
        }
    }
}

/// Response body for `POST /auth/cognito`.
///
/// Returning users get `token` with a 200; first-time users get
/// `tempToken` and `isNewUser: true` with a 201.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthExchangeResponse {
    /// Always `true`.
    pub success: bool,
    /// Whether this exchange registered the account.
    #[serde(rename = "isNewUser")]
    pub is_new_user: bool,
    /// The signed-in user.
    pub user: UserDto,
    /// Session token for returning users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Onboarding token for first-time users.
    #[serde(rename = "tempToken", skip_serializing_if = "Option::is_none")]
    pub temp_token: Option<String>,
}

/// Response body for `POST /auth/complete-onboarding`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingResponse {
    /// Always `true`.
    pub success: bool,
    /// The updated user.
    pub user: UserDto,
    /// Fresh full session token.
    pub token: String,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Always `true`.
    pub success: bool,
    /// The authenticated user.
    pub user: UserDto,
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(),
            email: "asharma_be23@thapar.edu".to_string(),
            full_name: "Aditi Sharma".to_string(),
            phone_number: Some("9876543210".to_string()),
            gender: Some(Gender::Female),
            provider_subject: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn user_payload_uses_the_camel_case_onboarding_key() {
        let Ok(json) = serde_json::to_value(UserDto::from(user())) else {
            panic!("serialization failed");
        };
        assert_eq!(json["hasCompletedOnboarding"], serde_json::json!(true));
        assert!(json.get("has_completed_onboarding").is_none());
        assert_eq!(json["gender"], serde_json::json!("Female"));
    }

    #[test]
    fn exchange_response_carries_exactly_one_token_key() {
        let returning = AuthExchangeResponse {
            success: true,
            is_new_user: false,
            user: UserDto::from(user()),
            token: Some("full".to_string()),
            temp_token: None,
        };
        let Ok(json) = serde_json::to_value(returning) else {
            panic!("serialization failed");
        };
        assert_eq!(json["token"], serde_json::json!("full"));
        assert!(json.get("tempToken").is_none());
        assert_eq!(json["isNewUser"], serde_json::json!(false));

        let fresh = AuthExchangeResponse {
            success: true,
            is_new_user: true,
            user: UserDto::from(user()),
            token: None,
            temp_token: Some("temp".to_string()),
        };
        let Ok(json) = serde_json::to_value(fresh) else {
            panic!("serialization failed");
        };
        assert_eq!(json["tempToken"], serde_json::json!("temp"));
        assert!(json.get("token").is_none());
    }
}
