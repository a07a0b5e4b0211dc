//! User entity and onboarding state.
//!
//! A user is created with only an email and a display name after the
//! identity provider exchange. Onboarding later binds a phone number and
//! gender; a user is considered fully registered once both are set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Self-declared gender, restricted to the two values the pool
/// restriction rules operate on. Stored as the Postgres enum `gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gender", rename_all = "PascalCase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female. Required to create or join female-only pools.
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Returns `true` when `phone` is exactly ten ASCII digits.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

/// A registered user row from the `users` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Institutional email address (unique, lowercase).
    pub email: String,
    /// Display name from the identity provider.
    pub full_name: String,
    /// Ten-digit phone number, set during onboarding (unique when set).
    pub phone_number: Option<String>,
    /// Gender, set during onboarding.
    pub gender: Option<Gender>,
    /// Subject identifier from the external identity provider.
    pub provider_subject: Option<String>,
    /// Account creation timestamp.
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether the user has completed onboarding (phone and gender set).
    #[must_use]
    pub fn has_completed_onboarding(&self) -> bool {
        self.phone_number.is_some() && self.gender.is_some()
    }
}

/// Creator fields embedded in every pool payload.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct CreatorProfile {
    /// Creator's user identifier.
    pub id: UserId,
    /// Creator's display name.
    pub full_name: String,
    /// Creator's email address.
    pub email: String,
    /// Creator's phone number, if onboarded.
    pub phone_number: Option<String>,
    /// Creator's gender, if onboarded.
    pub gender: Option<Gender>,
}
