//! Signed bearer tokens for API access and onboarding.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::domain::UserId;
use crate::error::ApiError;

/// Claims carried by every token this service issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: UserId,
    /// The user's institutional email.
    pub email: String,
    /// Marks an onboarding-only token. Absent means a full token.
    #[serde(default)]
    pub is_temp: bool,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies HS256 tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    full_ttl_secs: u64,
    temp_ttl_secs: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("full_ttl_secs", &self.full_ttl_secs)
            .field("temp_ttl_secs", &self.temp_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service over a shared HMAC secret.
    #[must_use]
    pub fn new(secret: &str, full_ttl_secs: u64, temp_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            full_ttl_secs,
            temp_ttl_secs,
        }
    }

    /// Builds the service from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_access_secret,
            config.jwt_expires_in_secs,
            config.temp_token_expires_in_secs,
        )
    }

    /// Issues a full access token for an onboarded user.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue_access(
        &self,
        user: UserId,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user, email, false, self.full_ttl_secs)
    }

    /// Issues a short-lived token that only unlocks onboarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue_onboarding(
        &self,
        user: UserId,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user, email, true, self.temp_ttl_secs)
    }

    fn issue(
        &self,
        user: UserId,
        email: &str,
        is_temp: bool,
        ttl_secs: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user,
            email: email.to_string(),
            is_temp,
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verifies signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidToken`] for any malformed, tampered,
    /// or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 3600, 900)
    }

    #[test]
    fn access_token_round_trips() {
        let tokens = service();
        let user = UserId::new();
        let Ok(token) = tokens.issue_access(user, "rider@thapar.edu") else {
            panic!("issue failed");
        };
        let Ok(claims) = tokens.verify(&token) else {
            panic!("verify failed");
        };
        assert_eq!(claims.sub, user);
        assert_eq!(claims.email, "rider@thapar.edu");
        assert!(!claims.is_temp);
    }

    #[test]
    fn onboarding_token_is_flagged_temporary() {
        let tokens = service();
        let Ok(token) = tokens.issue_onboarding(UserId::new(), "new@thapar.edu") else {
            panic!("issue failed");
        };
        let Ok(claims) = tokens.verify(&token) else {
            panic!("verify failed");
        };
        assert!(claims.is_temp);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let stale = Claims {
            sub: UserId::new(),
            email: "late@thapar.edu".to_string(),
            is_temp: false,
            iat: now - 7200,
            exp: now - 3600,
        };
        let Ok(token) = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(b"test-secret"),
        ) else {
            panic!("encode failed");
        };
        assert!(matches!(tokens.verify(&token), Err(ApiError::InvalidToken)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = service();
        let Ok(token) = tokens.issue_access(UserId::new(), "rider@thapar.edu") else {
            panic!("issue failed");
        };
        let tampered = format!("{token}x");
        assert!(matches!(
            tokens.verify(&tampered),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = TokenService::new("other-secret", 3600, 900);
        let Ok(token) = other.issue_access(UserId::new(), "rider@thapar.edu") else {
            panic!("issue failed");
        };
        assert!(matches!(
            service().verify(&token),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn missing_temp_flag_defaults_to_full_token() {
        let json = serde_json::json!({
            "sub": UserId::new(),
            "email": "old@thapar.edu",
            "iat": 0,
            "exp": 0,
        });
        let Ok(claims) = serde_json::from_value::<Claims>(json) else {
            panic!("deserialize failed");
        };
        assert!(!claims.is_temp);
    }
}
