//! Sign-in, onboarding, and session lookup.

use std::sync::Arc;

use crate::auth::{IdentityProvider, TokenService};
use crate::domain::user::is_valid_phone;
use crate::domain::{Gender, User, UserId};
use crate::error::ApiError;
use crate::persistence::{
    CarpoolStore, NewUser, StoreTx, UNIQUE_USERS_EMAIL, UNIQUE_USERS_PHONE,
};

/// Outcome of a code exchange: the signed-in user, a bearer token, and
/// whether this exchange created the account.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    /// The signed-in user row.
    pub user: User,
    /// Access token for onboarded users, onboarding token otherwise.
    pub token: String,
    /// True when this exchange registered the account.
    pub is_new_user: bool,
}

/// Orchestrates the hosted-UI sign-in flow and onboarding.
///
/// Registration is first-sign-in: an unknown institutional email gets a
/// user row and an onboarding token in the same exchange.
#[derive(Debug, Clone)]
pub struct AuthService<S> {
    store: Arc<S>,
    provider: Arc<dyn IdentityProvider>,
    tokens: Arc<TokenService>,
    allowed_domain: String,
}

impl<S: CarpoolStore> AuthService<S> {
    /// Creates a new `AuthService`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        provider: Arc<dyn IdentityProvider>,
        tokens: Arc<TokenService>,
        allowed_domain: String,
    ) -> Self {
        Self {
            store,
            provider,
            tokens,
            allowed_domain,
        }
    }

    /// Exchanges an authorization code for a session, registering the
    /// user on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::DomainRejected`] for emails outside the
    /// allowed domain, provider errors from the code exchange, and an
    /// internal error on store or signing failure.
    pub async fn exchange(&self, code: &str) -> Result<SignInOutcome, ApiError> {
        let identity = self.provider.exchange_code(code).await?;
        let email = identity.email.to_lowercase();
        let Some((_, domain)) = email.split_once('@') else {
            return Err(ApiError::DomainRejected(self.allowed_domain.clone()));
        };
        if domain != self.allowed_domain {
            return Err(ApiError::DomainRejected(self.allowed_domain.clone()));
        }

        let existing = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(|e| ApiError::internal("Failed to authenticate with Cognito", e))?;
        if let Some(user) = existing {
            return self.session(user, false);
        }

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to authenticate with Cognito", e))?;
        let inserted = tx
            .insert_user(&NewUser {
                email: email.clone(),
                full_name: identity.full_name.clone(),
                provider_subject: identity.subject.clone(),
            })
            .await;
        match inserted {
            Ok(user) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::internal("Failed to authenticate with Cognito", e))?;
                tracing::info!(user_id = %user.id, "user registered");
                self.session(user, true)
            }
            Err(err) if err.is_duplicate_of(UNIQUE_USERS_EMAIL) => {
                // Lost a registration race; the row exists now.
                drop(tx);
                let user = self
                    .store
                    .find_user_by_email(&email)
                    .await
                    .map_err(|e| ApiError::internal("Failed to authenticate with Cognito", e))?
                    .ok_or_else(|| {
                        ApiError::internal(
                            "Failed to authenticate with Cognito",
                            "user row vanished after duplicate email",
                        )
                    })?;
                self.session(user, false)
            }
            Err(err) => Err(ApiError::internal("Failed to authenticate with Cognito", err)),
        }
    }

    /// Binds phone number and gender to the user, upgrading the session
    /// to a full access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongTokenKind`] unless called with an
    /// onboarding token, validation errors for phone and gender, and
    /// [`ApiError::PhoneTaken`] when the number belongs to another user.
    pub async fn complete_onboarding(
        &self,
        user: UserId,
        used_onboarding_token: bool,
        phone: &str,
        gender_label: &str,
    ) -> Result<(User, String), ApiError> {
        if !used_onboarding_token {
            return Err(ApiError::WrongTokenKind);
        }
        if !is_valid_phone(phone) {
            return Err(ApiError::InvalidPhone);
        }
        let gender: Gender = gender_label.parse().map_err(|_| ApiError::InvalidGender)?;

        let holder = self
            .store
            .find_user_by_phone(phone)
            .await
            .map_err(|e| ApiError::internal("Failed to complete onboarding", e))?;
        if let Some(holder) = holder
            && holder.id != user
        {
            return Err(ApiError::PhoneTaken);
        }

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to complete onboarding", e))?;
        let updated = match tx.update_onboarding(user, phone, gender).await {
            Ok(Some(updated)) => updated,
            Ok(None) => return Err(ApiError::UserNotFound),
            Err(err) if err.is_duplicate_of(UNIQUE_USERS_PHONE) => {
                return Err(ApiError::PhoneTaken);
            }
            Err(err) => return Err(ApiError::internal("Failed to complete onboarding", err)),
        };
        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to complete onboarding", e))?;

        let token = self
            .tokens
            .issue_access(updated.id, &updated.email)
            .map_err(|e| ApiError::internal("Failed to complete onboarding", e))?;
        tracing::info!(user_id = %updated.id, "onboarding completed");
        Ok((updated, token))
    }

    /// Loads the user behind a verified token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UserNotFound`] when the row no longer exists.
    pub async fn current_user(&self, id: UserId) -> Result<User, ApiError> {
        self.store
            .find_user(id)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch user data", e))?
            .ok_or(ApiError::UserNotFound)
    }

    /// Token kind follows onboarding state: completed profiles get an
    /// access token, the rest an onboarding token.
    fn session(&self, user: User, is_new_user: bool) -> Result<SignInOutcome, ApiError> {
        let token = if user.has_completed_onboarding() {
            self.tokens.issue_access(user.id, &user.email)
        } else {
            self.tokens.issue_onboarding(user.id, &user.email)
        }
        .map_err(|e| ApiError::internal("Failed to authenticate with Cognito", e))?;
        Ok(SignInOutcome {
            user,
            token,
            is_new_user,
        })
    }
}
