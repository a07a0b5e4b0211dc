//! Identity provider seam: exchanging an authorization code for a
//! verified campus identity.
//!
//! Production uses the Cognito hosted UI. Services depend on the
//! [`IdentityProvider`] trait so tests can substitute a canned identity
//! without any network traffic.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Identity attributes asserted by the provider after a successful
/// code exchange.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Provider-scoped subject identifier.
    pub subject: Option<String>,
    /// Email address attested by the provider.
    pub email: String,
    /// Display name. Falls back to the email local part when the
    /// provider sends none.
    pub full_name: String,
}

/// Exchanges an OAuth authorization code for a verified identity.
#[async_trait]
pub trait IdentityProvider: std::fmt::Debug + Send + Sync + 'static {
    /// Redeems `code` at the provider and fetches the user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UpstreamUnavailable`] when the provider is
    /// unreachable and [`ApiError::UpstreamInvalid`] when it answers
    /// with an error or an unusable payload.
    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, ApiError>;
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

/// AWS Cognito hosted-UI implementation of [`IdentityProvider`].
#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    redirect_uri: String,
}

impl CognitoIdentityProvider {
    /// Builds the provider endpoints from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let base = format!(
            "https://{}.auth.{}.amazoncognito.com",
            config.cognito_domain, config.cognito_region
        );
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            token_url: format!("{base}/oauth2/token"),
            userinfo_url: format!("{base}/oauth2/userInfo"),
            client_id: config.cognito_client_id.clone(),
            redirect_uri: config.cognito_redirect_uri.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, ApiError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable {
                detail: e.to_string(),
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::UpstreamInvalid {
                detail: format!("token endpoint returned {status}: {body}"),
            });
        }
        let grant: TokenGrant =
            response
                .json()
                .await
                .map_err(|e| ApiError::UpstreamInvalid {
                    detail: format!("token endpoint sent malformed JSON: {e}"),
                })?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(&grant.access_token)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamUnavailable {
                detail: e.to_string(),
            })?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ApiError::UpstreamInvalid {
                detail: format!("userInfo endpoint returned {status}"),
            });
        }
        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ApiError::UpstreamInvalid {
                detail: format!("userInfo endpoint sent malformed JSON: {e}"),
            })?;

        let email = info.email.ok_or_else(|| ApiError::UpstreamInvalid {
            detail: "userInfo response carried no email".to_string(),
        })?;
        let full_name = info
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| local_part(&email));
        Ok(VerifiedIdentity {
            subject: info.sub,
            email,
            full_name,
        })
    }
}

fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
