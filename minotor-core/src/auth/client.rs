//! HTTP client for the identity service
//!
//! Speaks the login protocol of the identity API:
//! - `POST /api/login` with `{"email", "password"}` returns a token
//! - `GET /api/users` (bearer token) lists users when the login response
//!   carries no user record

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use super::types::{AuthFailure, AuthOutcome, AuthSession, Credentials, Role};
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Client for the identity service.
///
/// One client can serve any number of logins; it keeps no session itself.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http_client: reqwest::Client,
    base_url: String,
    allowed_roles: Vec<String>,
}

impl AuthClient {
    /// Create a client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AuthConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Auth(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            allowed_roles: config.allowed_roles,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attempt a login.
    ///
    /// Never errors: every failure is reported as [`AuthOutcome::Failure`].
    pub async fn login(&self, credentials: &Credentials) -> AuthOutcome {
        let outcome: AuthOutcome = self.try_login(credentials).await.into();
        match &outcome {
            AuthOutcome::Success(session) => {
                tracing::info!(email = %credentials.email, role = %session.role, "Login succeeded")
            }
            AuthOutcome::Failure(failure) => {
                tracing::warn!(email = %credentials.email, kind = ?failure.kind(), "Login failed: {}", failure)
            }
        }
        outcome
    }

    async fn try_login(&self, credentials: &Credentials) -> std::result::Result<AuthSession, AuthFailure> {
        let url = format!("{}/api/login", self.base_url);
        tracing::debug!(url = %url, email = %credentials.email, "Sending login request");

        let response = self
            .http_client
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Login response received");

        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => return Err(AuthFailure::InvalidCredentials),
            StatusCode::NOT_FOUND => return Err(AuthFailure::EndpointNotFound(self.base_url.clone())),
            other => return Err(AuthFailure::ServerError(other.as_u16())),
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_failure(e))?;
        let body: Value = serde_json::from_str(&body)
            .map_err(|e| AuthFailure::MalformedResponse(e.to_string()))?;

        let token = body
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthFailure::MalformedResponse("missing token".to_string()))?
            .to_string();

        let profile = match body.get("user") {
            Some(user) => Some(user.clone()),
            None => self.fetch_profile(&token).await,
        };

        let role = extract_role(&body, profile.as_ref());
        if !self.allowed_roles.iter().any(|allowed| allowed == role.as_str()) {
            return Err(AuthFailure::InsufficientRole(role));
        }

        Ok(AuthSession {
            token,
            role,
            profile,
        })
    }

    /// Look up the user record after a login that did not include one.
    ///
    /// Takes the first user listed. Failures only mean there is no profile.
    async fn fetch_profile(&self, token: &str) -> Option<Value> {
        let url = format!("{}/api/users", self.base_url);

        let response = match self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch user profile: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), "User profile request rejected");
            return None;
        }

        match response.json::<Value>().await {
            Ok(Value::Array(users)) => users.into_iter().next(),
            Ok(_) => {
                tracing::warn!("User list response is not an array");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to parse user list: {}", e);
                None
            }
        }
    }

    fn transport_failure(&self, error: reqwest::Error) -> AuthFailure {
        if error.is_connect() {
            AuthFailure::Unreachable(self.base_url.clone())
        } else {
            AuthFailure::Network(error.to_string())
        }
    }
}

/// Request body for POST /api/login
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Role lookup order: `roles` array, then `role`, then the profile's `role`.
///
/// A present `roles` array decides on its own, even when empty.
fn extract_role(body: &Value, profile: Option<&Value>) -> Role {
    if let Some(roles) = body.get("roles").and_then(Value::as_array) {
        return roles
            .first()
            .and_then(Value::as_str)
            .map(Role::new)
            .unwrap_or_else(Role::sales);
    }

    body.get("role")
        .and_then(Value::as_str)
        .or_else(|| profile?.get("role")?.as_str())
        .map(Role::new)
        .unwrap_or_else(Role::sales)
}
