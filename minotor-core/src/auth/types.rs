//! Identity types returned by the auth gate

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Email and password as typed by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Why credentials were rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("Please enter your email address")]
    MissingEmail,
    #[error("Please enter your password")]
    MissingPassword,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Local checks: both fields filled, email looks like an address.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(CredentialsError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(CredentialsError::MissingPassword);
        }
        if !email.contains('@') || !email.contains('.') {
            return Err(CredentialsError::InvalidEmail);
        }
        Ok(())
    }
}

// Keeps passwords out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Role string as issued by the identity service (e.g. `ROLE_ADMIN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const SALES: &'static str = "ROLE_SALES";
    pub const ADMIN: &'static str = "ROLE_ADMIN";

    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// Role assumed when the service does not report one.
    pub fn sales() -> Self {
        Self::new(Self::SALES)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name: `ROLE_SALES` -> "Sales", `ROLE_KEY_ACCOUNT` -> "Key Account".
    pub fn display_name(&self) -> String {
        match self.0.as_str() {
            Self::ADMIN => "Administrator".to_string(),
            other => other
                .strip_prefix("ROLE_")
                .unwrap_or(other)
                .split('_')
                .filter(|word| !word.is_empty())
                .map(|word| {
                    let lower = word.to_lowercase();
                    let mut chars = lower.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" "),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated identity, owned by whoever performed the login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub role: Role,
    /// User record as returned by the service, if one was available
    pub profile: Option<Value>,
}

impl AuthSession {
    fn profile_str(&self, key: &str) -> Option<&str> {
        self.profile.as_ref()?.get(key)?.as_str()
    }

    pub fn email(&self) -> Option<&str> {
        self.profile_str("email")
    }

    /// "First Last" from the profile, when both parts are present.
    pub fn full_name(&self) -> Option<String> {
        let first = self.profile_str("firstName")?;
        let last = self.profile_str("lastName")?;
        Some(format!("{} {}", first, last))
    }
}

/// Coarse class of a failed login, for deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Wrong email or password
    Credentials,
    /// Valid account without access to reports
    Role,
    /// The service could not give an answer
    Remote,
}

/// A login that did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Insufficient rights: access is reserved for sales staff (role {0})")]
    InsufficientRole(Role),

    #[error("Login endpoint not found: check the identity API at {0}")]
    EndpointNotFound(String),

    #[error("Login failed (HTTP {0})")]
    ServerError(u16),

    #[error("Identity service unavailable at {0}")]
    Unreachable(String),

    #[error("Could not contact the identity service, check your connection ({0})")]
    Network(String),

    #[error("Unexpected login response: {0}")]
    MalformedResponse(String),
}

impl AuthFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            AuthFailure::InvalidCredentials => FailureKind::Credentials,
            AuthFailure::InsufficientRole(_) => FailureKind::Role,
            _ => FailureKind::Remote,
        }
    }

    /// Only a credentials mismatch warrants wiping the password field.
    pub fn clears_password(&self) -> bool {
        self.kind() == FailureKind::Credentials
    }
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success(AuthSession),
    Failure(AuthFailure),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    /// Message suitable for showing to the user.
    pub fn message(&self) -> String {
        match self {
            AuthOutcome::Success(_) => "Login successful".to_string(),
            AuthOutcome::Failure(failure) => failure.to_string(),
        }
    }

    pub fn into_result(self) -> Result<AuthSession, AuthFailure> {
        match self {
            AuthOutcome::Success(session) => Ok(session),
            AuthOutcome::Failure(failure) => Err(failure),
        }
    }
}

impl From<Result<AuthSession, AuthFailure>> for AuthOutcome {
    fn from(result: Result<AuthSession, AuthFailure>) -> Self {
        match result {
            Ok(session) => AuthOutcome::Success(session),
            Err(failure) => AuthOutcome::Failure(failure),
        }
    }
}
