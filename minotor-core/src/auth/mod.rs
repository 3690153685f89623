//! Auth gate
//!
//! Validates credentials against the remote identity service and gates report
//! access on the returned role. The result is an explicit [`AuthSession`]
//! owned by the caller; nothing here keeps a current user.
//!
//! ```rust,no_run
//! # async fn demo() -> minotor_core::Result<()> {
//! use minotor_core::auth::{AuthClient, AuthOutcome, Credentials};
//! use minotor_core::Config;
//!
//! let config = Config::load()?;
//! let client = AuthClient::new(config.auth)?;
//! match client.login(&Credentials::new("ana@minotor.fr", "secret")).await {
//!     AuthOutcome::Success(session) => println!("Welcome, {}", session.role.display_name()),
//!     AuthOutcome::Failure(failure) => eprintln!("{}", failure),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod types;

pub use client::AuthClient;
pub use types::{
    AuthFailure, AuthOutcome, AuthSession, Credentials, CredentialsError, FailureKind, Role,
};
