//! Pluggable credential verification
//!
//! The strategy resolves an (identifier, password) pair to a tagged outcome.
//! Unknown-identifier and wrong-password stay distinguishable here so they
//! can be logged and counted separately; the HTTP boundary collapses both
//! into one generic invalid-credentials response.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_shared::{DirectoryError, User, UserDirectory};

use super::password::{verify_password_blocking, PasswordError};

/// Result of a verification attempt.
#[derive(Debug)]
pub enum VerificationOutcome {
    Verified(User),
    UnknownIdentifier,
    WrongPassword,
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
    #[error("credential check failed: {0}")]
    Hasher(#[from] PasswordError),
}

#[async_trait]
pub trait VerificationStrategy: Send + Sync {
    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<VerificationOutcome, StrategyError>;
}

/// Username-or-email lookup through the directory, then an Argon2 check.
#[derive(Clone)]
pub struct PasswordStrategy {
    directory: Arc<dyn UserDirectory>,
}

impl PasswordStrategy {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl VerificationStrategy for PasswordStrategy {
    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<VerificationOutcome, StrategyError> {
        let user = match self.directory.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.directory.find_by_email(identifier).await?,
        };

        let Some(user) = user else {
            tracing::warn!(identifier = %identifier, reason = "unknown_identifier", "authenticate: no such user");
            return Ok(VerificationOutcome::UnknownIdentifier);
        };

        let valid =
            verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;

        if !valid {
            tracing::warn!(user_id = %user.id, reason = "wrong_password", "authenticate: password mismatch");
            return Ok(VerificationOutcome::WrongPassword);
        }

        tracing::info!(user_id = %user.id, "authenticate: credentials verified");
        Ok(VerificationOutcome::Verified(user))
    }
}
