//! User directory contract and implementations
//!
//! The directory is the only way the auth core reaches user records: a
//! lookup-by-id/username/email plus an insert-or-update. Email uniqueness is
//! enforced inside the directory (unique constraint in Postgres, write-lock
//! check in memory), never by a caller-side read-then-write.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::types::{User, UserId};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("directory backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // PostgreSQL unique violation
            if db_err.code().as_deref() == Some("23505") {
                return DirectoryError::DuplicateEmail;
            }
        }
        DirectoryError::Backend(err.to_string())
    }
}

/// Lookup and persistence boundary for user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Insert the user, or update the record with the same id.
    async fn save(&self, user: &User) -> Result<User, DirectoryError>;
}

// =============================================================================
// Postgres
// =============================================================================

/// Postgres-backed directory. Email and username uniqueness is carried by
/// the table's unique constraints.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, DirectoryError> {
        let saved: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                updated_at = EXCLUDED.updated_at
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.email.to_lowercase())
        .bind(&user.password_hash)
        .bind(user.stamps.created_at)
        .bind(user.stamps.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// In-memory directory for tests and single-process deployments.
///
/// The uniqueness check and the insert happen under the same write lock, so
/// two concurrent sign-ups with one email cannot both succeed.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: &User) -> Result<User, DirectoryError> {
        let mut users = self.users.write().await;

        let email = user.email.to_lowercase();
        let taken = users
            .values()
            .any(|u| u.email == email && u.id != user.id);
        if taken {
            return Err(DirectoryError::DuplicateEmail);
        }

        let mut stored = user.clone();
        stored.email = email;
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn user(name: &str, email: &str) -> User {
        User::new(name.to_string(), email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn save_then_lookup_by_each_key() {
        let dir = MemoryDirectory::new();
        let saved = dir.save(&user("alice", "alice@x.com")).await.unwrap();

        assert!(dir.find_by_id(saved.id).await.unwrap().is_some());
        assert!(dir.find_by_username("alice").await.unwrap().is_some());
        assert!(dir.find_by_email("alice@x.com").await.unwrap().is_some());
        assert!(dir.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_rejected_and_nothing_written() {
        let dir = MemoryDirectory::new();
        dir.save(&user("alice", "alice@x.com")).await.unwrap();

        let err = dir.save(&user("mallory", "alice@x.com")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateEmail));
        assert!(dir.find_by_username("mallory").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let dir = MemoryDirectory::new();
        dir.save(&user("alice", "Alice@X.com")).await.unwrap();

        assert!(dir.find_by_email("alice@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_with_same_id_updates_in_place() {
        let dir = MemoryDirectory::new();
        let mut saved = dir.save(&user("alice", "alice@x.com")).await.unwrap();

        saved.password_hash = "new-hash".to_string();
        saved.stamps.touch();
        dir.save(&saved).await.unwrap();

        let reloaded = dir.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");
    }
}
