//! Common types used across Gatehouse

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Audit Stamps
// =============================================================================

/// Creation/update timestamps embedded in every persisted record.
///
/// Composition instead of a shared base entity: each record carries its
/// stamps as a value, and the directory bumps `updated_at` on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct AuditStamps {
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl AuditStamps {
    /// Fresh stamps for a record created now.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the record as modified.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

// =============================================================================
// User
// =============================================================================

/// Identity record.
///
/// `password_hash` always holds an Argon2 hash, never a plaintext password.
/// This type deliberately does not implement `Serialize`; anything that
/// crosses the HTTP boundary goes through [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(flatten)]
    pub stamps: AuditStamps,
}

impl User {
    /// Build a new user from already-hashed credentials.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            password_hash,
            stamps: AuditStamps::now(),
        }
    }
}

/// User data safe to return to clients. Excludes the password hash by
/// construction rather than by serializer annotation.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.stamps.created_at,
        }
    }
}
