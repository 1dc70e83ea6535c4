//! Session store boundary
//!
//! The store owns the token -> serialized-identity mapping; the rest of the
//! core only ever holds the opaque token. Once `destroy` returns Ok the
//! token must never rehydrate again.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use redis::AsyncCommands;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::identity::SerializedIdentity;

/// Opaque session token handed to the client as a cookie value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// 32 bytes from the OS CSPRNG, hex-encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store backend error: {0}")]
    Backend(String),
    #[error("session payload encoding error: {0}")]
    Encoding(String),
}

impl From<redis::RedisError> for SessionStoreError {
    fn from(err: redis::RedisError) -> Self {
        SessionStoreError::Backend(err.to_string())
    }
}

/// Keyed storage of session-token -> serialized-identity.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a fresh token and store the identity against it.
    async fn create(
        &self,
        identity: &SerializedIdentity,
        ttl: Duration,
    ) -> Result<SessionToken, SessionStoreError>;

    /// Look up the identity for a token. Unknown, destroyed, and expired
    /// tokens are all `None`.
    async fn get(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SerializedIdentity>, SessionStoreError>;

    /// Remove the session. Returns only after the store has confirmed the
    /// token is unusable.
    async fn destroy(&self, token: &SessionToken) -> Result<(), SessionStoreError>;
}

// =============================================================================
// Redis
// =============================================================================

const REDIS_KEY_PREFIX: &str = "session:";

/// Redis-backed store; expiry is delegated to the key TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(token: &SessionToken) -> String {
        format!("{REDIS_KEY_PREFIX}{token}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(
        &self,
        identity: &SerializedIdentity,
        ttl: Duration,
    ) -> Result<SessionToken, SessionStoreError> {
        let token = SessionToken::generate();
        let payload = serde_json::to_string(identity)
            .map_err(|e| SessionStoreError::Encoding(e.to_string()))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::key(&token), payload, ttl.as_secs())
            .await?;

        Ok(token)
    }

    async fn get(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SerializedIdentity>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(Self::key(token)).await?;

        match payload {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| SessionStoreError::Encoding(e.to_string())),
            None => Ok(None),
        }
    }

    async fn destroy(&self, token: &SessionToken) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(Self::key(token)).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// In-memory store for tests and single-process deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, (SerializedIdentity, OffsetDateTime)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        identity: &SerializedIdentity,
        ttl: Duration,
    ) -> Result<SessionToken, SessionStoreError> {
        let token = SessionToken::generate();
        let expires_at = OffsetDateTime::now_utc() + ttl;

        let mut sessions = self.sessions.write().await;
        // Opportunistic purge; reads below never return expired entries either way.
        sessions.retain(|_, (_, exp)| *exp > OffsetDateTime::now_utc());
        sessions.insert(token.clone(), (*identity, expires_at));

        Ok(token)
    }

    async fn get(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SerializedIdentity>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(token).and_then(|(identity, expires_at)| {
            if *expires_at > OffsetDateTime::now_utc() {
                Some(*identity)
            } else {
                None
            }
        }))
    }

    async fn destroy(&self, token: &SessionToken) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}
