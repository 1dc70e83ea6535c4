//! Session identity codec
//!
//! What gets stored against a session token is the bare user id, nothing
//! else. The full record is re-fetched from the directory on every request,
//! so a password change or a deleted account takes effect on the very next
//! request instead of living on in a stale session payload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use gatehouse_shared::{DirectoryError, User, UserDirectory, UserId};

/// Minimal durable payload stored against a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub user_id: UserId,
}

/// Serializes an authenticated user down to its id and rehydrates the live
/// record through the directory. Passed in explicitly wherever it is needed;
/// there is no process-global registration.
#[derive(Clone)]
pub struct IdentityCodec {
    directory: Arc<dyn UserDirectory>,
}

impl IdentityCodec {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub fn serialize(&self, user: &User) -> SerializedIdentity {
        SerializedIdentity { user_id: user.id }
    }

    /// Re-fetch the current user record. A missing backing user means "no
    /// session", not an error.
    pub async fn deserialize(
        &self,
        identity: &SerializedIdentity,
    ) -> Result<Option<User>, DirectoryError> {
        self.directory.find_by_id(identity.user_id).await
    }
}
