use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use billing_auth::Role;
use billing_core::UserId;

use super::StoreError;

/// A user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
}

/// Resolves bill owners. Users themselves are managed elsewhere.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.inner.write().map_err(|_| StoreError::poisoned())?;
        users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let users = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(users.get(&id).cloned())
    }
}
