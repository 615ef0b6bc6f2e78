use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::models::{Session, User};
use crate::db::store::CredentialStore;
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    /// ulid -> user
    users: HashMap<String, User>,
    /// user_name -> ulid, standing in for the unique name index
    user_names: HashMap<String, String>,
    /// user_ulid -> current session
    sessions: HashMap<String, Session>,
}

/// In-memory credential store.
///
/// Same uniqueness and token-swap semantics as [`PgStore`](super::PgStore),
/// with the write lock playing the role of per-record atomicity. Backs the
/// test suite, which runs the whole HTTP surface without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .user_names
            .get(user_name)
            .and_then(|ulid| inner.users.get(ulid))
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.user_names.contains_key(&user.user_name) {
            return Err(StoreError::Duplicate);
        }
        inner
            .user_names
            .insert(user.user_name.clone(), user.ulid.clone());
        inner.users.insert(user.ulid.clone(), user.clone());
        Ok(user.clone())
    }

    async fn get_session(&self, user_ulid: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.read().await.sessions.get(user_ulid).cloned())
    }

    async fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sessions
            .insert(session.user_ulid.clone(), session.clone());
        Ok(())
    }

    async fn swap_session_token(
        &self,
        user_ulid: &str,
        current_token: &str,
        next: &Session,
    ) -> Result<bool, StoreError> {
        // Guard and overwrite under one write lock: concurrent rotations of
        // the same token cannot both observe a match.
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(user_ulid) {
            Some(stored) if stored.access_token == current_token => {
                *stored = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
