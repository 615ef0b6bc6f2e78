use async_trait::async_trait;

use crate::db::models::{Session, User};
use crate::error::StoreError;

/// Persistence boundary for users and sessions.
///
/// Implementations own all durable state; the registry and session manager
/// are stateless between calls. Each method is a single record read or
/// write and is atomic on its own — the one cross-record guarantee is
/// `swap_session_token`, which must only overwrite a session whose stored
/// token still equals `current_token`. Failures are returned as-is; no
/// implementation retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by the unique user name. Absence is not an error.
    async fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new user. A taken user name yields `StoreError::Duplicate`
    /// from the store's uniqueness constraint.
    async fn insert_user(&self, user: &User) -> Result<User, StoreError>;

    /// Fetch the current session record for a user, if any.
    async fn get_session(&self, user_ulid: &str) -> Result<Option<Session>, StoreError>;

    /// Insert or replace the session record for `session.user_ulid`.
    async fn put_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Replace the session record only if its stored token still equals
    /// `current_token`. Returns whether the guard matched; `false` means a
    /// concurrent rotation won and nothing was written.
    async fn swap_session_token(
        &self,
        user_ulid: &str,
        current_token: &str,
        next: &Session,
    ) -> Result<bool, StoreError>;
}
