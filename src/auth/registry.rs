use std::sync::Arc;

use ulid::Ulid;

use crate::auth::password;
use crate::config::AuthConfig;
use crate::db::models::User;
use crate::db::store::CredentialStore;
use crate::error::AppError;

/// Account creation and lookup.
///
/// Stateless between calls; the store owns every record. Validation
/// thresholds come in through the constructor, never from process globals.
pub struct UserRegistry {
    store: Arc<dyn CredentialStore>,
    password_min_length: usize,
    user_name_max_length: usize,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn CredentialStore>, auth: &AuthConfig) -> Self {
        Self {
            store,
            password_min_length: auth.password_min_length,
            user_name_max_length: auth.user_name_max_length,
        }
    }

    /// Look up an account by its unique user name. Absence is `None`, not
    /// an error.
    pub async fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<User>, AppError> {
        Ok(self.store.get_user_by_user_name(user_name).await?)
    }

    /// Validate and assemble a new account: fresh ULID identity, hashed
    /// password. Persists nothing — pair with [`create`](Self::create).
    pub fn new_user(&self, user_name: &str, password: &str) -> Result<User, AppError> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(AppError::Validation(
                "user name must not be empty".to_string(),
            ));
        }
        if user_name.len() > self.user_name_max_length {
            return Err(AppError::Validation(format!(
                "user name must be at most {} characters",
                self.user_name_max_length
            )));
        }
        if password.is_empty() {
            return Err(AppError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        if password.len() < self.password_min_length {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                self.password_min_length
            )));
        }

        Ok(User {
            ulid: Ulid::new().to_string(),
            user_name: user_name.to_string(),
            password_hash: password::hash_password(password)?,
        })
    }

    /// Persist an account assembled by [`new_user`](Self::new_user).
    ///
    /// Callers check the name first as a fast path, but the store's
    /// uniqueness constraint is what actually rejects a concurrent
    /// duplicate (`StoreError::Duplicate`).
    pub async fn create(&self, user: User) -> Result<User, AppError> {
        Ok(self.store.insert_user(&user).await?)
    }
}
