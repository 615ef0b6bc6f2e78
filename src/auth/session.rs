use std::sync::Arc;

use chrono::Duration;

use crate::auth::password;
use crate::auth::token;
use crate::config::AuthConfig;
use crate::db::models::Session;
use crate::db::store::CredentialStore;
use crate::error::{AppError, AuthError};

/// A submitted login attempt. Pure data — nothing touches the store until
/// it is handed to [`SessionManager::login`].
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(user_name: String, password: String) -> Self {
        Self {
            user_name,
            password,
        }
    }
}

/// Login and session validation.
///
/// Holds no session state of its own: every call is a fresh
/// read-verify-write cycle against the store, which is also the only
/// synchronization point between concurrent requests.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, auth: &AuthConfig) -> Self {
        Self {
            store,
            session_ttl: auth.session_ttl(),
        }
    }

    /// Verify credentials and issue a session.
    ///
    /// Unknown user and wrong password surface as the same
    /// `InvalidCredentials`, so responses cannot be used to enumerate user
    /// names. On success the session record for this user is created or
    /// replaced, keyed by the user's ULID.
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AppError> {
        let user = match self.store.get_user_by_user_name(&request.user_name).await? {
            Some(user) => user,
            None => {
                // Burn a hash so this path costs the same as a wrong
                // password; the two must not be distinguishable by timing
                // either.
                let _ = password::hash_password(&request.password);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !password::verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let session = Session::issue(user.ulid, token::generate_token(), self.session_ttl);
        self.store.put_session(&session).await?;

        Ok(session)
    }

    /// Validate a presented token and rotate it.
    ///
    /// Every successful check replaces the stored token and pushes the
    /// expiry out by the full TTL; the caller must carry the returned pair
    /// back to the client. A failed check never mutates the stored record.
    /// If a concurrent check rotates first, the guarded overwrite loses and
    /// this call reports `InvalidToken` — exactly one of N simultaneous
    /// validations of the same token can win.
    pub async fn check_session(
        &self,
        user_ulid: &str,
        access_token: &str,
    ) -> Result<Session, AppError> {
        let session = self
            .store
            .get_session(user_ulid)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !token::constant_time_eq(access_token.as_bytes(), session.access_token.as_bytes()) {
            return Err(AuthError::InvalidToken.into());
        }
        if session.is_expired() {
            return Err(AuthError::SessionExpired.into());
        }

        let next = Session::issue(
            user_ulid.to_string(),
            token::generate_token(),
            self.session_ttl,
        );
        let swapped = self
            .store
            .swap_session_token(user_ulid, access_token, &next)
            .await?;
        if !swapped {
            return Err(AuthError::InvalidToken.into());
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::registry::UserRegistry;
    use crate::db::store::MockCredentialStore;
    use crate::db::MemoryStore;
    use crate::error::StoreError;
    use chrono::Utc;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            session_ttl_minutes: 30,
            password_min_length: 8,
            user_name_max_length: 64,
        }
    }

    /// Store with one created user, plus a manager over the same store.
    async fn seeded(user_name: &str, password: &str) -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let auth = auth_config();
        let registry = UserRegistry::new(store.clone(), &auth);
        let user = registry.new_user(user_name, password).unwrap();
        registry.create(user).await.unwrap();

        let manager = SessionManager::new(store.clone(), &auth);
        (store, manager)
    }

    fn auth_err(result: Result<Session, AppError>) -> AuthError {
        match result {
            Err(AppError::Auth(e)) => e,
            Ok(s) => panic!("expected auth error, got session for {}", s.user_ulid),
            Err(e) => panic!("expected auth error, got {e}"),
        }
    }

    #[tokio::test]
    async fn test_login_issues_a_live_session() {
        let (store, manager) = seeded("bob", "pw123-long-enough").await;

        let session = manager
            .login(LoginRequest::new(
                "bob".to_string(),
                "pw123-long-enough".to_string(),
            ))
            .await
            .unwrap();

        assert!(!session.access_token.is_empty());
        assert!(session.expired > Utc::now());

        // The store now holds exactly this session, keyed by the user.
        let stored = store.get_session(&session.user_ulid).await.unwrap().unwrap();
        assert_eq!(stored.access_token, session.access_token);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_store, manager) = seeded("bob", "pw123-long-enough").await;

        let wrong_password = auth_err(
            manager
                .login(LoginRequest::new(
                    "bob".to_string(),
                    "not-the-password".to_string(),
                ))
                .await,
        );
        let unknown_user = auth_err(
            manager
                .login(LoginRequest::new(
                    "nouser".to_string(),
                    "whatever-pw".to_string(),
                ))
                .await,
        );

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(unknown_user, wrong_password);
    }

    #[test_log::test(tokio::test)]
    async fn test_check_session_rotates_the_token() {
        let (_store, manager) = seeded("bob", "pw123-long-enough").await;
        let first = manager
            .login(LoginRequest::new(
                "bob".to_string(),
                "pw123-long-enough".to_string(),
            ))
            .await
            .unwrap();

        let second = manager
            .check_session(&first.user_ulid, &first.access_token)
            .await
            .unwrap();
        assert_ne!(second.access_token, first.access_token);
        // Sliding expiration: each validation extends the horizon.
        assert!(second.expired >= first.expired);

        // The old token died the moment the new one was issued.
        let replayed = auth_err(
            manager
                .check_session(&first.user_ulid, &first.access_token)
                .await,
        );
        assert_eq!(replayed, AuthError::InvalidToken);

        // The rotated token is the live one.
        manager
            .check_session(&second.user_ulid, &second.access_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_check_session_without_record() {
        let (_store, manager) = seeded("bob", "pw123-long-enough").await;

        let err = auth_err(manager.check_session("01ARZ3NDEKTSV4RRFFQ69G5FAV", "t").await);
        assert_eq!(err, AuthError::SessionNotFound);
    }

    #[tokio::test]
    async fn test_wrong_token_leaves_record_untouched() {
        let (store, manager) = seeded("bob", "pw123-long-enough").await;
        let session = manager
            .login(LoginRequest::new(
                "bob".to_string(),
                "pw123-long-enough".to_string(),
            ))
            .await
            .unwrap();

        let err = auth_err(
            manager
                .check_session(&session.user_ulid, "forged-token-value")
                .await,
        );
        assert_eq!(err, AuthError::InvalidToken);

        // The stored token did not rotate, so the real one still works.
        let stored = store.get_session(&session.user_ulid).await.unwrap().unwrap();
        assert_eq!(stored.access_token, session.access_token);
        manager
            .check_session(&session.user_ulid, &session.access_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_fails_even_with_correct_token() {
        let (store, manager) = seeded("bob", "pw123-long-enough").await;

        let stale = Session {
            user_ulid: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            access_token: "still-the-right-token".to_string(),
            expired: Utc::now() - Duration::minutes(5),
        };
        store.put_session(&stale).await.unwrap();

        let err = auth_err(
            manager
                .check_session(&stale.user_ulid, &stale.access_token)
                .await,
        );
        assert_eq!(err, AuthError::SessionExpired);

        // Rejection must not have touched the record.
        let stored = store.get_session(&stale.user_ulid).await.unwrap().unwrap();
        assert_eq!(stored.access_token, stale.access_token);
        assert_eq!(stored.expired, stale.expired);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_rotate_exactly_once() {
        let (_store, manager) = seeded("carol", "pw123-long-enough").await;
        let manager = Arc::new(manager);
        let session = manager
            .login(LoginRequest::new(
                "carol".to_string(),
                "pw123-long-enough".to_string(),
            ))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let user_ulid = session.user_ulid.clone();
            let presented = session.access_token.clone();
            handles.push(tokio::spawn(async move {
                manager.check_session(&user_ulid, &presented).await
            }));
        }

        let mut wins = 0;
        let mut losses = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(AppError::Auth(AuthError::InvalidToken)) => losses += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(losses, 7);
    }

    #[tokio::test]
    async fn test_store_failures_propagate_unchanged() {
        let mut mock = MockCredentialStore::new();
        mock.expect_get_user_by_user_name()
            .returning(|_| Err(StoreError::Query("connection reset".to_string())));
        let manager = SessionManager::new(Arc::new(mock), &auth_config());

        let result = manager
            .login(LoginRequest::new(
                "bob".to_string(),
                "pw123-long-enough".to_string(),
            ))
            .await;
        assert!(matches!(result, Err(AppError::Store(StoreError::Query(_)))));

        let mut mock = MockCredentialStore::new();
        mock.expect_get_session()
            .returning(|_| Err(StoreError::Connection("pool closed".to_string())));
        let manager = SessionManager::new(Arc::new(mock), &auth_config());

        let result = manager.check_session("some-ulid", "some-token").await;
        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::Connection(_)))
        ));
    }
}
