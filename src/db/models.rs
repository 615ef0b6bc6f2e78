use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A registered account.
///
/// `ulid` is assigned once at creation and doubles as the creation-ordered
/// sort key. The plaintext password never exists here, only its PHC-format
/// hash. No serde derives: credential rows must not end up in a response
/// body by accident.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub ulid: String,
    pub user_name: String,
    pub password_hash: String,
}

/// The single current session of a user, keyed by `user_ulid` in the store.
///
/// `access_token` is replaced on every successful validation, so at most one
/// token is ever valid for this record.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub user_ulid: String,
    pub access_token: String,
    pub expired: DateTime<Utc>,
}

impl Session {
    /// Build a fresh session expiring `ttl` from now.
    pub fn issue(user_ulid: String, access_token: String, ttl: chrono::Duration) -> Self {
        Self {
            user_ulid,
            access_token,
            expired: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expired
    }
}
