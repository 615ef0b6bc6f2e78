use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// The PHC string output embeds algorithm, parameters, and salt, so
/// verification needs nothing beyond the stored hash itself. Fails only on
/// entropy or parameter problems, which are fatal rather than user-facing.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC-format hash.
///
/// A mismatch is `Ok(false)`, never an error; errors mean the stored hash
/// itself is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::Hashing(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Hashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("s3cret-enough").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret-enough", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let hash = hash_password("the-real-password").unwrap();

        let verified = verify_password("not-the-password", &hash).unwrap();
        assert!(!verified);
    }

    #[test]
    fn test_same_password_hashes_differently() {
        // Fresh salt per call: equal inputs must not produce equal hashes,
        // but both must verify.
        let first = hash_password("pw123456").unwrap();
        let second = hash_password("pw123456").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("pw123456", &first).unwrap());
        assert!(verify_password("pw123456", &second).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(result.is_err());
    }
}
