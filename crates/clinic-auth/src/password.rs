//! Password hashing using Argon2id.
//!
//! Hashes are stored in PHC string format (`$argon2id$v=19$...`), which
//! embeds the salt and the parameters next to the digest.
//!
//! # Example
//!
//! ```
//! use clinic_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("pw1").unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(verify_password("pw1", &hash).unwrap());
//! assert!(!verify_password("pw2", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Well-formed Argon2id hash that no password produces in practice.
///
/// Login verifies against it when the username is unknown so that both
/// failure paths spend the same hashing work.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password for storage using Argon2id.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Verify against the stored hash if there is one, otherwise against a dummy.
///
/// Always returns `false` when `hash` is `None`.
pub fn verify_password_or_dummy(
    password: &str,
    hash: Option<&str>,
) -> Result<bool, argon2::password_hash::Error> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let _ = verify_password(password, DUMMY_HASH)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id() {
        let hash = hash_password("pw1").unwrap();
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("pw1").unwrap();
        let b = hash_password("pw1").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pw1", &a).unwrap());
        assert!(verify_password("pw1", &b).unwrap());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("pw1").unwrap();
        assert!(!verify_password("pw2", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw1", "not-a-hash").is_err());
    }

    #[test]
    fn test_dummy_hash_parses_and_never_matches() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password_or_dummy("pw1", None).unwrap());
        assert!(!verify_password_or_dummy("", None).unwrap());
    }

    #[test]
    fn test_or_dummy_uses_real_hash_when_present() {
        let hash = hash_password("pw1").unwrap();
        assert!(verify_password_or_dummy("pw1", Some(&hash)).unwrap());
        assert!(!verify_password_or_dummy("nope", Some(&hash)).unwrap());
    }
}
