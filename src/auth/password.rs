//! Password hashing with Argon2id.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a plaintext password into a PHC string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_phc_strings() {
        let a = hash_password("correct horse battery").expect("hash should succeed");
        let b = hash_password("correct horse battery").expect("hash should succeed");
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b, "salts must differ");
    }

    #[test]
    fn verify_accepts_the_right_password() {
        let hash = hash_password("open sesame").expect("hash should succeed");
        assert!(verify_password("open sesame", &hash).expect("verify should succeed"));
        assert!(!verify_password("open sesame!", &hash).expect("verify should succeed"));
    }

    #[test]
    fn garbage_hashes_are_errors_not_mismatches() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
