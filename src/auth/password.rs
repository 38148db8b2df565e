use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Hashes a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Verifies a plaintext password against a stored PHC string. A hash that
/// does not parse counts as a mismatch, so callers keep a single
/// invalid-credentials path.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "malformed password hash in credential store");
            return false;
        }
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Hash verified for logins against unknown emails, so both login failure
/// modes cost one argon2 pass.
pub fn placeholder_hash() -> &'static str {
    lazy_static! {
        static ref PLACEHOLDER: String =
            hash_password("placeholder-password").expect("hashing a static string");
    }
    PLACEHOLDER.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn malformed_hash_is_a_mismatch_not_a_panic() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
        assert!(!verify_password("hunter2", "$argon2id$broken"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }

    #[test]
    fn placeholder_hash_is_well_formed_but_matches_nothing_sent_by_clients() {
        assert!(PasswordHash::new(placeholder_hash()).is_ok());
        assert!(!verify_password("hunter2", placeholder_hash()));
        assert!(!verify_password("", placeholder_hash()));
    }
}
