//! Expands a user-supplied (or default) password into the 256-byte ARCFOUR
//! key Eph5 needs, via PBKDF2-HMAC-SHA256 with the password doubling as salt.

use crate::arcfour::MAX_KEY_SIZE;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Eph5's default password when the caller supplies none.
pub const DEFAULT_PASSWORD: &str = "desu";

const PBKDF2_ITERATIONS: u32 = 1000;

/// Expands `password` into an ARCFOUR key of `key_len` bytes (at most
/// [`MAX_KEY_SIZE`]), using the password as both PBKDF2 password and salt.
pub fn expand_password(password: &str, key_len: usize) -> Vec<u8> {
    debug_assert!(key_len <= MAX_KEY_SIZE);
    let mut out = vec![0u8; key_len];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), password.as_bytes(), PBKDF2_ITERATIONS, &mut out);
    out
}

/// Expands the default password `"desu"` into a full 256-byte ARCFOUR key.
pub fn default_key() -> Vec<u8> {
    expand_password(DEFAULT_PASSWORD, MAX_KEY_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_is_deterministic_and_full_length() {
        let a = default_key();
        let b = default_key();
        assert_eq!(a, b);
        assert_eq!(a.len(), MAX_KEY_SIZE);
    }

    #[test]
    fn different_passwords_yield_different_keys() {
        let a = expand_password("desu", 32);
        let b = expand_password("other", 32);
        assert_ne!(a, b);
    }
}
