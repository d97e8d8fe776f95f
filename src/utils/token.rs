// src/utils/token.rs

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Number of random bytes in an activation token.
const TOKEN_BYTES: usize = 32;

/// Freshly minted activation token.
///
/// `plain` goes into the email link; only `hashed` is ever persisted.
#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub plain: String,
    pub hashed: String,
}

pub fn generate_activation_token() -> ActivationToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let plain = hex::encode(bytes);
    let hashed = hash_token(&plain);

    ActivationToken { plain, hashed }
}

/// Hex SHA-256 of the plaintext token, as stored in `user_invitations`.
pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_is_hash_of_plain() {
        let token = generate_activation_token();
        assert_eq!(token.plain.len(), TOKEN_BYTES * 2);
        assert_ne!(token.plain, token.hashed);
        assert_eq!(hash_token(&token.plain), token.hashed);
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_activation_token();
        let b = generate_activation_token();
        assert_ne!(a.plain, b.plain);
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
