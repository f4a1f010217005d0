//! # Service Tracking Tokens
//!
//! Short codes customers use to look up their repair without logging in.
//!
//! Tokens are 6 characters from `A-Z0-9` — easy to read over the phone,
//! no lookalike filtering (the set is small enough that collisions with
//! an owner's existing tokens are handled by retrying at insert time).

use uuid::Uuid;

/// Token length in characters.
pub const TOKEN_LEN: usize = 6;

/// Token alphabet: uppercase letters and digits.
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random tracking token.
///
/// Entropy comes from a v4 UUID's leading random bytes. The caller is
/// responsible for uniqueness within an owner (regenerate on collision);
/// with 36^6 ≈ 2.2 billion combinations, retries are rare.
pub fn generate_token() -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    bytes[..TOKEN_LEN]
        .iter()
        .map(|b| TOKEN_ALPHABET[(*b as usize) % TOKEN_ALPHABET.len()] as char)
        .collect()
}

/// Checks whether a string is shaped like a tracking token.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| TOKEN_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        for _ in 0..100 {
            let token = generate_token();
            assert_eq!(token.len(), TOKEN_LEN);
            assert!(is_valid_token(&token), "bad token: {token}");
        }
    }

    #[test]
    fn test_tokens_vary() {
        let a = generate_token();
        let b = generate_token();
        let c = generate_token();
        // Three identical draws would be a one-in-quintillions event.
        assert!(!(a == b && b == c));
    }

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("AB12CD"));
        assert!(is_valid_token("000000"));
        assert!(!is_valid_token("ab12cd")); // lowercase
        assert!(!is_valid_token("AB12C")); // too short
        assert!(!is_valid_token("AB12CDE")); // too long
        assert!(!is_valid_token("AB-2CD")); // punctuation
    }
}
