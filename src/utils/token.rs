// src/utils/token.rs

use rand::RngCore;

/// Generates `len` random bytes and returns them hex-encoded.
///
/// Used for nonces (32 bytes), session ids (16 bytes), login tokens
/// (32 bytes) and fallback token ids.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hex_has_expected_length() {
        assert_eq!(random_hex(16).len(), 32);
        assert_eq!(random_hex(32).len(), 64);
    }

    #[test]
    fn random_hex_is_not_constant() {
        assert_ne!(random_hex(32), random_hex(32));
    }
}
