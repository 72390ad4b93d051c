use sha3::{Digest, Sha3_256};

/// The core's single hash primitive.
pub fn sha3_256(b: &[u8]) -> [u8; 32] {
    let mut h = Sha3_256::new();
    h.update(b);
    let out = h.finalize();
    let mut r = [0u8; 32];
    r.copy_from_slice(&out);
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic_and_input_sensitive() {
        assert_eq!(sha3_256(b"rubin"), sha3_256(b"rubin"));
        assert_ne!(sha3_256(b"rubin"), sha3_256(b"Rubin"));
        assert_ne!(sha3_256(b""), [0u8; 32]);
    }
}
