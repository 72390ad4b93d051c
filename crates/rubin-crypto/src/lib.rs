//! Concrete `rubin_consensus::CryptoProvider` implementations.
//!
//! The consensus core defines the trait and depends on nothing here; this
//! crate supplies the two collaborators named in spec §9's design notes: a
//! development implementation backed by a software SHA3 (no PQ signature
//! support — unblocks early tooling, never production) and a native
//! implementation that verifies ML-DSA-87/SLH-DSA-SHAKE-256f through
//! OpenSSL's EVP interface.

#[cfg(feature = "openssl")]
mod openssl_verify;

use rubin_consensus::CryptoProvider;
use sha3::{Digest, Sha3_256};

fn software_sha3_256(input: &[u8]) -> [u8; 32] {
    let mut h = Sha3_256::new();
    h.update(input);
    let out = h.finalize();
    let mut r = [0u8; 32];
    r.copy_from_slice(&out);
    r
}

/// Development-only provider: real SHA3-256, PQ verification always
/// reports "not implemented". This is NOT a FIPS claim and MUST NOT be
/// used to validate real chain data; it exists to unblock tooling that
/// only exercises the non-cryptographic parts of the core.
#[cfg(feature = "dev-std")]
pub struct DevStdCryptoProvider;

#[cfg(feature = "dev-std")]
impl CryptoProvider for DevStdCryptoProvider {
    fn sha3_256(&self, input: &[u8]) -> [u8; 32] {
        software_sha3_256(input)
    }

    fn verify_ml_dsa_87(
        &self,
        _pubkey: &[u8],
        _signature: &[u8],
        _digest: &[u8; 32],
    ) -> Result<bool, String> {
        Err("DevStdCryptoProvider: ML-DSA-87 verification not implemented".into())
    }

    fn verify_slh_dsa_shake_256f(
        &self,
        _pubkey: &[u8],
        _signature: &[u8],
        _digest: &[u8; 32],
    ) -> Result<bool, String> {
        Err("DevStdCryptoProvider: SLH-DSA-SHAKE-256f verification not implemented".into())
    }
}

/// Native provider backed by OpenSSL's EVP one-shot digest-verify API.
#[cfg(feature = "openssl")]
pub struct OpenSslCryptoProvider;

#[cfg(feature = "openssl")]
impl CryptoProvider for OpenSslCryptoProvider {
    fn sha3_256(&self, input: &[u8]) -> [u8; 32] {
        software_sha3_256(input)
    }

    fn verify_ml_dsa_87(
        &self,
        pubkey: &[u8],
        signature: &[u8],
        digest: &[u8; 32],
    ) -> Result<bool, String> {
        openssl_verify::verify(openssl_verify::Suite::MlDsa87, pubkey, signature, digest)
    }

    fn verify_slh_dsa_shake_256f(
        &self,
        pubkey: &[u8],
        signature: &[u8],
        digest: &[u8; 32],
    ) -> Result<bool, String> {
        openssl_verify::verify(
            openssl_verify::Suite::SlhDsaShake256f,
            pubkey,
            signature,
            digest,
        )
    }
}

#[cfg(all(test, feature = "dev-std"))]
mod tests {
    use super::*;

    #[test]
    fn dev_provider_hashes_with_real_sha3() {
        let p = DevStdCryptoProvider;
        assert_eq!(p.sha3_256(b"abc").len(), 32);
        assert_eq!(p.sha3_256(b"abc"), p.sha3_256(b"abc"));
        assert_ne!(p.sha3_256(b"abc"), p.sha3_256(b"abd"));
    }

    #[test]
    fn dev_provider_refuses_to_verify() {
        let p = DevStdCryptoProvider;
        assert!(p.verify_ml_dsa_87(&[], &[], &[0; 32]).is_err());
        assert!(p.verify_slh_dsa_shake_256f(&[], &[], &[0; 32]).is_err());
    }
}
