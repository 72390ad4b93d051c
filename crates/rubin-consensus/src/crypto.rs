//! The core's single injected collaborator (spec §6). `CryptoProvider` is
//! defined here, by the core, even though every *implementation* of it
//! (the `rubin-crypto` crate) lives outside the core's scope. A compliant
//! provider MUST be referentially transparent — same inputs, same outputs,
//! no internal state — and reentrant, since the core may invoke `verify`
//! concurrently from multiple threads during batch validation.

use crate::constants::{SUITE_ID_ML_DSA_87, SUITE_ID_SENTINEL, SUITE_ID_SLH_DSA_SHAKE_256F};
use crate::error::{ErrorCode, TxError};

pub trait CryptoProvider {
    fn sha3_256(&self, input: &[u8]) -> [u8; 32];

    /// Returns `Ok(true)`/`Ok(false)` for a well-formed verification
    /// attempt. Implementations MUST reject ill-sized pubkeys/signatures by
    /// returning `Err` rather than `Ok(false)` (spec §6) — canonicality is
    /// checked by the core before dispatch, but a provider given malformed
    /// input directly must not silently report it as "signature invalid".
    fn verify_ml_dsa_87(&self, pubkey: &[u8], signature: &[u8], digest: &[u8; 32]) -> Result<bool, String>;

    fn verify_slh_dsa_shake_256f(
        &self,
        pubkey: &[u8],
        signature: &[u8],
        digest: &[u8; 32],
    ) -> Result<bool, String>;
}

/// Dispatches to the per-suite `CryptoProvider` method for a runtime
/// `suite_id`. `SENTINEL` and any unrecognized id are `TX_ERR_SIG_ALG_INVALID`
/// — callers are expected to have already excluded sentinel/keyless
/// witnesses from ever reaching cryptographic verification.
pub fn dispatch_verify(
    provider: &dyn CryptoProvider,
    suite_id: u8,
    pubkey: &[u8],
    signature: &[u8],
    digest: &[u8; 32],
) -> Result<bool, TxError> {
    match suite_id {
        SUITE_ID_ML_DSA_87 => provider
            .verify_ml_dsa_87(pubkey, signature, digest)
            .map_err(|_| TxError::new(ErrorCode::TxErrSigInvalid, "provider error")),
        SUITE_ID_SLH_DSA_SHAKE_256F => provider
            .verify_slh_dsa_shake_256f(pubkey, signature, digest)
            .map_err(|_| TxError::new(ErrorCode::TxErrSigInvalid, "provider error")),
        SUITE_ID_SENTINEL => Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "sentinel suite cannot be cryptographically verified",
        )),
        _ => Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "unknown suite id",
        )),
    }
}
