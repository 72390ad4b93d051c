//! Signature-suite dispatch for per-input spend validation (spec §4.5).
//! `validate_p2pk_spend` is the sole entry point; CORE_TIMELOCK and
//! CORE_ANCHOR never reach it (no signature to check) and CORE_EXT has its
//! own dispatch in `core_ext`.

use crate::constants::{
    MAX_SLH_DSA_SIG_BYTES, ML_DSA_87_PUBKEY_BYTES, ML_DSA_87_SIG_BYTES, SLH_DSA_ACTIVATION_HEIGHT,
    SLH_DSA_SHAKE_256F_PUBKEY_BYTES, SUITE_ID_ML_DSA_87, SUITE_ID_SLH_DSA_SHAKE_256F,
};
use crate::covenant::parse_p2pk_covenant_data;
use crate::crypto::{dispatch_verify, CryptoProvider};
use crate::error::{ErrorCode, TxError};
use crate::hash::sha3_256;
use crate::tx::WitnessItem;
use crate::utxo::UtxoEntry;

/// Checks pubkey/signature byte lengths for the suites that have a fixed or
/// bounded canonical shape. Must run after the activation-height gate so an
/// inactive suite is reported as `TX_ERR_SIG_ALG_INVALID`, not as
/// non-canonical.
fn check_canonical_lengths(w: &WitnessItem) -> Result<(), TxError> {
    let ok = match w.suite_id {
        SUITE_ID_ML_DSA_87 => {
            w.pubkey.len() as u64 == ML_DSA_87_PUBKEY_BYTES
                && w.signature.len() as u64 == ML_DSA_87_SIG_BYTES
        }
        SUITE_ID_SLH_DSA_SHAKE_256F => {
            w.pubkey.len() as u64 == SLH_DSA_SHAKE_256F_PUBKEY_BYTES
                && !w.signature.is_empty()
                && w.signature.len() as u64 <= MAX_SLH_DSA_SIG_BYTES
        }
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(TxError::new(
            ErrorCode::TxErrSigNoncanonical,
            "witness item pubkey/signature length non-canonical",
        ))
    }
}

/// Validates a CORE_P2PK spend in the deterministic precedence order spec
/// §4.5 requires: covenant shape, suite allowed at height, key-binding,
/// canonical lengths, cryptographic verification.
pub fn validate_p2pk_spend(
    entry: &UtxoEntry,
    w: &WitnessItem,
    digest: &[u8; 32],
    block_height: u64,
    provider: &dyn CryptoProvider,
) -> Result<(), TxError> {
    let cov = parse_p2pk_covenant_data(&entry.covenant_data)?;
    if w.suite_id != cov.suite_id {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "witness suite_id does not match CORE_P2PK covenant suite_id",
        ));
    }

    if w.suite_id != SUITE_ID_ML_DSA_87 && w.suite_id != SUITE_ID_SLH_DSA_SHAKE_256F {
        return Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "CORE_P2PK suite invalid",
        ));
    }
    if w.suite_id == SUITE_ID_SLH_DSA_SHAKE_256F && block_height < SLH_DSA_ACTIVATION_HEIGHT {
        return Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "SLH-DSA suite inactive at this height",
        ));
    }

    if sha3_256(&w.pubkey) != cov.key_id {
        return Err(TxError::new(
            ErrorCode::TxErrSigInvalid,
            "CORE_P2PK key binding mismatch",
        ));
    }

    check_canonical_lengths(w)?;

    let ok = dispatch_verify(provider, w.suite_id, &w.pubkey, &w.signature, digest)?;
    if !ok {
        return Err(TxError::new(
            ErrorCode::TxErrSigInvalid,
            "CORE_P2PK signature invalid",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COV_TYPE_P2PK;
    use crate::crypto::test_support::{sign, ToyProvider};

    fn entry_for(suite_id: u8, key_id: [u8; 32]) -> UtxoEntry {
        let mut data = vec![suite_id];
        data.extend_from_slice(&key_id);
        UtxoEntry {
            value: 1,
            covenant_type: COV_TYPE_P2PK,
            covenant_data: data,
            creation_height: 0,
            created_by_coinbase: false,
        }
    }

    #[test]
    fn mismatched_witness_suite_is_covenant_type_invalid() {
        let entry = entry_for(SUITE_ID_ML_DSA_87, [0; 32]);
        let w = WitnessItem {
            suite_id: SUITE_ID_SLH_DSA_SHAKE_256F,
            pubkey: vec![0u8; SLH_DSA_SHAKE_256F_PUBKEY_BYTES as usize],
            signature: vec![0u8; 10],
        };
        let err = validate_p2pk_spend(&entry, &w, &[0u8; 32], SLH_DSA_ACTIVATION_HEIGHT, &ToyProvider)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrCovenantTypeInvalid);
    }

    #[test]
    fn slh_dsa_before_activation_is_sig_alg_invalid() {
        let entry = entry_for(SUITE_ID_SLH_DSA_SHAKE_256F, [0; 32]);
        let w = WitnessItem {
            suite_id: SUITE_ID_SLH_DSA_SHAKE_256F,
            pubkey: vec![0u8; SLH_DSA_SHAKE_256F_PUBKEY_BYTES as usize],
            signature: vec![0u8; 10],
        };
        let err = validate_p2pk_spend(&entry, &w, &[0u8; 32], 0, &ToyProvider).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrSigAlgInvalid);
    }

    #[test]
    fn key_binding_mismatch_is_sig_invalid() {
        let entry = entry_for(SUITE_ID_ML_DSA_87, [0xaa; 32]);
        let w = WitnessItem {
            suite_id: SUITE_ID_ML_DSA_87,
            pubkey: vec![0u8; ML_DSA_87_PUBKEY_BYTES as usize],
            signature: vec![0u8; ML_DSA_87_SIG_BYTES as usize],
        };
        let err = validate_p2pk_spend(&entry, &w, &[0u8; 32], 0, &ToyProvider).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrSigInvalid);
    }

    #[test]
    fn noncanonical_slh_signature_length_is_rejected() {
        let pubkey = vec![0u8; SLH_DSA_SHAKE_256F_PUBKEY_BYTES as usize];
        let key_id = sha3_256(&pubkey);
        let entry = entry_for(SUITE_ID_SLH_DSA_SHAKE_256F, key_id);
        let w = WitnessItem {
            suite_id: SUITE_ID_SLH_DSA_SHAKE_256F,
            pubkey,
            signature: Vec::new(),
        };
        let err = validate_p2pk_spend(&entry, &w, &[0u8; 32], SLH_DSA_ACTIVATION_HEIGHT, &ToyProvider)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrSigNoncanonical);
    }

    #[test]
    fn valid_ml_dsa_spend_is_accepted() {
        let pubkey = vec![0x11u8; ML_DSA_87_PUBKEY_BYTES as usize];
        let key_id = sha3_256(&pubkey);
        let digest = [0x22u8; 32];
        let signature = sign(&pubkey, &digest);
        let entry = entry_for(SUITE_ID_ML_DSA_87, key_id);
        let w = WitnessItem {
            suite_id: SUITE_ID_ML_DSA_87,
            pubkey,
            signature,
        };
        validate_p2pk_spend(&entry, &w, &digest, 0, &ToyProvider).unwrap();
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let pubkey = vec![0x11u8; ML_DSA_87_PUBKEY_BYTES as usize];
        let key_id = sha3_256(&pubkey);
        let entry = entry_for(SUITE_ID_ML_DSA_87, key_id);
        let w = WitnessItem {
            suite_id: SUITE_ID_ML_DSA_87,
            pubkey,
            signature: vec![0u8; ML_DSA_87_SIG_BYTES as usize],
        };
        let err = validate_p2pk_spend(&entry, &w, &[0u8; 32], 0, &ToyProvider).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrSigInvalid);
    }
}
