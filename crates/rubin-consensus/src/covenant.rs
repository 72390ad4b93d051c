//! Output-covenant shape parsing and the genesis accept/reject table
//! (spec §4.3). At genesis only `{P2PK, TIMELOCK, ANCHOR, VAULT, EXT}` are
//! even considered; VAULT is parsed (for shape coverage) but always
//! rejected pending ratification — see `DESIGN.md`.

use crate::constants::*;
use crate::core_ext::parse_core_ext_covenant_data;
use crate::error::{ErrorCode, TxError};
use crate::tx::{Tx, TxOutput};
use crate::vault::parse_vault_covenant_data;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P2pkCovenant {
    pub suite_id: u8,
    pub key_id: [u8; 32],
}

pub fn parse_p2pk_covenant_data(data: &[u8]) -> Result<P2pkCovenant, TxError> {
    if data.len() as u64 != P2PK_COVENANT_DATA_LEN {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "P2PK covenant_data must be 33 bytes",
        ));
    }
    let suite_id = data[0];
    let mut key_id = [0u8; 32];
    key_id.copy_from_slice(&data[1..33]);
    Ok(P2pkCovenant { suite_id, key_id })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelockMode {
    Height,
    Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelockCovenant {
    pub mode: TimelockMode,
    pub lock_value: u64,
}

pub fn parse_timelock_covenant_data(data: &[u8]) -> Result<TimelockCovenant, TxError> {
    if data.len() as u64 != TIMELOCK_COVENANT_DATA_LEN {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "TIMELOCK covenant_data must be 9 bytes",
        ));
    }
    let mode = match data[0] {
        TIMELOCK_MODE_HEIGHT => TimelockMode::Height,
        TIMELOCK_MODE_TIME => TimelockMode::Time,
        _ => {
            return Err(TxError::new(
                ErrorCode::TxErrCovenantTypeInvalid,
                "invalid TIMELOCK lock_mode",
            ))
        }
    };
    let lock_value = u64::from_le_bytes(data[1..9].try_into().unwrap());
    Ok(TimelockCovenant { mode, lock_value })
}

fn validate_anchor(out: &TxOutput) -> Result<(), TxError> {
    if out.value != 0 {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "ANCHOR output must carry zero value",
        ));
    }
    let len = out.covenant_data.len() as u64;
    if len == 0 || len > MAX_ANCHOR_PAYLOAD_SIZE {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "ANCHOR payload length out of bounds",
        ));
    }
    Ok(())
}

fn validate_p2pk_shape(out: &TxOutput, block_height: u64) -> Result<(), TxError> {
    if out.value == 0 {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "P2PK output must carry nonzero value",
        ));
    }
    let p2pk = parse_p2pk_covenant_data(&out.covenant_data)?;
    match p2pk.suite_id {
        SUITE_ID_ML_DSA_87 => Ok(()),
        SUITE_ID_SLH_DSA_SHAKE_256F if block_height >= SLH_DSA_ACTIVATION_HEIGHT => Ok(()),
        _ => Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "P2PK suite_id not accepted at this height",
        )),
    }
}

fn validate_timelock_shape(out: &TxOutput) -> Result<(), TxError> {
    if out.value == 0 {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "TIMELOCK output must carry nonzero value",
        ));
    }
    parse_timelock_covenant_data(&out.covenant_data)?;
    Ok(())
}

fn validate_ext_shape(out: &TxOutput) -> Result<(), TxError> {
    if out.value == 0 {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "CORE_EXT output must carry nonzero value",
        ));
    }
    parse_core_ext_covenant_data(&out.covenant_data)?;
    Ok(())
}

/// Validates every output's covenant against the genesis-rules accept
/// table. Applies to non-coinbase transactions; coinbase outputs are
/// validated by the block-level coinbase checks instead (which additionally
/// permit the CORE_ANCHOR witness-commitment output).
pub fn validate_tx_covenants_genesis(tx: &Tx, block_height: u64) -> Result<(), TxError> {
    for out in &tx.outputs {
        match out.covenant_type {
            COV_TYPE_P2PK => validate_p2pk_shape(out, block_height)?,
            COV_TYPE_TIMELOCK => validate_timelock_shape(out)?,
            COV_TYPE_ANCHOR => validate_anchor(out)?,
            COV_TYPE_VAULT => {
                // Parsed for shape coverage, then unconditionally rejected:
                // CORE_VAULT semantics are pending ratification (spec §9).
                let _ = parse_vault_covenant_data(&out.covenant_data);
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "CORE_VAULT is not accepted at genesis",
                ));
            }
            COV_TYPE_EXT => validate_ext_shape(out)?,
            COV_TYPE_RESERVED_FUTURE => {
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "reserved covenant type",
                ))
            }
            _ => {
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "unsupported covenant type",
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{TxInput, WitnessItem};

    fn base_tx(outputs: Vec<TxOutput>) -> Tx {
        Tx {
            version: TX_WIRE_VERSION,
            tx_kind: TX_KIND_STANDARD,
            tx_nonce: 1,
            inputs: vec![TxInput {
                prev_txid: [1; 32],
                prev_vout: 0,
                script_sig: Vec::new(),
                sequence: 0,
            }],
            outputs,
            locktime: 0,
            da_commit: None,
            da_chunk: None,
            witness: vec![WitnessItem {
                suite_id: SUITE_ID_SENTINEL,
                pubkey: Vec::new(),
                signature: Vec::new(),
            }],
            da_payload: Vec::new(),
        }
    }

    fn p2pk_data(suite: u8) -> Vec<u8> {
        let mut d = vec![suite];
        d.extend_from_slice(&[0x55; 32]);
        d
    }

    #[test]
    fn p2pk_accepted_at_genesis() {
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: COV_TYPE_P2PK,
            covenant_data: p2pk_data(SUITE_ID_ML_DSA_87),
        }]);
        assert!(validate_tx_covenants_genesis(&tx, 0).is_ok());
    }

    #[test]
    fn slh_dsa_p2pk_rejected_before_activation() {
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: COV_TYPE_P2PK,
            covenant_data: p2pk_data(SUITE_ID_SLH_DSA_SHAKE_256F),
        }]);
        let err = validate_tx_covenants_genesis(&tx, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrCovenantTypeInvalid);
    }

    #[test]
    fn anchor_requires_zero_value() {
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: COV_TYPE_ANCHOR,
            covenant_data: vec![0xaa],
        }]);
        assert!(validate_tx_covenants_genesis(&tx, 0).is_err());
    }

    #[test]
    fn vault_is_always_rejected_at_genesis() {
        let mut data = Vec::new();
        data.extend_from_slice(&[1; 32]);
        data.extend_from_slice(&[2; 32]);
        data.extend_from_slice(&200u32.to_le_bytes());
        data.push(0x00);
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: COV_TYPE_VAULT,
            covenant_data: data,
        }]);
        let err = validate_tx_covenants_genesis(&tx, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrCovenantTypeInvalid);
    }

    #[test]
    fn unsupported_covenant_types_are_rejected() {
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: 0x0200,
            covenant_data: vec![1, 2, 3],
        }]);
        let err = validate_tx_covenants_genesis(&tx, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrCovenantTypeInvalid);
    }

    #[test]
    fn timelock_height_mode_parses() {
        let mut data = vec![TIMELOCK_MODE_HEIGHT];
        data.extend_from_slice(&500u64.to_le_bytes());
        let tx = base_tx(vec![TxOutput {
            value: 1,
            covenant_type: COV_TYPE_TIMELOCK,
            covenant_data: data,
        }]);
        assert!(validate_tx_covenants_genesis(&tx, 0).is_ok());
    }
}
