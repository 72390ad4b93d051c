//! UTXO-set lookup and non-coinbase transaction application (spec §4.6).
//! Structural coinbase detection lives in `block_validate`, which is the
//! only caller entitled to special-case the first transaction in a block.

use std::collections::HashMap;

use crate::constants::{
    COINBASE_MATURITY, COV_TYPE_ANCHOR, COV_TYPE_EXT, COV_TYPE_P2PK, COV_TYPE_TIMELOCK,
    COV_TYPE_VAULT, SUITE_ID_ML_DSA_87, SUITE_ID_SENTINEL, SUITE_ID_SLH_DSA_SHAKE_256F,
    VERIFY_COST_ML_DSA_87, VERIFY_COST_SLH_DSA_SHAKE_256F, VERIFY_COST_UNKNOWN_SUITE,
    WITNESS_DISCOUNT_DIVISOR,
};
use crate::core_ext::{validate_core_ext_spend, CoreExtProfiles};
use crate::covenant::{parse_timelock_covenant_data, validate_tx_covenants_genesis, TimelockMode};
use crate::crypto::CryptoProvider;
use crate::error::{ErrorCode, TxError};
use crate::sighash::sighash_v1_digest;
use crate::spend::validate_p2pk_spend;
use crate::tx::{tx_no_witness_bytes, witness_section_bytes, Tx};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Outpoint {
    pub txid: [u8; 32],
    pub vout: u32,
}

/// The canonical 36-byte outpoint key used by the chainstate hash (spec
/// §3/§4.10): `txid ‖ vout_le32`.
pub fn outpoint_key_bytes(op: &Outpoint) -> [u8; 36] {
    let mut out = [0u8; 36];
    out[0..32].copy_from_slice(&op.txid);
    out[32..36].copy_from_slice(&op.vout.to_le_bytes());
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoEntry {
    pub value: u64,
    pub covenant_type: u16,
    pub covenant_data: Vec<u8>,
    pub creation_height: u64,
    pub created_by_coinbase: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoApplySummary {
    pub fee: u64,
    pub utxo_count: u64,
}

fn witness_item_verify_cost(suite_id: u8) -> u64 {
    match suite_id {
        SUITE_ID_SENTINEL => 0,
        SUITE_ID_ML_DSA_87 => VERIFY_COST_ML_DSA_87,
        SUITE_ID_SLH_DSA_SHAKE_256F => VERIFY_COST_SLH_DSA_SHAKE_256F,
        _ => VERIFY_COST_UNKNOWN_SUITE,
    }
}

/// Weight contribution of a transaction (spec §4.6.5/§4.7.5): non-witness
/// bytes counted in full, witness bytes discounted by
/// `WITNESS_DISCOUNT_DIVISOR`, plus the per-witness-item verification cost
/// (unknown suites priced at the most expensive known suite).
pub fn tx_weight(tx: &Tx) -> u64 {
    let non_witness_bytes = tx_no_witness_bytes(tx).len() as u64;
    let witness_bytes = witness_section_bytes(&tx.witness).len() as u64;
    let verify_cost: u64 = tx
        .witness
        .iter()
        .map(|w| witness_item_verify_cost(w.suite_id))
        .sum();
    non_witness_bytes
        .saturating_mul(WITNESS_DISCOUNT_DIVISOR)
        .saturating_add(witness_bytes)
        .saturating_add(verify_cost)
}

fn check_timelock_spend(
    entry: &UtxoEntry,
    w: &crate::tx::WitnessItem,
    height: u64,
    mtp: u64,
) -> Result<(), TxError> {
    let lock = parse_timelock_covenant_data(&entry.covenant_data)?;
    let met = match lock.mode {
        TimelockMode::Height => height >= lock.lock_value,
        TimelockMode::Time => mtp >= lock.lock_value,
    };
    if !met {
        return Err(TxError::new(
            ErrorCode::TxErrTimelockNotMet,
            "CORE_TIMELOCK lock condition not met",
        ));
    }
    if w.suite_id != SUITE_ID_SENTINEL || !w.pubkey.is_empty() || !w.signature.is_empty() {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "CORE_TIMELOCK spend requires a keyless sentinel witness",
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn apply_non_coinbase_tx_basic_update_with_mtp(
    tx: &Tx,
    txid: [u8; 32],
    utxo_set: &HashMap<Outpoint, UtxoEntry>,
    height: u64,
    block_mtp: u64,
    chain_id: [u8; 32],
    ext_profiles: &CoreExtProfiles,
    provider: &dyn CryptoProvider,
) -> Result<(HashMap<Outpoint, UtxoEntry>, UtxoApplySummary), TxError> {
    if tx.inputs.is_empty() {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "non-coinbase transaction must have at least one input",
        ));
    }

    validate_tx_covenants_genesis(tx, height)?;

    let mut work = utxo_set.clone();
    let mut sum_in: u128 = 0;
    let mut seen_inputs: HashMap<Outpoint, ()> = HashMap::with_capacity(tx.inputs.len());

    if tx.witness.len() != tx.inputs.len() {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "witness count must match input count",
        ));
    }

    for (input_index, input) in tx.inputs.iter().enumerate() {
        if !input.script_sig.is_empty() {
            return Err(TxError::new(
                ErrorCode::TxErrParse,
                "script_sig must be empty on non-coinbase inputs",
            ));
        }
        let op = Outpoint {
            txid: input.prev_txid,
            vout: input.prev_vout,
        };
        if seen_inputs.insert(op.clone(), ()).is_some() {
            return Err(TxError::new(
                ErrorCode::TxErrParse,
                "duplicate input outpoint",
            ));
        }
        let entry = work
            .get(&op)
            .cloned()
            .ok_or_else(|| TxError::new(ErrorCode::TxErrMissingUtxo, "utxo not found"))?;

        if entry.covenant_type == COV_TYPE_ANCHOR {
            return Err(TxError::new(
                ErrorCode::TxErrMissingUtxo,
                "attempt to spend a non-spendable CORE_ANCHOR output",
            ));
        }
        if entry.created_by_coinbase && height < entry.creation_height + COINBASE_MATURITY {
            return Err(TxError::new(
                ErrorCode::TxErrTimelockNotMet,
                "coinbase output not yet mature",
            ));
        }

        let w = &tx.witness[input_index];
        match entry.covenant_type {
            COV_TYPE_P2PK => {
                let digest = sighash_v1_digest(provider, &chain_id, tx, input_index as u32, entry.value)?;
                validate_p2pk_spend(&entry, w, &digest, height, provider)?;
            }
            COV_TYPE_TIMELOCK => {
                check_timelock_spend(&entry, w, height, block_mtp)?;
            }
            COV_TYPE_EXT => {
                let digest = sighash_v1_digest(provider, &chain_id, tx, input_index as u32, entry.value)?;
                validate_core_ext_spend(&entry, w, &digest, height, ext_profiles, provider)?;
            }
            COV_TYPE_VAULT => {
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "CORE_VAULT outputs can never be created, so can never be spent",
                ));
            }
            _ => {
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "unsupported covenant type in utxo entry",
                ))
            }
        }

        sum_in = sum_in
            .checked_add(entry.value as u128)
            .ok_or_else(|| TxError::new(ErrorCode::TxErrValueConservation, "sum_in overflow"))?;
        work.remove(&op);
    }

    let mut sum_out: u128 = 0;
    for (i, out) in tx.outputs.iter().enumerate() {
        sum_out = sum_out
            .checked_add(out.value as u128)
            .ok_or_else(|| TxError::new(ErrorCode::TxErrValueConservation, "sum_out overflow"))?;

        if out.covenant_type == COV_TYPE_ANCHOR {
            continue;
        }
        work.insert(
            Outpoint {
                txid,
                vout: i as u32,
            },
            UtxoEntry {
                value: out.value,
                covenant_type: out.covenant_type,
                covenant_data: out.covenant_data.clone(),
                creation_height: height,
                created_by_coinbase: false,
            },
        );
    }

    if sum_out > sum_in {
        return Err(TxError::new(
            ErrorCode::TxErrValueConservation,
            "sum_out exceeds sum_in",
        ));
    }
    let fee = u64::try_from(sum_in - sum_out)
        .map_err(|_| TxError::new(ErrorCode::TxErrValueConservation, "fee overflows u64"))?;

    let utxo_count = work.len() as u64;
    Ok((work, UtxoApplySummary { fee, utxo_count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TX_KIND_STANDARD, TX_WIRE_VERSION};
    use crate::crypto::test_support::{sign, ToyProvider};
    use crate::hash::sha3_256;
    use crate::tx::{TxInput, TxOutput, WitnessItem};

    fn p2pk_covenant_data(suite_id: u8, key_id: [u8; 32]) -> Vec<u8> {
        let mut d = vec![suite_id];
        d.extend_from_slice(&key_id);
        d
    }

    fn spending_tx(prev_txid: [u8; 32], witness: WitnessItem) -> Tx {
        Tx {
            version: TX_WIRE_VERSION,
            tx_kind: TX_KIND_STANDARD,
            tx_nonce: 1,
            inputs: vec![TxInput {
                prev_txid,
                prev_vout: 0,
                script_sig: Vec::new(),
                sequence: 0,
            }],
            outputs: vec![TxOutput {
                value: 5,
                covenant_type: COV_TYPE_P2PK,
                covenant_data: p2pk_covenant_data(SUITE_ID_ML_DSA_87, [0x44; 32]),
            }],
            locktime: 0,
            da_commit: None,
            da_chunk: None,
            witness: vec![witness],
            da_payload: Vec::new(),
        }
    }

    #[test]
    fn missing_utxo_is_reported() {
        let tx = spending_tx(
            [9; 32],
            WitnessItem {
                suite_id: SUITE_ID_SENTINEL,
                pubkey: Vec::new(),
                signature: Vec::new(),
            },
        );
        let utxo_set = HashMap::new();
        let err = apply_non_coinbase_tx_basic_update_with_mtp(
            &tx,
            [1; 32],
            &utxo_set,
            0,
            0,
            [0; 32],
            &CoreExtProfiles::empty(),
            &ToyProvider,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrMissingUtxo);
    }

    #[test]
    fn valid_p2pk_spend_updates_the_set_and_computes_fee() {
        let pubkey = vec![0x11u8; crate::constants::ML_DSA_87_PUBKEY_BYTES as usize];
        let key_id = sha3_256(&pubkey);
        let prev_txid = [7u8; 32];
        let tx = spending_tx(
            prev_txid,
            WitnessItem {
                suite_id: SUITE_ID_ML_DSA_87,
                pubkey: pubkey.clone(),
                signature: Vec::new(),
            },
        );
        let digest =
            sighash_v1_digest(&ToyProvider, &[0; 32], &tx, 0, 10).unwrap();
        let signature = sign(&pubkey, &digest);
        let tx = spending_tx(
            prev_txid,
            WitnessItem {
                suite_id: SUITE_ID_ML_DSA_87,
                pubkey,
                signature,
            },
        );

        let mut utxo_set = HashMap::new();
        utxo_set.insert(
            Outpoint {
                txid: prev_txid,
                vout: 0,
            },
            UtxoEntry {
                value: 10,
                covenant_type: COV_TYPE_P2PK,
                covenant_data: p2pk_covenant_data(SUITE_ID_ML_DSA_87, key_id),
                creation_height: 0,
                created_by_coinbase: false,
            },
        );

        let (new_set, summary) = apply_non_coinbase_tx_basic_update_with_mtp(
            &tx,
            [2; 32],
            &utxo_set,
            0,
            0,
            [0; 32],
            &CoreExtProfiles::empty(),
            &ToyProvider,
        )
        .unwrap();
        assert_eq!(summary.fee, 5);
        assert!(!new_set.contains_key(&Outpoint {
            txid: prev_txid,
            vout: 0
        }));
        assert!(new_set.contains_key(&Outpoint {
            txid: [2; 32],
            vout: 0
        }));
    }

    #[test]
    fn immature_coinbase_output_is_rejected() {
        let tx = spending_tx(
            [7; 32],
            WitnessItem {
                suite_id: SUITE_ID_SENTINEL,
                pubkey: Vec::new(),
                signature: Vec::new(),
            },
        );
        let mut utxo_set = HashMap::new();
        utxo_set.insert(
            Outpoint {
                txid: [7; 32],
                vout: 0,
            },
            UtxoEntry {
                value: 10,
                covenant_type: COV_TYPE_P2PK,
                covenant_data: p2pk_covenant_data(SUITE_ID_ML_DSA_87, [0; 32]),
                creation_height: 0,
                created_by_coinbase: true,
            },
        );
        let err = apply_non_coinbase_tx_basic_update_with_mtp(
            &tx,
            [2; 32],
            &utxo_set,
            1,
            0,
            [0; 32],
            &CoreExtProfiles::empty(),
            &ToyProvider,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrTimelockNotMet);
    }

    #[test]
    fn spending_an_anchor_output_is_rejected() {
        let tx = spending_tx(
            [7; 32],
            WitnessItem {
                suite_id: SUITE_ID_SENTINEL,
                pubkey: Vec::new(),
                signature: Vec::new(),
            },
        );
        let mut utxo_set = HashMap::new();
        utxo_set.insert(
            Outpoint {
                txid: [7; 32],
                vout: 0,
            },
            UtxoEntry {
                value: 0,
                covenant_type: COV_TYPE_ANCHOR,
                covenant_data: vec![0xaa],
                creation_height: 0,
                created_by_coinbase: false,
            },
        );
        let err = apply_non_coinbase_tx_basic_update_with_mtp(
            &tx,
            [2; 32],
            &utxo_set,
            0,
            0,
            [0; 32],
            &CoreExtProfiles::empty(),
            &ToyProvider,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrMissingUtxo);
    }
}
