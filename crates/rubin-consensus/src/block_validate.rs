//! Block structural and UTXO-aware validation (spec §4.7). Three layered
//! entry points share one parse-and-check core: `validate_block_basic` is a
//! height-0, structural-only convenience wrapper, `validate_block_basic_at_height`
//! adds height-gated structural checks (suite activation, coinbase
//! locktime), and `validate_block_basic_with_utxo_at_height` additionally
//! replays every non-coinbase transaction against a caller-supplied UTXO
//! set and enforces the coinbase value bound against the resulting fees.

use std::collections::HashMap;

use crate::block::{block_hash, parse_block_header_bytes, BlockHeader};
use crate::constants::BLOCK_HEADER_BYTES;
use crate::constants::{
    COV_TYPE_ANCHOR, MAX_ANCHOR_BYTES_PER_BLOCK, MAX_BLOCK_WEIGHT, SLH_DSA_ACTIVATION_HEIGHT,
    SUITE_ID_SLH_DSA_SHAKE_256F, TX_COINBASE_PREVOUT_VOUT,
};
use crate::core_ext::CoreExtProfiles;
use crate::covenant::validate_tx_covenants_genesis;
use crate::crypto::CryptoProvider;
use crate::error::{ErrorCode, TxError};
use crate::merkle::{
    merkle_root_txids, witness_commitment_hash, witness_ids_with_coinbase_zeroed,
    witness_merkle_root_wtxids,
};
use crate::pow::pow_check;
use crate::subsidy::block_subsidy;
use crate::tx::{parse_tx, Tx};
use crate::utxo::{apply_non_coinbase_tx_basic_update_with_mtp, tx_weight, Outpoint, UtxoEntry};
use crate::wire::Reader;

#[derive(Clone, Debug)]
pub struct ParsedBlock {
    pub header: BlockHeader,
    pub header_bytes: [u8; BLOCK_HEADER_BYTES],
    pub tx_count: u64,
    pub txs: Vec<Tx>,
    pub txids: Vec<[u8; 32]>,
    pub wtxids: Vec<[u8; 32]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockBasicSummary {
    pub tx_count: u64,
    pub sum_weight: u64,
    pub sum_anchor_bytes: u64,
    pub block_hash: [u8; 32],
}

pub fn parse_block_bytes(block_bytes: &[u8]) -> Result<ParsedBlock, TxError> {
    if block_bytes.len() < BLOCK_HEADER_BYTES + 1 {
        return Err(TxError::new(ErrorCode::BlockErrParse, "block too short"));
    }

    let mut header_bytes = [0u8; BLOCK_HEADER_BYTES];
    header_bytes.copy_from_slice(&block_bytes[..BLOCK_HEADER_BYTES]);
    let header = parse_block_header_bytes(&header_bytes)?;

    let mut r = Reader::new(&block_bytes[BLOCK_HEADER_BYTES..]);
    let tx_count = r.read_compact_size()?;
    if tx_count == 0 {
        return Err(TxError::new(ErrorCode::BlockErrParse, "empty block tx list"));
    }

    let mut txs: Vec<Tx> = Vec::new();
    let mut txids: Vec<[u8; 32]> = Vec::new();
    let mut wtxids: Vec<[u8; 32]> = Vec::new();

    for _ in 0..tx_count {
        let (tx, txid, wtxid) = parse_tx(&mut r)?;
        txs.push(tx);
        txids.push(txid);
        wtxids.push(wtxid);
    }

    if !r.at_end() {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "trailing bytes after tx list",
        ));
    }

    Ok(ParsedBlock {
        header,
        header_bytes,
        tx_count,
        txs,
        txids,
        wtxids,
    })
}

fn is_coinbase_tx(tx: &Tx) -> bool {
    if tx.tx_kind != crate::constants::TX_KIND_STANDARD
        || tx.tx_nonce != 0
        || tx.inputs.len() != 1
        || !tx.witness.is_empty()
        || !tx.da_payload.is_empty()
    {
        return false;
    }
    let input = &tx.inputs[0];
    input.prev_txid == [0u8; 32]
        && input.prev_vout == TX_COINBASE_PREVOUT_VOUT
        && input.script_sig.is_empty()
        && input.sequence == TX_COINBASE_PREVOUT_VOUT
}

fn validate_coinbase_structure(pb: &ParsedBlock, block_height: u64) -> Result<(), TxError> {
    let coinbase = pb
        .txs
        .first()
        .ok_or_else(|| TxError::new(ErrorCode::BlockErrParse, "missing coinbase"))?;
    if !is_coinbase_tx(coinbase) {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "first tx is not a canonical coinbase",
        ));
    }
    let expected_locktime = u32::try_from(block_height)
        .map_err(|_| TxError::new(ErrorCode::BlockErrParse, "block height out of range"))?;
    if coinbase.locktime != expected_locktime {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "coinbase locktime must equal block height",
        ));
    }
    for tx in &pb.txs[1..] {
        if is_coinbase_tx(tx) {
            return Err(TxError::new(
                ErrorCode::BlockErrParse,
                "coinbase-shaped tx found outside index 0",
            ));
        }
    }
    Ok(())
}

fn validate_witness_suite_activation(tx: &Tx, block_height: u64) -> Result<(), TxError> {
    for w in &tx.witness {
        if w.suite_id == SUITE_ID_SLH_DSA_SHAKE_256F && block_height < SLH_DSA_ACTIVATION_HEIGHT {
            return Err(TxError::new(
                ErrorCode::TxErrSigAlgInvalid,
                "SLH-DSA suite inactive at this height",
            ));
        }
    }
    Ok(())
}

fn validate_coinbase_witness_commitment(pb: &ParsedBlock) -> Result<(), TxError> {
    let zeroed = witness_ids_with_coinbase_zeroed(&pb.wtxids);
    let wroot = witness_merkle_root_wtxids(&zeroed)?;
    let expected = witness_commitment_hash(&wroot);

    let coinbase = &pb.txs[0];
    let mut matches = 0u64;
    for out in &coinbase.outputs {
        if out.covenant_type == COV_TYPE_ANCHOR && out.covenant_data.as_slice() == expected {
            matches += 1;
        }
    }
    if matches != 1 {
        return Err(TxError::new(
            ErrorCode::BlockErrMerkleInvalid,
            "coinbase witness commitment missing or duplicated",
        ));
    }
    Ok(())
}

fn sum_anchor_bytes(tx: &Tx) -> Result<u64, TxError> {
    let mut total: u64 = 0;
    for out in &tx.outputs {
        if out.covenant_type == COV_TYPE_ANCHOR {
            total = total
                .checked_add(out.covenant_data.len() as u64)
                .ok_or_else(|| TxError::new(ErrorCode::BlockErrAnchorBytesExceeded, "overflow"))?;
        }
    }
    Ok(total)
}

fn validate_block_structure(
    block_bytes: &[u8],
    expected_prev_hash: Option<[u8; 32]>,
    expected_target: Option<[u8; 32]>,
    block_height: u64,
) -> Result<(ParsedBlock, BlockBasicSummary), TxError> {
    let pb = parse_block_bytes(block_bytes)?;
    validate_coinbase_structure(&pb, block_height)?;

    pow_check(&pb.header_bytes, pb.header.target)?;

    if let Some(prev) = expected_prev_hash {
        if pb.header.prev_block_hash != prev {
            return Err(TxError::new(
                ErrorCode::BlockErrLinkageInvalid,
                "prev_block_hash mismatch",
            ));
        }
    }
    if let Some(target) = expected_target {
        if pb.header.target != target {
            return Err(TxError::new(
                ErrorCode::BlockErrTargetInvalid,
                "target mismatch",
            ));
        }
    }

    let root = merkle_root_txids(&pb.txids)?;
    if root != pb.header.merkle_root {
        return Err(TxError::new(
            ErrorCode::BlockErrMerkleInvalid,
            "merkle_root mismatch",
        ));
    }
    validate_coinbase_witness_commitment(&pb)?;

    let mut sum_weight: u64 = 0;
    let mut sum_anchor: u64 = 0;
    for tx in &pb.txs {
        validate_witness_suite_activation(tx, block_height)?;
        validate_tx_covenants_genesis(tx, block_height)?;
        sum_weight = sum_weight
            .checked_add(tx_weight(tx))
            .ok_or_else(|| TxError::new(ErrorCode::BlockErrWeightExceeded, "weight overflow"))?;
        sum_anchor = sum_anchor
            .checked_add(sum_anchor_bytes(tx)?)
            .ok_or_else(|| TxError::new(ErrorCode::BlockErrAnchorBytesExceeded, "overflow"))?;
    }
    if sum_weight > MAX_BLOCK_WEIGHT {
        return Err(TxError::new(
            ErrorCode::BlockErrWeightExceeded,
            "block weight exceeds MAX_BLOCK_WEIGHT",
        ));
    }
    if sum_anchor > MAX_ANCHOR_BYTES_PER_BLOCK {
        return Err(TxError::new(
            ErrorCode::BlockErrAnchorBytesExceeded,
            "anchor bytes exceed MAX_ANCHOR_BYTES_PER_BLOCK",
        ));
    }

    let h = block_hash(&pb.header_bytes)?;
    let summary = BlockBasicSummary {
        tx_count: pb.tx_count,
        sum_weight,
        sum_anchor_bytes: sum_anchor,
        block_hash: h,
    };
    Ok((pb, summary))
}

/// Structural-only validation at an implicit height of 0.
pub fn validate_block_basic(
    block_bytes: &[u8],
    expected_prev_hash: Option<[u8; 32]>,
    expected_target: Option<[u8; 32]>,
) -> Result<BlockBasicSummary, TxError> {
    validate_block_basic_at_height(block_bytes, expected_prev_hash, expected_target, 0)
}

/// Structural-only validation (step 6 of §4.7 skipped, as if the caller
/// passed a nil UTXO-set view).
pub fn validate_block_basic_at_height(
    block_bytes: &[u8],
    expected_prev_hash: Option<[u8; 32]>,
    expected_target: Option<[u8; 32]>,
    block_height: u64,
) -> Result<BlockBasicSummary, TxError> {
    let (_pb, summary) =
        validate_block_structure(block_bytes, expected_prev_hash, expected_target, block_height)?;
    Ok(summary)
}

/// Full validation: structural checks plus step 6 of §4.7, replaying every
/// non-coinbase transaction against `utxo_set` and enforcing the coinbase
/// value bound against the resulting fee total.
#[allow(clippy::too_many_arguments)]
pub fn validate_block_basic_with_utxo_at_height(
    block_bytes: &[u8],
    expected_prev_hash: Option<[u8; 32]>,
    expected_target: Option<[u8; 32]>,
    block_height: u64,
    utxo_set: &HashMap<Outpoint, UtxoEntry>,
    chain_id: [u8; 32],
    block_mtp: u64,
    already_generated: u64,
    ext_profiles: &CoreExtProfiles,
    provider: &dyn CryptoProvider,
) -> Result<(BlockBasicSummary, HashMap<Outpoint, UtxoEntry>), TxError> {
    let (pb, summary) =
        validate_block_structure(block_bytes, expected_prev_hash, expected_target, block_height)?;

    let mut work = utxo_set.clone();
    let mut sum_fees: u128 = 0;
    for (tx, txid) in pb.txs[1..].iter().zip(pb.txids[1..].iter()) {
        let (next, applied) = apply_non_coinbase_tx_basic_update_with_mtp(
            tx,
            *txid,
            &work,
            block_height,
            block_mtp,
            chain_id,
            ext_profiles,
            provider,
        )?;
        work = next;
        sum_fees = sum_fees
            .checked_add(applied.fee as u128)
            .ok_or_else(|| TxError::new(ErrorCode::TxErrValueConservation, "fee sum overflow"))?;
    }

    if block_height > 0 {
        let coinbase = &pb.txs[0];
        let mut sum_coinbase: u128 = 0;
        for out in &coinbase.outputs {
            sum_coinbase = sum_coinbase
                .checked_add(out.value as u128)
                .ok_or_else(|| TxError::new(ErrorCode::BlockErrWeightExceeded, "overflow"))?;
        }
        let subsidy = block_subsidy(block_height, already_generated);
        let limit = (subsidy as u128).checked_add(sum_fees).ok_or_else(|| {
            TxError::new(ErrorCode::BlockErrWeightExceeded, "subsidy+fees overflow")
        })?;
        if sum_coinbase > limit {
            return Err(TxError::new(
                ErrorCode::BlockErrWeightExceeded,
                "coinbase outputs exceed subsidy+fees bound",
            ));
        }
    }

    for (i, out) in pb.txs[0].outputs.iter().enumerate() {
        if out.covenant_type == COV_TYPE_ANCHOR {
            continue;
        }
        work.insert(
            Outpoint {
                txid: pb.txids[0],
                vout: i as u32,
            },
            UtxoEntry {
                value: out.value,
                covenant_type: out.covenant_type,
                covenant_data: out.covenant_data.clone(),
                creation_height: block_height,
                created_by_coinbase: true,
            },
        );
    }

    Ok((summary, work))
}

/// Median of up to the last `MEDIAN_TIME_PAST_WINDOW` block timestamps,
/// used as the `mtp` input to TIMELOCK time-mode checks (§4.6 step 4). The
/// genesis block (height 0) has no predecessor window.
pub fn median_time_past(block_height: u64, prev_timestamps: Option<&[u64]>) -> Option<u64> {
    if block_height == 0 {
        return None;
    }
    let prev = prev_timestamps?;
    if prev.is_empty() {
        return None;
    }
    let k = prev.len().min(crate::constants::MEDIAN_TIME_PAST_WINDOW);
    let mut window = prev[prev.len() - k..].to_vec();
    window.sort_unstable();
    Some(window[(window.len() - 1) / 2])
}
