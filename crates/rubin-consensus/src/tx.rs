use crate::compactsize::write_compact_size;
use crate::constants::*;
use crate::error::{ErrorCode, TxError};
use crate::hash::sha3_256;
use crate::wire::Reader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    pub prev_txid: [u8; 32],
    pub prev_vout: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub covenant_type: u16,
    pub covenant_data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessItem {
    pub suite_id: u8,
    pub pubkey: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaCommitCore {
    pub da_id: [u8; 32],
    pub chunk_count: u16,
    pub payload_commitment: [u8; 32],
    pub batch_sig: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaChunkCore {
    pub da_id: [u8; 32],
    pub chunk_index: u16,
    pub chunk_hash: [u8; 32],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    pub version: u32,
    pub tx_kind: u8,
    pub tx_nonce: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
    pub da_commit: Option<DaCommitCore>,
    pub da_chunk: Option<DaChunkCore>,
    pub witness: Vec<WitnessItem>,
    pub da_payload: Vec<u8>,
}

fn parse_witness_item(r: &mut Reader<'_>) -> Result<WitnessItem, TxError> {
    let suite_id = r.read_u8()?;
    let pubkey = r
        .read_compact_bytes(
            MAX_PUBKEY_BYTES,
            TxError::new(ErrorCode::TxErrWitnessOverflow, "pubkey too large"),
        )?
        .to_vec();
    let signature = r
        .read_compact_bytes(
            MAX_SIGNATURE_BYTES,
            TxError::new(ErrorCode::TxErrWitnessOverflow, "signature too large"),
        )?
        .to_vec();

    if suite_id == SUITE_ID_SENTINEL && (!pubkey.is_empty() || !signature.is_empty()) {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "sentinel witness must carry no pubkey or signature bytes",
        ));
    }

    Ok(WitnessItem {
        suite_id,
        pubkey,
        signature,
    })
}

/// Parses a single transaction starting at the reader's current position.
/// Does not require the reader to reach end-of-input — callers parsing a
/// sequence of transactions (block body) drive that check themselves; see
/// `parse_tx_bytes` for the standalone top-level entry point.
pub fn parse_tx(r: &mut Reader<'_>) -> Result<(Tx, [u8; 32], [u8; 32]), TxError> {
    let version = r.read_u32_le()?;
    let tx_kind = r.read_u8()?;
    if !matches!(
        tx_kind,
        TX_KIND_STANDARD | TX_KIND_DA_COMMIT | TX_KIND_DA_CHUNK
    ) {
        return Err(TxError::new(ErrorCode::TxErrParse, "unknown tx_kind"));
    }
    let tx_nonce = r.read_u64_le()?;

    let input_count = r.read_compact_size()?;
    if input_count > MAX_TX_INPUTS {
        return Err(TxError::new(ErrorCode::TxErrParse, "too many inputs"));
    }
    let mut inputs = Vec::with_capacity(input_count as usize);
    for _ in 0..input_count {
        let prev_txid = r.read_fixed::<32>()?;
        let prev_vout = r.read_u32_le()?;
        let script_sig = r
            .read_compact_bytes(
                MAX_SCRIPT_SIG_BYTES,
                TxError::new(ErrorCode::TxErrParse, "script_sig too large"),
            )?
            .to_vec();
        let sequence = r.read_u32_le()?;
        inputs.push(TxInput {
            prev_txid,
            prev_vout,
            script_sig,
            sequence,
        });
    }

    let output_count = r.read_compact_size()?;
    if output_count > MAX_TX_OUTPUTS {
        return Err(TxError::new(ErrorCode::TxErrParse, "too many outputs"));
    }
    let mut outputs = Vec::with_capacity(output_count as usize);
    for _ in 0..output_count {
        let value = r.read_u64_le()?;
        let covenant_type = r.read_u16_le()?;
        let covenant_data = r
            .read_compact_bytes(
                MAX_COVENANT_DATA_PER_OUTPUT,
                TxError::new(ErrorCode::TxErrParse, "covenant_data too large"),
            )?
            .to_vec();
        outputs.push(TxOutput {
            value,
            covenant_type,
            covenant_data,
        });
    }

    let locktime = r.read_u32_le()?;

    let mut da_commit = None;
    let mut da_chunk = None;
    match tx_kind {
        TX_KIND_DA_COMMIT => {
            let da_id = r.read_fixed::<32>()?;
            let chunk_count = r.read_u16_le()?;
            if chunk_count == 0 || chunk_count as u64 > MAX_DA_CHUNK_COUNT as u64 {
                return Err(TxError::new(ErrorCode::TxErrParse, "invalid chunk_count"));
            }
            let payload_commitment = r.read_fixed::<32>()?;
            let batch_sig = r
                .read_compact_bytes(
                    MAX_DA_MANIFEST_BYTES_PER_TX,
                    TxError::new(ErrorCode::TxErrParse, "batch_sig too large"),
                )?
                .to_vec();
            da_commit = Some(DaCommitCore {
                da_id,
                chunk_count,
                payload_commitment,
                batch_sig,
            });
        }
        TX_KIND_DA_CHUNK => {
            let da_id = r.read_fixed::<32>()?;
            let chunk_index = r.read_u16_le()?;
            if chunk_index as u16 >= MAX_DA_CHUNK_COUNT {
                return Err(TxError::new(ErrorCode::TxErrParse, "chunk_index out of range"));
            }
            let chunk_hash = r.read_fixed::<32>()?;
            da_chunk = Some(DaChunkCore {
                da_id,
                chunk_index,
                chunk_hash,
            });
        }
        _ => {}
    }

    let witness_count = r.read_compact_size()?;
    if witness_count > MAX_WITNESS_ITEMS {
        return Err(TxError::new(ErrorCode::TxErrWitnessOverflow, "too many witnesses"));
    }
    let mut witness = Vec::with_capacity(witness_count as usize);
    let mut witness_bytes_total: usize = 0;
    for _ in 0..witness_count {
        let item = parse_witness_item(r)?;
        witness_bytes_total += 1 + item.pubkey.len() + item.signature.len();
        if witness_bytes_total > MAX_WITNESS_BYTES_PER_TX {
            return Err(TxError::new(
                ErrorCode::TxErrWitnessOverflow,
                "witness section exceeds per-tx byte cap",
            ));
        }
        witness.push(item);
    }

    let da_payload_max = match tx_kind {
        TX_KIND_DA_CHUNK => MAX_DA_CHUNK_BYTES,
        _ => 0,
    };
    let da_payload = r
        .read_compact_bytes(
            da_payload_max,
            TxError::new(ErrorCode::TxErrParse, "da_payload exceeds bound"),
        )?
        .to_vec();
    if tx_kind != TX_KIND_DA_CHUNK && !da_payload.is_empty() {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "da_payload must be empty for this tx_kind",
        ));
    }
    if tx_kind == TX_KIND_DA_CHUNK && da_payload.is_empty() {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "DA_CHUNK requires a non-empty payload",
        ));
    }

    let tx = Tx {
        version,
        tx_kind,
        tx_nonce,
        inputs,
        outputs,
        locktime,
        da_commit,
        da_chunk,
        witness,
        da_payload,
    };
    let txid = txid_of(&tx);
    let wtxid = wtxid_of(&tx);

    Ok((tx, txid, wtxid))
}

/// Top-level entry point: parses a single standalone transaction and
/// requires the input to be consumed exactly.
pub fn parse_tx_bytes(b: &[u8]) -> Result<(Tx, [u8; 32], [u8; 32]), TxError> {
    let mut r = Reader::new(b);
    let (tx, txid, wtxid) = parse_tx(&mut r)?;
    if !r.at_end() {
        return Err(TxError::new(ErrorCode::TxErrParse, "trailing bytes after tx"));
    }
    Ok((tx, txid, wtxid))
}

pub fn tx_output_bytes(output: &TxOutput) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&output.value.to_le_bytes());
    out.extend_from_slice(&output.covenant_type.to_le_bytes());
    out.extend_from_slice(&write_compact_size(output.covenant_data.len() as u64));
    out.extend_from_slice(&output.covenant_data);
    out
}

pub fn witness_item_bytes(item: &WitnessItem) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(item.suite_id);
    out.extend_from_slice(&write_compact_size(item.pubkey.len() as u64));
    out.extend_from_slice(&item.pubkey);
    out.extend_from_slice(&write_compact_size(item.signature.len() as u64));
    out.extend_from_slice(&item.signature);
    out
}

pub fn witness_section_bytes(items: &[WitnessItem]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&write_compact_size(items.len() as u64));
    for item in items {
        out.extend_from_slice(&witness_item_bytes(item));
    }
    out
}

/// Canonical serialization of the DA core fields for a given tx_kind; empty
/// for `TX_KIND_STANDARD`. Used both to reconstruct `txid`/`wtxid` and as
/// the `H(da_core_fields_bytes)` sighash component (spec §4.4).
pub fn da_core_fields_bytes(tx: &Tx) -> Vec<u8> {
    match tx.tx_kind {
        TX_KIND_DA_COMMIT => {
            let f = tx
                .da_commit
                .as_ref()
                .expect("DA_COMMIT tx_kind requires da_commit core fields");
            let mut out = Vec::new();
            out.extend_from_slice(&f.da_id);
            out.extend_from_slice(&f.chunk_count.to_le_bytes());
            out.extend_from_slice(&f.payload_commitment);
            out.extend_from_slice(&write_compact_size(f.batch_sig.len() as u64));
            out.extend_from_slice(&f.batch_sig);
            out
        }
        TX_KIND_DA_CHUNK => {
            let f = tx
                .da_chunk
                .as_ref()
                .expect("DA_CHUNK tx_kind requires da_chunk core fields");
            let mut out = Vec::new();
            out.extend_from_slice(&f.da_id);
            out.extend_from_slice(&f.chunk_index.to_le_bytes());
            out.extend_from_slice(&f.chunk_hash);
            out
        }
        _ => Vec::new(),
    }
}

pub fn tx_no_witness_bytes(tx: &Tx) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&tx.version.to_le_bytes());
    out.push(tx.tx_kind);
    out.extend_from_slice(&tx.tx_nonce.to_le_bytes());
    out.extend_from_slice(&write_compact_size(tx.inputs.len() as u64));
    for input in &tx.inputs {
        out.extend_from_slice(&input.prev_txid);
        out.extend_from_slice(&input.prev_vout.to_le_bytes());
        out.extend_from_slice(&write_compact_size(input.script_sig.len() as u64));
        out.extend_from_slice(&input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    out.extend_from_slice(&write_compact_size(tx.outputs.len() as u64));
    for output in &tx.outputs {
        out.extend_from_slice(&tx_output_bytes(output));
    }
    out.extend_from_slice(&tx.locktime.to_le_bytes());
    out.extend_from_slice(&da_core_fields_bytes(tx));
    out
}

pub fn tx_bytes(tx: &Tx) -> Vec<u8> {
    let mut out = tx_no_witness_bytes(tx);
    out.extend_from_slice(&witness_section_bytes(&tx.witness));
    out.extend_from_slice(&write_compact_size(tx.da_payload.len() as u64));
    out.extend_from_slice(&tx.da_payload);
    out
}

pub fn txid_of(tx: &Tx) -> [u8; 32] {
    sha3_256(&tx_no_witness_bytes(tx))
}

pub fn wtxid_of(tx: &Tx) -> [u8; 32] {
    sha3_256(&tx_bytes(tx))
}
