//! Per-input signature-hash digest (spec §4.4). The preimage binds the
//! chain, the whole transaction shape, and the specific input being spent,
//! so a signature over it cannot be replayed against a different input,
//! transaction, or chain.

use crate::constants::SIGHASH_DST;
use crate::crypto::CryptoProvider;
use crate::error::{ErrorCode, TxError};
use crate::tx::{da_core_fields_bytes, tx_output_bytes, Tx};

pub fn sighash_v1_digest(
    provider: &dyn CryptoProvider,
    chain_id: &[u8; 32],
    tx: &Tx,
    input_index: u32,
    input_value: u64,
) -> Result<[u8; 32], TxError> {
    let input_index_usize = usize::try_from(input_index)
        .map_err(|_| TxError::new(ErrorCode::TxErrParse, "input_index overflows usize"))?;
    let input = tx
        .inputs
        .get(input_index_usize)
        .ok_or_else(|| TxError::new(ErrorCode::TxErrParse, "input_index out of bounds"))?;

    let mut prevouts = Vec::new();
    for i in &tx.inputs {
        prevouts.extend_from_slice(&i.prev_txid);
        prevouts.extend_from_slice(&i.prev_vout.to_le_bytes());
    }
    let hash_of_all_prevouts = provider.sha3_256(&prevouts);

    let mut sequences = Vec::new();
    for i in &tx.inputs {
        sequences.extend_from_slice(&i.sequence.to_le_bytes());
    }
    let hash_of_all_sequences = provider.sha3_256(&sequences);

    let mut outputs_bytes = Vec::new();
    for output in &tx.outputs {
        outputs_bytes.extend_from_slice(&tx_output_bytes(output));
    }
    let hash_of_all_outputs = provider.sha3_256(&outputs_bytes);

    let hash_of_da_core = provider.sha3_256(&da_core_fields_bytes(tx));

    let mut preimage = Vec::new();
    preimage.extend_from_slice(SIGHASH_DST);
    preimage.extend_from_slice(chain_id);
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.push(tx.tx_kind);
    preimage.extend_from_slice(&tx.tx_nonce.to_le_bytes());
    preimage.extend_from_slice(&hash_of_da_core);
    preimage.extend_from_slice(&hash_of_all_prevouts);
    preimage.extend_from_slice(&hash_of_all_sequences);
    preimage.extend_from_slice(&input_index.to_le_bytes());
    preimage.extend_from_slice(&input.prev_txid);
    preimage.extend_from_slice(&input.prev_vout.to_le_bytes());
    preimage.extend_from_slice(&input_value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_of_all_outputs);
    preimage.extend_from_slice(&tx.locktime.to_le_bytes());

    Ok(provider.sha3_256(&preimage))
}
