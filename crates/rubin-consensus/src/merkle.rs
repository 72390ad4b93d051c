use crate::constants::{
    MERKLE_TX_LEAF_TAG, MERKLE_TX_NODE_TAG, MERKLE_WITNESS_LEAF_TAG, MERKLE_WITNESS_NODE_TAG,
    WITNESS_COMMITMENT_DST,
};
use crate::error::{ErrorCode, TxError};
use crate::hash::sha3_256;

fn tagged_merkle_root(ids: &[[u8; 32]], leaf_tag: u8, node_tag: u8) -> Result<[u8; 32], TxError> {
    if ids.is_empty() {
        return Err(TxError::new(ErrorCode::TxErrParse, "merkle: empty id list"));
    }

    let mut level: Vec<[u8; 32]> = Vec::with_capacity(ids.len());
    let mut leaf_preimage = [0u8; 1 + 32];
    leaf_preimage[0] = leaf_tag;
    for id in ids {
        leaf_preimage[1..].copy_from_slice(id);
        level.push(sha3_256(&leaf_preimage));
    }

    let mut node_preimage = [0u8; 1 + 32 + 32];
    node_preimage[0] = node_tag;
    while level.len() > 1 {
        let mut next: Vec<[u8; 32]> = Vec::with_capacity(level.len().div_ceil(2));
        let mut i = 0usize;
        while i < level.len() {
            if i == level.len() - 1 {
                // Odd-promotion rule: the trailing element carries forward
                // unchanged, never duplicated.
                next.push(level[i]);
                i += 1;
                continue;
            }
            node_preimage[1..33].copy_from_slice(&level[i]);
            node_preimage[33..].copy_from_slice(&level[i + 1]);
            next.push(sha3_256(&node_preimage));
            i += 2;
        }
        level = next;
    }

    Ok(level[0])
}

/// Tagged Merkle root over ordered transaction ids (`leaf_tag=0x00`,
/// `node_tag=0x01`).
pub fn merkle_root_txids(txids: &[[u8; 32]]) -> Result<[u8; 32], TxError> {
    tagged_merkle_root(txids, MERKLE_TX_LEAF_TAG, MERKLE_TX_NODE_TAG)
}

/// Tagged Merkle root over ordered witness-transaction ids
/// (`leaf_tag=0x02`, `node_tag=0x03`). The caller is responsible for
/// zeroing the coinbase's wtxid slot (index 0) before calling this, to
/// break the self-reference between the witness commitment and the
/// coinbase transaction that carries it.
pub fn witness_merkle_root_wtxids(wtxids: &[[u8; 32]]) -> Result<[u8; 32], TxError> {
    tagged_merkle_root(wtxids, MERKLE_WITNESS_LEAF_TAG, MERKLE_WITNESS_NODE_TAG)
}

/// Builds the list of wtxids to feed `witness_merkle_root_wtxids`, zeroing
/// index 0 (the coinbase slot) per spec.
pub fn witness_ids_with_coinbase_zeroed(wtxids: &[[u8; 32]]) -> Vec<[u8; 32]> {
    let mut out = wtxids.to_vec();
    if let Some(first) = out.first_mut() {
        *first = [0u8; 32];
    }
    out
}

/// The witness commitment embedded in the coinbase's CORE_ANCHOR output:
/// `H("RUBIN-WITNESS/" ‖ witness_merkle_root)`.
pub fn witness_commitment_hash(witness_merkle_root: &[u8; 32]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(WITNESS_COMMITMENT_DST.len() + 32);
    preimage.extend_from_slice(WITNESS_COMMITMENT_DST);
    preimage.extend_from_slice(witness_merkle_root);
    sha3_256(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn empty_input_is_an_error_not_a_zero_hash() {
        let err = merkle_root_txids(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TxErrParse);
    }

    #[test]
    fn single_element_root_is_the_leaf_hash() {
        let root = merkle_root_txids(&[id(1)]).unwrap();
        let mut preimage = vec![MERKLE_TX_LEAF_TAG];
        preimage.extend_from_slice(&id(1));
        assert_eq!(root, sha3_256(&preimage));
    }

    #[test]
    fn odd_element_is_promoted_unchanged_not_duplicated() {
        let three = merkle_root_txids(&[id(1), id(2), id(3)]).unwrap();
        // Manually build the expected tree: level1 = [H(1),H(2),H(3)],
        // level2 = [H(H(1),H(2)), H(3) promoted], root = H(level2[0],level2[1]).
        let l1 = |b: u8| {
            let mut p = vec![MERKLE_TX_LEAF_TAG];
            p.extend_from_slice(&id(b));
            sha3_256(&p)
        };
        let node = |l: [u8; 32], r: [u8; 32]| {
            let mut p = vec![MERKLE_TX_NODE_TAG];
            p.extend_from_slice(&l);
            p.extend_from_slice(&r);
            sha3_256(&p)
        };
        let expected = node(node(l1(1), l1(2)), l1(3));
        assert_eq!(three, expected);
    }

    #[test]
    fn doubling_the_list_changes_the_root() {
        let a = merkle_root_txids(&[id(1), id(2)]).unwrap();
        let b = merkle_root_txids(&[id(1), id(2), id(1), id(2)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tx_and_witness_flavors_use_different_tags() {
        let tx_root = merkle_root_txids(&[id(7)]).unwrap();
        let w_root = witness_merkle_root_wtxids(&[id(7)]).unwrap();
        assert_ne!(tx_root, w_root);
    }

    #[test]
    fn coinbase_slot_zeroing_changes_the_witness_root() {
        let raw = [id(9), id(2), id(3)];
        let zeroed = witness_ids_with_coinbase_zeroed(&raw);
        assert_eq!(zeroed[0], [0u8; 32]);
        assert_ne!(
            witness_merkle_root_wtxids(&raw).unwrap(),
            witness_merkle_root_wtxids(&zeroed).unwrap()
        );
    }
}
