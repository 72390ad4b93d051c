//! Canonical UTXO-set hash (spec §4.10), used for cross-client chainstate
//! comparison. Permutation-invariant: the result depends only on the set of
//! `(Outpoint, UtxoEntry)` pairs, never on insertion order.

use std::collections::HashMap;

use crate::compactsize::write_compact_size;
use crate::constants::UTXO_SET_HASH_DST;
use crate::crypto::CryptoProvider;
use crate::utxo::{outpoint_key_bytes, Outpoint, UtxoEntry};

pub fn utxo_set_hash(
    provider: &dyn CryptoProvider,
    utxo: &HashMap<Outpoint, UtxoEntry>,
) -> [u8; 32] {
    let mut items: Vec<([u8; 36], &UtxoEntry)> = utxo
        .iter()
        .map(|(op, entry)| (outpoint_key_bytes(op), entry))
        .collect();
    items.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = Vec::with_capacity(UTXO_SET_HASH_DST.len() + 8 + items.len() * 64);
    buf.extend_from_slice(UTXO_SET_HASH_DST);
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());

    for (key, entry) in items {
        buf.extend_from_slice(&key);
        buf.extend_from_slice(&entry.value.to_le_bytes());
        buf.extend_from_slice(&entry.covenant_type.to_le_bytes());
        buf.extend_from_slice(&write_compact_size(entry.covenant_data.len() as u64));
        buf.extend_from_slice(&entry.covenant_data);
        buf.extend_from_slice(&entry.creation_height.to_le_bytes());
        buf.push(u8::from(entry.created_by_coinbase));
    }

    provider.sha3_256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COV_TYPE_P2PK;
    use crate::crypto::test_support::ToyProvider;

    fn entry(value: u64) -> UtxoEntry {
        UtxoEntry {
            value,
            covenant_type: COV_TYPE_P2PK,
            covenant_data: vec![0u8; 33],
            creation_height: 1,
            created_by_coinbase: false,
        }
    }

    #[test]
    fn is_invariant_to_insertion_order() {
        let mut a = HashMap::new();
        a.insert(Outpoint { txid: [1; 32], vout: 0 }, entry(1));
        a.insert(Outpoint { txid: [2; 32], vout: 0 }, entry(2));

        let mut b = HashMap::new();
        b.insert(Outpoint { txid: [2; 32], vout: 0 }, entry(2));
        b.insert(Outpoint { txid: [1; 32], vout: 0 }, entry(1));

        assert_eq!(utxo_set_hash(&ToyProvider, &a), utxo_set_hash(&ToyProvider, &b));
    }

    #[test]
    fn changing_an_entry_changes_the_hash() {
        let mut a = HashMap::new();
        a.insert(Outpoint { txid: [1; 32], vout: 0 }, entry(1));
        let mut b = HashMap::new();
        b.insert(Outpoint { txid: [1; 32], vout: 0 }, entry(2));
        assert_ne!(utxo_set_hash(&ToyProvider, &a), utxo_set_hash(&ToyProvider, &b));
    }

    #[test]
    fn empty_set_hash_is_deterministic() {
        let empty: HashMap<Outpoint, UtxoEntry> = HashMap::new();
        assert_eq!(
            utxo_set_hash(&ToyProvider, &empty),
            utxo_set_hash(&ToyProvider, &empty)
        );
    }
}
