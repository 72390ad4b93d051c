//! RUBIN consensus library (wire codec, hashing domains, validation).
//!
//! This crate implements the post-quantum UTXO consensus core: a pure,
//! dependency-injected set of functions with no global mutable state and no
//! I/O. The sole impurity is cryptographic verification, injected through
//! `CryptoProvider` (see `crypto`).
//!
//! Non-consensus policy (networking, storage, mempool, fee estimation) does
//! not belong here.

mod block;
mod block_validate;
mod chainstate_hash;
mod compact_relay;
mod compactsize;
mod constants;
mod core_ext;
mod covenant;
mod crypto;
mod error;
mod featurebits;
mod hash;
mod merkle;
mod pow;
mod sighash;
mod spend;
mod subsidy;
mod tx;
mod utxo;
mod vault;
mod wire;

pub use block::{block_hash, block_header_bytes, parse_block_header_bytes, BlockHeader};
pub use block_validate::{
    median_time_past, parse_block_bytes, validate_block_basic, validate_block_basic_at_height,
    validate_block_basic_with_utxo_at_height, BlockBasicSummary, ParsedBlock,
};
pub use chainstate_hash::utxo_set_hash;
pub use compact_relay::{short_id as compact_short_id, siphash24};
pub use compactsize::{compact_size_len, read_compact_size, write_compact_size};
pub use core_ext::{
    parse_core_ext_covenant_data, validate_core_ext_spend, CoreExtCovenant, CoreExtProfile,
    CoreExtProfiles,
};
pub use covenant::{
    parse_p2pk_covenant_data, parse_timelock_covenant_data, validate_tx_covenants_genesis,
    P2pkCovenant, TimelockCovenant, TimelockMode,
};
pub use crypto::{dispatch_verify, CryptoProvider};
pub use error::{ConsensusResult, ErrorCode, TxError};
pub use featurebits::{
    featurebit_state_at_height_from_window_counts, FeatureBitConfigError, FeatureBitDeployment,
    FeatureBitEval, FeatureBitState,
};
pub use hash::sha3_256;
pub use merkle::{
    merkle_root_txids, witness_commitment_hash, witness_ids_with_coinbase_zeroed,
    witness_merkle_root_wtxids,
};
pub use pow::{chain_work, pow_check, retarget_v1, retarget_v1_clamped, work};
pub use sighash::sighash_v1_digest;
pub use spend::validate_p2pk_spend;
pub use subsidy::block_subsidy;
pub use tx::{
    da_core_fields_bytes, parse_tx, parse_tx_bytes, tx_bytes, tx_no_witness_bytes,
    tx_output_bytes, txid_of, witness_item_bytes, witness_section_bytes, wtxid_of, DaChunkCore,
    DaCommitCore, Tx, TxInput, TxOutput, WitnessItem,
};
pub use utxo::{
    apply_non_coinbase_tx_basic_update_with_mtp, outpoint_key_bytes, tx_weight, Outpoint,
    UtxoApplySummary, UtxoEntry,
};
pub use vault::{parse_vault_covenant_data, VaultCovenant, VaultLockMode};
pub use wire::Reader;

pub const CONSENSUS_REVISION: &str = "v1";
