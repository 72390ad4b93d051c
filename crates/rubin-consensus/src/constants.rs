//! Protocol constants. These are fixed at compile time and never read from
//! configuration: two nodes with different values for any of these would
//! disagree about validity and fork the chain.

pub const TX_WIRE_VERSION: u32 = 2;
pub const BLOCK_WIRE_VERSION: u32 = 1;
pub const BLOCK_HEADER_BYTES: usize = 116;

/// Sentinel `prev_vout` (and coinbase `sequence`) value identifying the
/// coinbase input.
pub const TX_COINBASE_PREVOUT_VOUT: u32 = u32::MAX;

pub const TX_KIND_STANDARD: u8 = 0x00;
pub const TX_KIND_DA_COMMIT: u8 = 0x01;
pub const TX_KIND_DA_CHUNK: u8 = 0x02;

pub const WITNESS_DISCOUNT_DIVISOR: u64 = 4;

pub const MAX_TX_INPUTS: u64 = 1024;
pub const MAX_TX_OUTPUTS: u64 = 1024;
pub const MAX_WITNESS_ITEMS: u64 = 1024;
pub const MAX_WITNESS_BYTES_PER_TX: usize = 100_000;
pub const MAX_SCRIPT_SIG_BYTES: u64 = 32;
pub const MAX_SIGNATURE_BYTES: u64 = 49_856;
pub const MAX_PUBKEY_BYTES: u64 = 4_096;

// --- Signature suites -------------------------------------------------

pub const SUITE_ID_SENTINEL: u8 = 0x00;
pub const SUITE_ID_ML_DSA_87: u8 = 0x01;
pub const SUITE_ID_SLH_DSA_SHAKE_256F: u8 = 0x02;

pub const ML_DSA_87_PUBKEY_BYTES: u64 = 2592;
pub const ML_DSA_87_SIG_BYTES: u64 = 4627;

pub const SLH_DSA_SHAKE_256F_PUBKEY_BYTES: u64 = 64;
pub const MAX_SLH_DSA_SIG_BYTES: u64 = 49_856;

/// Height at which SLH-DSA-SHAKE-256f witnesses become acceptable. Below
/// this height every SLH-DSA witness is `TX_ERR_SIG_ALG_INVALID`. Resolves
/// the spec's Open Question: implementers must use this declared value
/// rather than guessing.
pub const SLH_DSA_ACTIVATION_HEIGHT: u64 = 210_000;

/// Verification-cost weight units charged for a suite id the parser
/// accepted but does not recognize. Chosen to be the most expensive known
/// suite's cost, so an attacker cannot under-price unknown-suite spam
/// relative to a real heavyweight signature.
pub const VERIFY_COST_UNKNOWN_SUITE: u64 = VERIFY_COST_SLH_DSA_SHAKE_256F;
pub const VERIFY_COST_ML_DSA_87: u64 = 200;
pub const VERIFY_COST_SLH_DSA_SHAKE_256F: u64 = 2_000;

// --- Covenant types -----------------------------------------------------

pub const COV_TYPE_P2PK: u16 = 0x0000;
pub const COV_TYPE_TIMELOCK: u16 = 0x0001;
pub const COV_TYPE_ANCHOR: u16 = 0x0002;
pub const COV_TYPE_VAULT: u16 = 0x0003;
pub const COV_TYPE_EXT: u16 = 0x0100;
pub const COV_TYPE_RESERVED_FUTURE: u16 = 0xffff;

pub const MAX_COVENANT_DATA_PER_OUTPUT: u64 = 8_192;
pub const MAX_ANCHOR_PAYLOAD_SIZE: u64 = 80;
pub const MAX_ANCHOR_BYTES_PER_BLOCK: u64 = 4_096;

/// Fixed P2PK covenant_data length: 1 suite-id byte + 32-byte key id.
pub const P2PK_COVENANT_DATA_LEN: u64 = 33;

/// Fixed TIMELOCK covenant_data length: 1 lock_mode byte + 8-byte LE lock
/// value.
pub const TIMELOCK_COVENANT_DATA_LEN: u64 = 9;
pub const TIMELOCK_MODE_HEIGHT: u8 = 0x00;
pub const TIMELOCK_MODE_TIME: u8 = 0x01;

/// Extended VAULT covenant_data length: owner_key(32) + recovery_key(32) +
/// spend_delay(u32 LE, 4) + lock_mode(1).
pub const VAULT_COVENANT_DATA_LEN: u64 = 69;
pub const MIN_VAULT_SPEND_DELAY: u32 = 144;

// --- DA (data-availability) transaction kinds ---------------------------

pub const MAX_DA_MANIFEST_BYTES_PER_TX: u64 = 65_536;
pub const MAX_DA_CHUNK_COUNT: u16 = 4_096;
pub const MAX_DA_CHUNK_BYTES: u64 = 16_384;

// --- Block-level resource bounds ----------------------------------------

pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

// --- PoW / retarget -------------------------------------------------------

/// `2^256 - 1`-derived ceiling target (genesis difficulty floor), expressed
/// as 32 big-endian bytes with the top byte masked so `POW_LIMIT <=
/// 2^255 - 1`, keeping all arithmetic comfortably inside `BigUint` without
/// surprising edge cases at the full 256-bit ceiling.
pub const POW_LIMIT: [u8; 32] = {
    let mut b = [0xffu8; 32];
    b[0] = 0x7f;
    b
};

pub const TARGET_BLOCK_INTERVAL: u64 = 600;
pub const WINDOW_SIZE: u64 = 2016;
pub const MAX_FUTURE_DRIFT: u64 = 2 * 60 * 60;
pub const MEDIAN_TIME_PAST_WINDOW: usize = 11;

// --- Subsidy / emission ---------------------------------------------------

pub const MINEABLE_CAP: u64 = 21_000_000_0000_0000; // 21M units at 1e8 precision
pub const EMISSION_SPEED_FACTOR: u32 = 20;
pub const TAIL_EMISSION_PER_BLOCK: u64 = 100_000; // 0.001 unit at 1e8 precision
pub const COINBASE_MATURITY: u64 = 100;

// --- Feature-bit deployments ----------------------------------------------

pub const SIGNAL_WINDOW: u64 = 2016;
pub const SIGNAL_THRESHOLD: u32 = 1815; // ~90% of SIGNAL_WINDOW

// --- Chainstate hash / compact relay domain tags --------------------------

pub const UTXO_SET_HASH_DST: &[u8] = b"RUBINv1-utxo-set-hash/";
pub const SIGHASH_DST: &[u8] = b"RUBINv1-sighash/";
pub const WITNESS_COMMITMENT_DST: &[u8] = b"RUBIN-WITNESS/";

pub const MERKLE_TX_LEAF_TAG: u8 = 0x00;
pub const MERKLE_TX_NODE_TAG: u8 = 0x01;
pub const MERKLE_WITNESS_LEAF_TAG: u8 = 0x02;
pub const MERKLE_WITNESS_NODE_TAG: u8 = 0x03;
