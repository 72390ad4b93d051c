use crate::constants::BLOCK_HEADER_BYTES;
use crate::error::{ErrorCode, TxError};
use crate::hash::sha3_256;
use crate::wire::Reader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: [u8; 32],
    pub merkle_root: [u8; 32],
    pub timestamp: u64,
    pub target: [u8; 32],
    pub nonce: u64,
}

pub fn parse_block_header_bytes(b: &[u8]) -> Result<BlockHeader, TxError> {
    if b.len() != BLOCK_HEADER_BYTES {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "block header length mismatch",
        ));
    }
    let mut r = Reader::new(b);
    let version = r.read_u32_le()?;
    let prev_block_hash = r.read_fixed::<32>()?;
    let merkle_root = r.read_fixed::<32>()?;
    let timestamp = r.read_u64_le()?;
    let target = r.read_fixed::<32>()?;
    let nonce = r.read_u64_le()?;
    debug_assert!(r.at_end());

    Ok(BlockHeader {
        version,
        prev_block_hash,
        merkle_root,
        timestamp,
        target,
        nonce,
    })
}

pub fn block_header_bytes(h: &BlockHeader) -> [u8; BLOCK_HEADER_BYTES] {
    let mut out = [0u8; BLOCK_HEADER_BYTES];
    out[0..4].copy_from_slice(&h.version.to_le_bytes());
    out[4..36].copy_from_slice(&h.prev_block_hash);
    out[36..68].copy_from_slice(&h.merkle_root);
    out[68..76].copy_from_slice(&h.timestamp.to_le_bytes());
    out[76..108].copy_from_slice(&h.target);
    out[108..116].copy_from_slice(&h.nonce.to_le_bytes());
    out
}

pub fn block_hash(header_bytes: &[u8]) -> Result<[u8; 32], TxError> {
    if header_bytes.len() != BLOCK_HEADER_BYTES {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "block hash: invalid header length",
        ));
    }
    Ok(sha3_256(header_bytes))
}
