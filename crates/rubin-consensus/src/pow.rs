//! Proof-of-work check, cumulative chain work, and difficulty retargeting
//! (spec §4.8). All arithmetic is arbitrary-precision (`num-bigint`) over
//! 256-bit big-endian byte arrays — the one corner of the core where
//! fixed-width integers would silently overflow.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::block::block_hash;
use crate::constants::{BLOCK_HEADER_BYTES, POW_LIMIT, TARGET_BLOCK_INTERVAL, WINDOW_SIZE};
use crate::error::{ErrorCode, TxError};

fn pow_limit() -> BigUint {
    BigUint::from_bytes_be(&POW_LIMIT)
}

fn biguint_to_bytes32(x: &BigUint) -> Result<[u8; 32], TxError> {
    let b = x.to_bytes_be();
    if b.len() > 32 {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "retargeted value overflows 256 bits",
        ));
    }
    let mut out = [0u8; 32];
    out[32 - b.len()..].copy_from_slice(&b);
    Ok(out)
}

/// `work(target) = floor(2^256 / target)`. Rejects a zero or
/// above-`POW_LIMIT` target.
pub fn work(target: &[u8; 32]) -> Result<BigUint, TxError> {
    let t = BigUint::from_bytes_be(target);
    if t.is_zero() {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "work: target is zero",
        ));
    }
    if t > pow_limit() {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "work: target above POW_LIMIT",
        ));
    }
    let two256: BigUint = BigUint::one() << 256usize;
    Ok(two256 / t)
}

/// Sum of per-block work along a chain of targets.
pub fn chain_work(targets: &[[u8; 32]]) -> Result<BigUint, TxError> {
    let mut total = BigUint::zero();
    for t in targets {
        total += work(t)?;
    }
    Ok(total)
}

/// Verifies a block's header hash against its declared target: `target`
/// must lie in `(0, POW_LIMIT]`, and the header hash, read as a big-endian
/// 256-bit integer, must be strictly less than it.
pub fn pow_check(header_bytes: &[u8], target: [u8; 32]) -> Result<(), TxError> {
    if header_bytes.len() != BLOCK_HEADER_BYTES {
        return Err(TxError::new(
            ErrorCode::BlockErrParse,
            "pow_check: header has the wrong length",
        ));
    }
    let target_bi = BigUint::from_bytes_be(&target);
    if target_bi.is_zero() || target_bi > pow_limit() {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "target out of range",
        ));
    }
    let h = block_hash(header_bytes)?;
    if BigUint::from_bytes_be(&h) >= target_bi {
        return Err(TxError::new(ErrorCode::BlockErrPowInvalid, "hash does not meet target"));
    }
    Ok(())
}

fn t_expected() -> Result<u64, TxError> {
    TARGET_BLOCK_INTERVAL
        .checked_mul(WINDOW_SIZE)
        .ok_or_else(|| TxError::new(ErrorCode::BlockErrTargetInvalid, "T_expected overflows u64"))
}

fn clamp_target(t_new: BigUint, t_old: &BigUint) -> BigUint {
    let mut lower = t_old >> 2;
    if lower < BigUint::one() {
        lower = BigUint::one();
    }
    let upper = core::cmp::min(t_old << 2, pow_limit());
    if t_new < lower {
        lower
    } else if t_new > upper {
        upper
    } else {
        t_new
    }
}

/// Standard retarget: `T_actual` is the raw span between the window's first
/// and last timestamps, clamped to `[T_expected/4, T_expected*4]`.
pub fn retarget_v1(
    target_old: [u8; 32],
    timestamp_first: u64,
    timestamp_last: u64,
) -> Result<[u8; 32], TxError> {
    let t_old = BigUint::from_bytes_be(&target_old);
    if t_old.is_zero() || t_old > pow_limit() {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "retarget: target_old out of range",
        ));
    }

    let t_actual_raw = timestamp_last.saturating_sub(timestamp_first).max(1);
    let expected = t_expected()?;
    let clamped_low = expected / 4;
    let clamped_high = expected.saturating_mul(4);
    let t_actual = t_actual_raw.clamp(clamped_low.max(1), clamped_high);

    let t_new = (&t_old * BigUint::from(t_actual)) / BigUint::from(expected);
    biguint_to_bytes32(&clamp_target(t_new, &t_old))
}

/// Clamped retarget variant: bounds the contribution of each individual
/// inter-block interval to `[TARGET_BLOCK_INTERVAL/4, TARGET_BLOCK_INTERVAL*4]`
/// before summing, so a single manipulated timestamp near the end of the
/// window cannot dominate `T_actual` the way it can in `retarget_v1`.
/// Equivalently `[T_expected/(4*WINDOW_SIZE), T_expected*4/WINDOW_SIZE]`,
/// since `T_expected == TARGET_BLOCK_INTERVAL * WINDOW_SIZE`.
pub fn retarget_v1_clamped(target_old: [u8; 32], timestamps: &[u64]) -> Result<[u8; 32], TxError> {
    let t_old = BigUint::from_bytes_be(&target_old);
    if t_old.is_zero() || t_old > pow_limit() {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "retarget: target_old out of range",
        ));
    }
    if timestamps.len() < 2 {
        return Err(TxError::new(
            ErrorCode::BlockErrTargetInvalid,
            "retarget: need at least two timestamps",
        ));
    }

    let per_step_low = TARGET_BLOCK_INTERVAL / 4;
    let per_step_high = TARGET_BLOCK_INTERVAL.saturating_mul(4);
    let mut t_actual: u64 = 0;
    for pair in timestamps.windows(2) {
        let delta = pair[1].saturating_sub(pair[0]).max(1);
        let clamped = delta.clamp(per_step_low.max(1), per_step_high);
        t_actual = t_actual.saturating_add(clamped);
    }

    let expected = t_expected()?;
    let t_new = (&t_old * BigUint::from(t_actual)) / BigUint::from(expected);
    biguint_to_bytes32(&clamp_target(t_new, &t_old))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{block_header_bytes, BlockHeader};

    #[test]
    fn work_is_inversely_proportional_to_target() {
        let small_target = [0x00; 31]
            .iter()
            .copied()
            .chain(std::iter::once(0x01))
            .collect::<Vec<_>>();
        let mut small = [0u8; 32];
        small.copy_from_slice(&small_target);
        let mut large = [0u8; 32];
        large[0] = 0x7f;
        for b in large.iter_mut().skip(1) {
            *b = 0xff;
        }
        assert!(work(&small).unwrap() > work(&large).unwrap());
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(work(&[0u8; 32]).is_err());
    }

    #[test]
    fn above_pow_limit_target_is_rejected() {
        let mut above = [0xffu8; 32];
        above[0] = 0xff;
        assert!(work(&above).is_err());
    }

    fn mined_header(target: [u8; 32]) -> (BlockHeader, [u8; BLOCK_HEADER_BYTES]) {
        for nonce in 0u64..100_000 {
            let h = BlockHeader {
                version: 1,
                prev_block_hash: [0; 32],
                merkle_root: [0; 32],
                timestamp: 0,
                target,
                nonce,
            };
            let bytes = block_header_bytes(&h);
            if pow_check(&bytes, target).is_ok() {
                return (h, bytes);
            }
        }
        panic!("failed to mine a header under test target");
    }

    #[test]
    fn pow_check_accepts_a_mined_header_and_rejects_wrong_target() {
        let target = POW_LIMIT;
        let (_h, bytes) = mined_header(target);
        pow_check(&bytes, target).unwrap();
        let err = pow_check(&bytes, [0u8; 32]).unwrap_err();
        assert_eq!(err.code, ErrorCode::BlockErrTargetInvalid);
    }

    #[test]
    fn retarget_clamps_extreme_intervals() {
        let old = POW_LIMIT;
        let below = retarget_v1(old, 0, 1).unwrap();
        // T_actual collapses to the floor, so the new target shrinks toward
        // old_target/4, never all the way to zero.
        assert_ne!(below, [0u8; 32]);
    }

    #[test]
    fn retarget_is_unchanged_when_actual_matches_expected() {
        let old = {
            let mut t = [0u8; 32];
            t[0] = 0x01;
            t
        };
        let expected = t_expected().unwrap();
        let same = retarget_v1(old, 0, expected).unwrap();
        assert_eq!(same, old);
    }

    #[test]
    fn clamped_retarget_bounds_a_single_huge_step() {
        let old = {
            let mut t = [0u8; 32];
            t[0] = 0x01;
            t
        };
        let mut timestamps = vec![0u64; (WINDOW_SIZE + 1) as usize];
        for (i, ts) in timestamps.iter_mut().enumerate() {
            *ts = i as u64 * TARGET_BLOCK_INTERVAL;
        }
        let last = timestamps.len() - 1;
        timestamps[last] = timestamps[last - 1] + TARGET_BLOCK_INTERVAL * 1_000_000;
        let retargeted = retarget_v1_clamped(old, &timestamps).unwrap();
        // The unclamped variant would blow the target out to POW_LIMIT; the
        // clamped one keeps it within 4x of old_target.
        let new_t = BigUint::from_bytes_be(&retargeted);
        let old_t = BigUint::from_bytes_be(&old);
        assert!(new_t <= &old_t << 2);
    }
}
