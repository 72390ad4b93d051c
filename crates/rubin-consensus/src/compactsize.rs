use crate::error::{ErrorCode, TxError};

/// Decodes a `CompactSize` integer from the front of `b`, returning the
/// value and the number of bytes consumed. Rejects non-minimal encodings:
/// the value must not be representable in a shorter form.
pub fn read_compact_size(b: &[u8]) -> Result<(u64, usize), TxError> {
    let tag = *b
        .first()
        .ok_or_else(|| TxError::new(ErrorCode::TxErrParse, "unexpected EOF (compact size tag)"))?;

    let read_n = |n: usize| -> Result<&[u8], TxError> {
        b.get(1..1 + n)
            .ok_or_else(|| TxError::new(ErrorCode::TxErrParse, "unexpected EOF (compact size)"))
    };

    let (v, consumed, minimal_ok) = match tag {
        0x00..=0xfc => (tag as u64, 1, true),
        0xfd => {
            let s = read_n(2)?;
            let v = u16::from_le_bytes([s[0], s[1]]) as u64;
            (v, 3, v >= 0xfd)
        }
        0xfe => {
            let s = read_n(4)?;
            let v = u32::from_le_bytes([s[0], s[1], s[2], s[3]]) as u64;
            (v, 5, v > 0xffff)
        }
        0xff => {
            let s = read_n(8)?;
            let v = u64::from_le_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]]);
            (v, 9, v > 0xffff_ffff)
        }
    };

    if !minimal_ok {
        return Err(TxError::new(
            ErrorCode::TxErrParse,
            "non-minimal CompactSize",
        ));
    }

    Ok((v, consumed))
}

/// Encodes `n` as the shortest possible `CompactSize` form.
pub fn write_compact_size(n: u64) -> Vec<u8> {
    if n < 0xfd {
        vec![n as u8]
    } else if n <= 0xffff {
        let mut out = vec![0xfd];
        out.extend_from_slice(&(n as u16).to_le_bytes());
        out
    } else if n <= 0xffff_ffff {
        let mut out = vec![0xfe];
        out.extend_from_slice(&(n as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xff];
        out.extend_from_slice(&n.to_le_bytes());
        out
    }
}

/// The number of bytes `write_compact_size(n)` would produce, without
/// allocating — used by weight accounting.
pub fn compact_size_len(n: u64) -> u64 {
    if n < 0xfd {
        1
    } else if n <= 0xffff {
        3
    } else if n <= 0xffff_ffff {
        5
    } else {
        9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_vectors_match_spec() {
        assert_eq!(write_compact_size(0), vec![0x00]);
        assert_eq!(write_compact_size(252), vec![0xfc]);
        assert_eq!(write_compact_size(253), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(write_compact_size(65535), vec![0xfd, 0xff, 0xff]);
        assert_eq!(
            write_compact_size(65536),
            vec![0xfe, 0x00, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            write_compact_size(0xFFFF_FFFF_FFFF_FFFF),
            vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn round_trips_every_encoded_vector() {
        for n in [0u64, 1, 252, 253, 65535, 65536, u32::MAX as u64, u64::MAX] {
            let enc = write_compact_size(n);
            let (decoded, consumed) = read_compact_size(&enc).unwrap();
            assert_eq!(decoded, n);
            assert_eq!(consumed, enc.len());
        }
    }

    #[test]
    fn rejects_non_minimal_encoding() {
        // 253 minimally encodes as 0xfd 0xfd 0x00; 0xfd 0xfc 0x00 (=252) is
        // non-minimal because 252 fits in a single byte.
        let err = read_compact_size(&[0xfd, 0xfc, 0x00]).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TxErrParse);
    }

    #[test]
    fn reports_truncation() {
        assert!(read_compact_size(&[0xfd, 0x01]).is_err());
        assert!(read_compact_size(&[]).is_err());
    }
}
