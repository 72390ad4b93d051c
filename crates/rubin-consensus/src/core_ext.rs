//! CORE_EXT covenant-data shape and the pre/post-activation spend rules for
//! an extension signature suite (spec §4.3/§4.5). Which `ext_id`s are
//! ACTIVE, and under which suites, is consensus state external to this
//! module (deployment activation) — callers pass in the profile table that
//! applies at `block_height`.

use crate::compactsize::read_compact_size;
use crate::constants::{SLH_DSA_ACTIVATION_HEIGHT, SUITE_ID_SENTINEL, SUITE_ID_SLH_DSA_SHAKE_256F};
use crate::crypto::{dispatch_verify, CryptoProvider};
use crate::error::{ErrorCode, TxError};
use crate::tx::WitnessItem;
use crate::utxo::UtxoEntry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreExtCovenant<'a> {
    pub ext_id: u16,
    pub ext_payload: &'a [u8],
}

/// An ACTIVE extension profile: the set of suite ids a spend of this
/// `ext_id` may use. Before a profile exists for an `ext_id`, every output
/// of that `ext_id` is spendable only by a keyless sentinel witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreExtProfile {
    pub ext_id: u16,
    pub allowed_suite_ids: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreExtProfiles {
    pub active: Vec<CoreExtProfile>,
}

impl CoreExtProfiles {
    pub fn empty() -> Self {
        Self { active: Vec::new() }
    }

    fn lookup(&self, ext_id: u16) -> Result<Option<&CoreExtProfile>, TxError> {
        let mut found: Option<&CoreExtProfile> = None;
        for p in &self.active {
            if p.ext_id != ext_id {
                continue;
            }
            if found.is_some() {
                return Err(TxError::new(
                    ErrorCode::TxErrCovenantTypeInvalid,
                    "CORE_EXT multiple active profiles for ext_id",
                ));
            }
            found = Some(p);
        }
        Ok(found)
    }
}

/// Parses `ext_id(u16 LE) ‖ CompactSize(ext_payload_len) ‖ ext_payload`.
pub fn parse_core_ext_covenant_data(cov_data: &[u8]) -> Result<CoreExtCovenant<'_>, TxError> {
    if cov_data.len() < 2 {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "CORE_EXT covenant_data too short",
        ));
    }
    let ext_id = u16::from_le_bytes(cov_data[0..2].try_into().expect("2 bytes"));

    let (ext_payload_len_u64, varint_bytes) = read_compact_size(&cov_data[2..]).map_err(|_| {
        TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "CORE_EXT ext_payload_len CompactSize invalid",
        )
    })?;
    let ext_payload_len = usize::try_from(ext_payload_len_u64).map_err(|_| {
        TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "CORE_EXT ext_payload_len overflows usize",
        )
    })?;
    let expected_len = 2usize
        .checked_add(varint_bytes)
        .and_then(|v| v.checked_add(ext_payload_len))
        .ok_or_else(|| {
            TxError::new(
                ErrorCode::TxErrCovenantTypeInvalid,
                "CORE_EXT length overflow",
            )
        })?;
    if cov_data.len() != expected_len {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "CORE_EXT covenant_data length mismatch",
        ));
    }
    let payload_start = 2 + varint_bytes;
    Ok(CoreExtCovenant {
        ext_id,
        ext_payload: &cov_data[payload_start..payload_start + ext_payload_len],
    })
}

/// Validates a single CORE_EXT spend's witness against the profile table in
/// effect at `block_height`. `entry` is the UTXO being spent; `w` is the
/// witness item assigned to it; `digest` is the precomputed sighash.
pub fn validate_core_ext_spend(
    entry: &UtxoEntry,
    w: &WitnessItem,
    digest: &[u8; 32],
    block_height: u64,
    profiles_at_height: &CoreExtProfiles,
    provider: &dyn CryptoProvider,
) -> Result<(), TxError> {
    let cov = parse_core_ext_covenant_data(&entry.covenant_data)?;
    let _ = cov.ext_payload;

    let profile = profiles_at_height.lookup(cov.ext_id)?;
    let Some(profile) = profile else {
        if w.suite_id != SUITE_ID_SENTINEL || !w.pubkey.is_empty() || !w.signature.is_empty() {
            return Err(TxError::new(
                ErrorCode::TxErrParse,
                "CORE_EXT spend before activation requires a keyless sentinel witness",
            ));
        }
        return Ok(());
    };

    if !profile.allowed_suite_ids.contains(&w.suite_id) || w.suite_id == SUITE_ID_SENTINEL {
        return Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "CORE_EXT suite not permitted by its active profile",
        ));
    }
    if w.suite_id == SUITE_ID_SLH_DSA_SHAKE_256F && block_height < SLH_DSA_ACTIVATION_HEIGHT {
        return Err(TxError::new(
            ErrorCode::TxErrSigAlgInvalid,
            "SLH-DSA suite inactive at this height",
        ));
    }

    let ok = dispatch_verify(provider, w.suite_id, &w.pubkey, &w.signature, digest)?;
    if !ok {
        return Err(TxError::new(
            ErrorCode::TxErrSigInvalid,
            "CORE_EXT signature invalid",
        ));
    }
    Ok(())
}
