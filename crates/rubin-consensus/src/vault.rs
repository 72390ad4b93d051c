//! CORE_VAULT covenant-data shape. Genesis rules reject every VAULT output
//! unconditionally (spec §9 Open Question) — this module exists so the
//! eventual shape is parsed and exercised by tests ahead of ratification,
//! not because any current code path lets a VAULT spend succeed.

use crate::constants::{MIN_VAULT_SPEND_DELAY, VAULT_COVENANT_DATA_LEN};
use crate::error::{ErrorCode, TxError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultLockMode {
    Height,
    Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultCovenant {
    pub owner_key: [u8; 32],
    pub recovery_key: [u8; 32],
    pub spend_delay: u32,
    pub lock_mode: VaultLockMode,
}

/// Parses the extended VAULT layout: `owner_key(32) ‖ recovery_key(32) ‖
/// spend_delay(u32 LE) ‖ lock_mode(u8)`, enforcing `spend_delay >=
/// MIN_VAULT_SPEND_DELAY` and `owner_key != recovery_key`.
pub fn parse_vault_covenant_data(data: &[u8]) -> Result<VaultCovenant, TxError> {
    if data.len() as u64 != VAULT_COVENANT_DATA_LEN {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "VAULT covenant_data has the wrong length",
        ));
    }
    let mut owner_key = [0u8; 32];
    owner_key.copy_from_slice(&data[0..32]);
    let mut recovery_key = [0u8; 32];
    recovery_key.copy_from_slice(&data[32..64]);
    let spend_delay = u32::from_le_bytes(data[64..68].try_into().unwrap());
    let lock_mode = match data[68] {
        0x00 => VaultLockMode::Height,
        0x01 => VaultLockMode::Time,
        _ => {
            return Err(TxError::new(
                ErrorCode::TxErrCovenantTypeInvalid,
                "invalid VAULT lock_mode",
            ))
        }
    };

    if spend_delay < MIN_VAULT_SPEND_DELAY {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "VAULT spend_delay below minimum",
        ));
    }
    if owner_key == recovery_key {
        return Err(TxError::new(
            ErrorCode::TxErrCovenantTypeInvalid,
            "VAULT owner_key must differ from recovery_key",
        ));
    }

    Ok(VaultCovenant {
        owner_key,
        recovery_key,
        spend_delay,
        lock_mode,
    })
}
