//! BIP9-style feature-bit deployment state machine (spec §4.11). The state
//! at a signaling-window boundary depends only on the deployment's static
//! parameters and the signal counts of prior windows, so the whole history
//! up to `height` is replayed from `Defined` on every call rather than
//! carried as mutable state, matching the core's no-global-state rule.

use core::fmt;

use crate::constants::{SIGNAL_THRESHOLD, SIGNAL_WINDOW};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureBitState {
    Defined,
    Started,
    LockedIn,
    Active,
    Failed,
}

impl FeatureBitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureBitState::Defined => "DEFINED",
            FeatureBitState::Started => "STARTED",
            FeatureBitState::LockedIn => "LOCKED_IN",
            FeatureBitState::Active => "ACTIVE",
            FeatureBitState::Failed => "FAILED",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FeatureBitDeployment {
    pub name: String,
    pub bit: u8,
    pub start_height: u64,
    pub timeout_height: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureBitEval {
    pub state: FeatureBitState,
    pub boundary_height: u64,
    pub prev_window_signal_count: u32,
    pub signal_window: u64,
    pub signal_threshold: u32,
}

fn next_state(
    prev: FeatureBitState,
    boundary_height: u64,
    prev_window_signal_count: u32,
    d: &FeatureBitDeployment,
) -> FeatureBitState {
    match prev {
        FeatureBitState::Defined => {
            if boundary_height >= d.start_height {
                FeatureBitState::Started
            } else {
                FeatureBitState::Defined
            }
        }
        FeatureBitState::Started => {
            if prev_window_signal_count >= SIGNAL_THRESHOLD {
                FeatureBitState::LockedIn
            } else if boundary_height >= d.timeout_height {
                FeatureBitState::Failed
            } else {
                FeatureBitState::Started
            }
        }
        FeatureBitState::LockedIn => FeatureBitState::Active,
        FeatureBitState::Active => FeatureBitState::Active,
        FeatureBitState::Failed => FeatureBitState::Failed,
    }
}

/// Caller-supplied deployment parameters or window history that make a
/// feature-bit query meaningless, rather than a consensus-rule violation on
/// chain data. Kept out of the closed `ErrorCode` set (spec §4.11:
/// "`bit >= 32` is a usage error").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureBitConfigError {
    NameRequired,
    BitOutOfRange { bit: u8 },
    TimeoutBeforeStart,
    InsufficientWindowHistory { need: usize, got: usize },
}

impl fmt::Display for FeatureBitConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureBitConfigError::NameRequired => write!(f, "featurebits: name required"),
            FeatureBitConfigError::BitOutOfRange { bit } => {
                write!(f, "featurebits: bit out of range: {bit}")
            }
            FeatureBitConfigError::TimeoutBeforeStart => {
                write!(f, "featurebits: timeout_height < start_height")
            }
            FeatureBitConfigError::InsufficientWindowHistory { need, got } => write!(
                f,
                "featurebits: need {need} window_signal_counts entries, got {got}"
            ),
        }
    }
}

impl std::error::Error for FeatureBitConfigError {}

pub fn featurebit_state_at_height_from_window_counts(
    d: &FeatureBitDeployment,
    height: u64,
    window_signal_counts: &[u32],
) -> Result<FeatureBitEval, FeatureBitConfigError> {
    if d.name.is_empty() {
        return Err(FeatureBitConfigError::NameRequired);
    }
    if d.bit > 31 {
        return Err(FeatureBitConfigError::BitOutOfRange { bit: d.bit });
    }
    if d.timeout_height < d.start_height {
        return Err(FeatureBitConfigError::TimeoutBeforeStart);
    }

    let boundary_height = height - (height % SIGNAL_WINDOW);
    let target_boundary_index = boundary_height / SIGNAL_WINDOW;

    let need_windows = target_boundary_index as usize;
    if window_signal_counts.len() < need_windows {
        return Err(FeatureBitConfigError::InsufficientWindowHistory {
            need: need_windows,
            got: window_signal_counts.len(),
        });
    }

    let mut state = FeatureBitState::Defined;
    for boundary_index in 0..=target_boundary_index {
        let bh = boundary_index * SIGNAL_WINDOW;
        let prev_cnt = if bh < SIGNAL_WINDOW {
            0
        } else {
            window_signal_counts[(boundary_index - 1) as usize]
        };
        state = next_state(state, bh, prev_cnt, d);
    }

    let prev_cnt = if boundary_height < SIGNAL_WINDOW {
        0
    } else {
        window_signal_counts[(target_boundary_index - 1) as usize]
    };

    Ok(FeatureBitEval {
        state,
        boundary_height,
        prev_window_signal_count: prev_cnt,
        signal_window: SIGNAL_WINDOW,
        signal_threshold: SIGNAL_THRESHOLD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(start_height: u64, timeout_height: u64) -> FeatureBitDeployment {
        FeatureBitDeployment {
            name: "test-deployment".to_string(),
            bit: 3,
            start_height,
            timeout_height,
        }
    }

    fn state_at(d: &FeatureBitDeployment, height: u64, counts: &[u32]) -> FeatureBitState {
        featurebit_state_at_height_from_window_counts(d, height, counts)
            .unwrap()
            .state
    }

    #[test]
    fn full_lifecycle_defined_started_locked_in_active() {
        let d = deployment(SIGNAL_WINDOW, SIGNAL_WINDOW * 10);

        assert_eq!(state_at(&d, 0, &[]), FeatureBitState::Defined);
        assert_eq!(state_at(&d, SIGNAL_WINDOW, &[100]), FeatureBitState::Started);
        assert_eq!(
            state_at(&d, 2 * SIGNAL_WINDOW, &[100, SIGNAL_THRESHOLD]),
            FeatureBitState::LockedIn
        );
        assert_eq!(
            state_at(&d, 3 * SIGNAL_WINDOW, &[100, SIGNAL_THRESHOLD, 0]),
            FeatureBitState::Active
        );
    }

    #[test]
    fn started_fails_at_timeout_boundary_without_lock_in() {
        let d = deployment(0, SIGNAL_WINDOW);
        assert_eq!(state_at(&d, SIGNAL_WINDOW, &[0]), FeatureBitState::Failed);
    }

    #[test]
    fn lock_in_wins_over_a_simultaneous_timeout() {
        let d = deployment(0, SIGNAL_WINDOW);
        assert_eq!(
            state_at(&d, SIGNAL_WINDOW, &[SIGNAL_THRESHOLD]),
            FeatureBitState::LockedIn
        );
    }

    #[test]
    fn active_and_failed_are_terminal() {
        let active = deployment(SIGNAL_WINDOW, SIGNAL_WINDOW * 10);
        assert_eq!(
            state_at(&active, 5 * SIGNAL_WINDOW, &[SIGNAL_THRESHOLD, 0, 0, 0]),
            FeatureBitState::Active
        );

        let failed = deployment(0, SIGNAL_WINDOW);
        assert_eq!(state_at(&failed, 5 * SIGNAL_WINDOW, &[0, 0, 0, 0, 0]), FeatureBitState::Failed);
    }

    #[test]
    fn rejects_empty_name() {
        let mut d = deployment(0, SIGNAL_WINDOW);
        d.name.clear();
        assert_eq!(
            featurebit_state_at_height_from_window_counts(&d, 0, &[]).unwrap_err(),
            FeatureBitConfigError::NameRequired
        );
    }

    #[test]
    fn rejects_bit_out_of_range() {
        let mut d = deployment(0, SIGNAL_WINDOW);
        d.bit = 32;
        assert_eq!(
            featurebit_state_at_height_from_window_counts(&d, 0, &[]).unwrap_err(),
            FeatureBitConfigError::BitOutOfRange { bit: 32 }
        );
    }

    #[test]
    fn rejects_timeout_before_start() {
        let d = deployment(SIGNAL_WINDOW, 0);
        assert_eq!(
            featurebit_state_at_height_from_window_counts(&d, 0, &[]).unwrap_err(),
            FeatureBitConfigError::TimeoutBeforeStart
        );
    }

    #[test]
    fn rejects_insufficient_window_history() {
        let d = deployment(0, SIGNAL_WINDOW * 10);
        assert_eq!(
            featurebit_state_at_height_from_window_counts(&d, 2 * SIGNAL_WINDOW, &[0]).unwrap_err(),
            FeatureBitConfigError::InsufficientWindowHistory { need: 2, got: 1 }
        );
    }
}
