use crate::constants::{EMISSION_SPEED_FACTOR, MINEABLE_CAP, TAIL_EMISSION_PER_BLOCK};

/// Per-block coinbase subsidy bound (excludes fees). `already_generated` is
/// the sum of subsidy-only emission for coinbase transactions at heights
/// `1..height-1`; deriving it from chain state is the caller's
/// responsibility. Decays geometrically toward `TAIL_EMISSION_PER_BLOCK`
/// and never drops below it once mining has started.
pub fn block_subsidy(height: u64, already_generated: u64) -> u64 {
    if height == 0 {
        return 0;
    }
    if already_generated >= MINEABLE_CAP {
        return TAIL_EMISSION_PER_BLOCK;
    }
    let remaining = MINEABLE_CAP - already_generated;
    let base_reward = remaining >> EMISSION_SPEED_FACTOR;
    if base_reward < TAIL_EMISSION_PER_BLOCK {
        TAIL_EMISSION_PER_BLOCK
    } else {
        base_reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_height_has_no_subsidy() {
        assert_eq!(block_subsidy(0, 0), 0);
        assert_eq!(block_subsidy(0, 12345), 0);
    }

    #[test]
    fn subsidy_halves_as_already_generated_grows() {
        let early = block_subsidy(1, 0);
        let half_cap = block_subsidy(1, MINEABLE_CAP / 2);
        assert!(half_cap < early);
        assert_eq!(half_cap, (MINEABLE_CAP - MINEABLE_CAP / 2) >> EMISSION_SPEED_FACTOR);
    }

    #[test]
    fn subsidy_floors_at_tail_emission_once_base_reward_decays_below_it() {
        // Once remaining is small enough that the shifted base reward would
        // undercut the tail, the floor applies instead of the raw shift.
        let remaining = (TAIL_EMISSION_PER_BLOCK << EMISSION_SPEED_FACTOR) / 2;
        let already_generated = MINEABLE_CAP - remaining;
        assert_eq!(block_subsidy(1, already_generated), TAIL_EMISSION_PER_BLOCK);
    }

    #[test]
    fn subsidy_is_tail_emission_once_cap_is_reached() {
        assert_eq!(block_subsidy(1, MINEABLE_CAP), TAIL_EMISSION_PER_BLOCK);
        assert_eq!(block_subsidy(1, MINEABLE_CAP + 1), TAIL_EMISSION_PER_BLOCK);
    }

    #[test]
    fn subsidy_is_independent_of_height_given_the_same_already_generated() {
        assert_eq!(block_subsidy(1, 1_000), block_subsidy(500_000, 1_000));
    }
}
