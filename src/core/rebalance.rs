//! Priority-aware redistribution of integer portfolio weights.
//!
//! Every edit to one holding's target weight flows through [`rebalance`],
//! which returns a full replacement weight set that still sums to exactly
//! 100. The priority holding is never asked to give up capacity for someone
//! else's increase and is first in line for capacity freed by a decrease.

use crate::core::weights::{apportion, normalize_to_100};

/// Takes `amount` points out of `donors` proportionally to their current
/// weights, floor + largest remainder. Callers guarantee `amount` does not
/// exceed the donors' combined weight.
fn take_from(weights: &mut [u32], donors: &[usize], amount: u32) {
    if amount == 0 || donors.is_empty() {
        return;
    }
    let donor_weights: Vec<f64> = donors.iter().map(|&j| f64::from(weights[j])).collect();
    let cuts = apportion(&donor_weights, amount);
    for (&j, cut) in donors.iter().zip(cuts) {
        weights[j] = weights[j].saturating_sub(cut);
    }
}

/// Gives `amount` points to `receivers`, proportionally to their current
/// weights. When the receivers hold nothing (zero proportional pool), points
/// go out one at a time round-robin to receivers still under the 100 cap.
///
/// Returns the number of points that could not be placed, which is non-zero
/// only when every receiver is saturated.
fn give_to(weights: &mut [u32], receivers: &[usize], amount: u32) -> u32 {
    if amount == 0 || receivers.is_empty() {
        return amount;
    }

    let pool: u32 = receivers.iter().map(|&j| weights[j]).sum();
    if pool > 0 {
        let receiver_weights: Vec<f64> =
            receivers.iter().map(|&j| f64::from(weights[j])).collect();
        let grants = apportion(&receiver_weights, amount);
        for (&j, grant) in receivers.iter().zip(grants) {
            weights[j] += grant;
        }
        return 0;
    }

    let mut remaining = amount;
    while remaining > 0 {
        let mut placed = false;
        for &j in receivers {
            if remaining == 0 {
                break;
            }
            if weights[j] < 100 {
                weights[j] += 1;
                remaining -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }
    remaining
}

/// Applies a single weight edit and redistributes the difference so the set
/// keeps summing to exactly 100.
///
/// `weights` must be the current 100-summing integer set, `edited` the index
/// being changed, `new_value` the requested value already in `[0, 100]`, and
/// `priority` the index of the shielded holding. An increase with no donor
/// capacity is rejected and the input returned unchanged; an increase larger
/// than the donor pool is capped at the pool.
pub fn rebalance(weights: &[u32], edited: usize, new_value: u32, priority: usize) -> Vec<u32> {
    let mut next = weights.to_vec();
    if edited >= next.len() {
        return next;
    }

    let current = next[edited];
    let requested = new_value.min(100);
    if requested == current {
        return next;
    }

    if requested > current {
        // The priority holding never donates, unless it is itself the one
        // increasing, in which case everyone else is a donor.
        let donors: Vec<usize> = (0..next.len())
            .filter(|&j| j != edited && (edited == priority || j != priority))
            .collect();
        let pool: u32 = donors.iter().map(|&j| next[j]).sum();
        if pool == 0 {
            return next;
        }

        let target = requested.min(current + pool);
        let delta = target - current;
        take_from(&mut next, &donors, delta);
        next[edited] = target;
        return next;
    }

    let freed = current - requested;
    if edited != priority && priority < next.len() {
        next[edited] = requested;

        // Priority absorbs freed capacity first, up to its headroom.
        let headroom = 100 - next[priority];
        let granted = freed.min(headroom);
        next[priority] += granted;

        let rest = freed - granted;
        if rest > 0 {
            let others: Vec<usize> = (0..next.len())
                .filter(|&j| j != edited && j != priority)
                .collect();
            let unplaced = give_to(&mut next, &others, rest);
            next[edited] += unplaced;
        }
    } else {
        let receivers: Vec<usize> = (0..next.len()).filter(|&j| j != edited).collect();
        next[edited] = requested;
        let unplaced = give_to(&mut next, &receivers, freed);
        // Capacity nobody could absorb stays on the edited holding so the
        // set still sums to 100.
        next[edited] += unplaced;
    }
    next
}

/// Removes the holding at `removed` and renormalizes the remaining weights
/// back to a 100-point total. An empty remainder stays empty.
pub fn remove_holding(weights: &[u32], removed: usize) -> Vec<u32> {
    let rest: Vec<f64> = weights
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != removed)
        .map(|(_, w)| f64::from(*w))
        .collect();
    normalize_to_100(&rest)
}

/// Tracks the priority index across a removal: removing the priority holding
/// resets it to the first remaining entry, removing an earlier holding shifts
/// it down by one to keep pointing at the same logical entry.
pub fn priority_after_removal(priority: usize, removed: usize) -> usize {
    if removed == priority {
        0
    } else if removed < priority {
        priority.saturating_sub(1)
    } else {
        priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_100(weights: &[u32]) {
        assert_eq!(weights.iter().sum::<u32>(), 100, "weights: {weights:?}");
        assert!(weights.iter().all(|w| *w <= 100));
    }

    #[test]
    fn test_same_value_is_a_noop() {
        let weights = [50, 25, 15, 10];
        assert_eq!(rebalance(&weights, 1, 25, 0), weights.to_vec());
    }

    #[test]
    fn test_increase_takes_proportionally_from_donors() {
        // Raising index 2 by 20; donors are 1 and 3 (0 is priority)
        let next = rebalance(&[40, 40, 10, 10], 2, 30, 0);
        assert_sums_to_100(&next);
        assert_eq!(next[2], 30);
        assert_eq!(next[0], 40); // priority untouched
        // 20 points out of a 50-point pool: 16 from idx 1, 4 from idx 3
        assert_eq!(next, vec![40, 24, 30, 6]);
    }

    #[test]
    fn test_increase_is_capped_at_donor_pool() {
        // Donors (1, 3) hold 30 points in total; asking for +50 caps at +30
        let next = rebalance(&[50, 20, 20, 10], 2, 70, 0);
        assert_sums_to_100(&next);
        assert_eq!(next, vec![50, 0, 50, 0]);
    }

    #[test]
    fn test_increase_rejected_when_pool_is_empty() {
        let weights = [60, 0, 40, 0];
        let next = rebalance(&weights, 2, 80, 0);
        // Only the priority holds spare weight and it cannot donate
        assert_eq!(next, vec![60, 0, 40, 0]);
    }

    #[test]
    fn test_priority_increase_takes_from_everyone() {
        let next = rebalance(&[40, 30, 20, 10], 0, 70, 0);
        assert_sums_to_100(&next);
        assert_eq!(next[0], 70);
        // 30 out of a 60-point pool, proportional halves
        assert_eq!(next, vec![70, 15, 10, 5]);
    }

    #[test]
    fn test_decrease_feeds_priority_first() {
        let next = rebalance(&[50, 25, 15, 10], 1, 5, 0);
        assert_sums_to_100(&next);
        assert_eq!(next[1], 5);
        // Priority had 50 points of headroom, takes all 20 freed
        assert_eq!(next, vec![70, 5, 15, 10]);
    }

    #[test]
    fn test_decrease_near_saturated_priority() {
        let next = rebalance(&[98, 0, 1, 1], 3, 0, 0);
        assert_sums_to_100(&next);
        assert_eq!(next, vec![99, 0, 1, 0]);
    }

    #[test]
    fn test_priority_decrease_spreads_proportionally() {
        let next = rebalance(&[60, 20, 20], 0, 40, 0);
        assert_sums_to_100(&next);
        assert_eq!(next, vec![40, 30, 30]);
    }

    #[test]
    fn test_priority_decrease_round_robin_when_others_empty() {
        let next = rebalance(&[100, 0, 0], 0, 40, 0);
        assert_sums_to_100(&next);
        // 60 freed points rotate one at a time over indices 1 and 2
        assert_eq!(next, vec![40, 30, 30]);
    }

    #[test]
    fn test_sole_holding_cannot_shed_weight() {
        // Nobody can absorb the freed capacity, so the edit is undone
        let next = rebalance(&[100], 0, 30, 0);
        assert_eq!(next, vec![100]);
    }

    #[test]
    fn test_saturating_increases_leave_donors_at_zero() {
        // Two successive increases that together drain the whole pool
        let first = rebalance(&[50, 20, 20, 10], 0, 80, 0);
        assert_sums_to_100(&first);
        let second = rebalance(&first, 0, 100, 0);
        assert_sums_to_100(&second);
        assert_eq!(second, vec![100, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let weights = [50, 50];
        assert_eq!(rebalance(&weights, 5, 10, 0), weights.to_vec());
    }

    #[test]
    fn test_remove_renormalizes_remaining() {
        let next = remove_holding(&[50, 25, 15, 10], 0);
        assert_sums_to_100(&next);
        assert_eq!(next, vec![50, 30, 20]);
    }

    #[test]
    fn test_remove_last_entry_yields_empty() {
        assert!(remove_holding(&[100], 0).is_empty());
    }

    #[test]
    fn test_remove_zero_sum_remainder_defaults_to_first() {
        let next = remove_holding(&[100, 0, 0], 0);
        assert_eq!(next, vec![100, 0]);
    }

    #[test]
    fn test_priority_index_tracks_removal() {
        assert_eq!(priority_after_removal(2, 2), 0);
        assert_eq!(priority_after_removal(2, 0), 1);
        assert_eq!(priority_after_removal(1, 3), 1);
    }

    #[test]
    fn test_edit_sequences_preserve_invariant() {
        let mut weights = vec![25, 25, 25, 25];
        let edits = [(1, 60), (0, 0), (3, 45), (2, 100), (1, 7)];
        for (idx, value) in edits {
            weights = rebalance(&weights, idx, value, 0);
            assert_sums_to_100(&weights);
        }
    }
}
