//! Five-way balanced partition of an upload
//!
//! The first [`AGENTS_PER_LIST`] active agents (in caller order) each get a
//! contiguous slice of the records. Slice sizes differ by at most one and the
//! larger slices go to the earlier agents.

use crate::{Agent, CanonicalRecord, Distribution, DistributionError};

/// Number of agents every list is split across.
pub const AGENTS_PER_LIST: usize = 5;

/// Slice lengths for `n` items across [`AGENTS_PER_LIST`] agents.
pub fn slice_sizes(n: usize) -> [usize; AGENTS_PER_LIST] {
    let base = n / AGENTS_PER_LIST;
    let remainder = n % AGENTS_PER_LIST;
    let mut sizes = [base; AGENTS_PER_LIST];
    for size in sizes.iter_mut().take(remainder) {
        *size += 1;
    }
    sizes
}

/// Partition `items` across the first five active agents.
///
/// Fails with [`DistributionError::InsufficientAgents`] when fewer than five
/// agents are active. An empty `items` yields five empty distributions.
pub fn distribute(
    items: Vec<CanonicalRecord>,
    agents: &[Agent],
) -> Result<Vec<Distribution>, DistributionError> {
    let selected: Vec<&Agent> = agents
        .iter()
        .filter(|agent| agent.is_active)
        .take(AGENTS_PER_LIST)
        .collect();

    if selected.len() < AGENTS_PER_LIST {
        return Err(DistributionError::InsufficientAgents {
            required: AGENTS_PER_LIST,
            found: agents.iter().filter(|agent| agent.is_active).count(),
        });
    }

    let sizes = slice_sizes(items.len());
    let mut remaining = items.into_iter();
    let distributions = selected
        .into_iter()
        .zip(sizes)
        .map(|(agent, size)| {
            let slice: Vec<CanonicalRecord> = remaining.by_ref().take(size).collect();
            Distribution::new(agent.agent_id, slice)
        })
        .collect();

    Ok(distributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminId, EntityIdType};
    use chrono::Utc;
    use proptest::prelude::*;

    fn agents(count: usize) -> Vec<Agent> {
        let admin = AdminId::now_v7();
        (0..count)
            .map(|i| {
                Agent::new(
                    admin,
                    format!("Agent {}", i),
                    format!("agent{}@example.com", i),
                    format!("+1555000{:04}", i),
                    Utc::now(),
                )
            })
            .collect()
    }

    fn records(n: usize) -> Vec<CanonicalRecord> {
        (0..n)
            .map(|i| CanonicalRecord {
                first_name: format!("contact-{}", i),
                phone: format!("+1{}", i),
                notes: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_twelve_items_split_three_three_two_two_two() {
        let dists = distribute(records(12), &agents(5)).expect("five agents");
        let counts: Vec<usize> = dists.iter().map(|d| d.item_count).collect();
        assert_eq!(counts, vec![3, 3, 2, 2, 2]);
        assert_eq!(slice_sizes(12), [3, 3, 2, 2, 2]);
    }

    #[test]
    fn test_fewer_than_five_active_agents_fails() {
        let mut pool = agents(6);
        pool[0].is_active = false;
        pool[1].is_active = false;
        assert_eq!(
            distribute(records(3), &pool),
            Err(DistributionError::InsufficientAgents {
                required: 5,
                found: 4
            })
        );
    }

    #[test]
    fn test_inactive_agents_are_skipped_in_order() {
        let mut pool = agents(7);
        pool[1].is_active = false;
        let dists = distribute(records(5), &pool).expect("enough agents");
        let picked: Vec<_> = dists.iter().map(|d| d.agent_id).collect();
        let expected: Vec<_> = [0, 2, 3, 4, 5].iter().map(|&i| pool[i].agent_id).collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_zero_items_gives_five_empty_slices() {
        let dists = distribute(Vec::new(), &agents(5)).expect("five agents");
        assert_eq!(dists.len(), 5);
        assert!(dists.iter().all(|d| d.items.is_empty() && d.item_count == 0));
    }

    proptest! {
        #[test]
        fn prop_slices_are_balanced_contiguous_and_complete(n in 0usize..500, extra in 0usize..4) {
            let pool = agents(AGENTS_PER_LIST + extra);
            let input = records(n);
            let dists = distribute(input.clone(), &pool).expect("enough agents");

            prop_assert_eq!(dists.len(), AGENTS_PER_LIST);

            let counts: Vec<usize> = dists.iter().map(|d| d.item_count).collect();
            let max = counts.iter().copied().max().unwrap_or(0);
            let min = counts.iter().copied().min().unwrap_or(0);
            prop_assert!(max - min <= 1);
            prop_assert_eq!(counts.iter().sum::<usize>(), n);

            // Concatenating slices in agent order reproduces the input.
            let rejoined: Vec<CanonicalRecord> =
                dists.iter().flat_map(|d| d.items.iter().cloned()).collect();
            prop_assert_eq!(rejoined, input);

            for dist in &dists {
                prop_assert_eq!(dist.item_count, dist.items.len());
            }
        }

        #[test]
        fn prop_under_five_agents_always_fails(count in 0usize..AGENTS_PER_LIST, n in 0usize..50) {
            let result = distribute(records(n), &agents(count));
            let is_insufficient =
                matches!(result, Err(DistributionError::InsufficientAgents { .. }));
            prop_assert!(is_insufficient);
        }
    }

    #[test]
    fn test_agent_ids_are_distinct() {
        let dists = distribute(records(10), &agents(5)).expect("five agents");
        let mut ids: Vec<_> = dists.iter().map(|d| d.agent_id.as_uuid()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }
}
