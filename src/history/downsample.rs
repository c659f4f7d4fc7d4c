//! Score-based history compaction.

use super::scorer::score;
use super::types::History;
use tracing::{debug, warn};

/// Reduce `history` to at most `max_entries` entries.
///
/// - Histories already within the cap are returned unchanged.
/// - The first and last entries are always kept.
/// - Interior entries are ranked by [`score`](super::score) and the
///   `len - max_entries` highest-scoring ones are evicted. Ties evict the
///   earlier entry first.
/// - Entries with unparseable timestamps are never evicted, so the result
///   can exceed `max_entries` when too few interior entries are scoreable.
///
/// The survivors keep their original relative order.
///
/// # Example
///
/// ```
/// use bench_history::history::{downsample, History, HistoryEntry};
///
/// let history: History = ["2025-01-01T00:00:00Z", "2025-01-01T00:00:01Z",
///                          "2025-01-01T00:00:02Z", "2025-01-01T00:00:10Z"]
///     .into_iter()
///     .map(|ts| HistoryEntry { timestamp: ts.into(), fields: Default::default() })
///     .collect();
///
/// let compacted = downsample(&history, 3);
/// assert_eq!(compacted.len(), 3);
/// assert_eq!(compacted.entries()[0].timestamp, "2025-01-01T00:00:00Z");
/// assert_eq!(compacted.entries()[2].timestamp, "2025-01-01T00:00:10Z");
/// ```
#[must_use]
pub fn downsample(history: &History, max_entries: usize) -> History {
    let n = history.len();
    if n <= max_entries {
        return history.clone();
    }

    let timestamps = history.epoch_seconds();
    for (entry, ts) in history.iter().zip(&timestamps) {
        if ts.is_none() {
            warn!(
                timestamp = %entry.timestamp,
                "Could not parse history timestamp; entry will be kept"
            );
        }
    }

    let mut scored: Vec<(usize, f64)> = (1..n.saturating_sub(1))
        .filter_map(|i| score(i, &timestamps).map(|s| (i, s)))
        .collect();
    // Stable sort: equal scores keep ascending index order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let to_remove = n - max_entries;
    let mut evict = vec![false; n];
    for &(i, _) in scored.iter().take(to_remove) {
        evict[i] = true;
    }

    let result: History = history
        .iter()
        .zip(&evict)
        .filter(|&(_, &evicted)| !evicted)
        .map(|(entry, _)| entry.clone())
        .collect();

    if result.len() > max_entries {
        warn!(
            kept = result.len(),
            max_entries, "History still exceeds cap; remaining entries are not scoreable"
        );
    }
    debug!(before = n, after = result.len(), "Downsampled history");
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_utils::{entry_at, history_from_offsets, offsets_of};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_within_cap_is_identity() {
        let history = history_from_offsets(&[0, 1, 2]);
        assert_eq!(downsample(&history, 3), history);
        assert_eq!(downsample(&history, 10), history);
    }

    #[test]
    fn test_empty_history() {
        assert!(downsample(&History::new(), 0).is_empty());
        assert!(downsample(&History::new(), 5).is_empty());
    }

    #[test]
    fn test_single_entry_survives_zero_cap() {
        let history = history_from_offsets(&[0]);
        assert_eq!(downsample(&history, 0), history);
    }

    #[test]
    fn test_concrete_scenario_evicts_crowded_recent_point() {
        let history = history_from_offsets(&[0, 1, 2, 10]);
        let result = downsample(&history, 3);
        assert_eq!(offsets_of(&result), vec![0, 1, 10]);
    }

    #[test]
    fn test_boundaries_survive_small_cap() {
        let history = history_from_offsets(&[0, 3, 4, 5, 6, 100]);
        let result = downsample(&history, 2);
        assert_eq!(offsets_of(&result), vec![0, 100]);
    }

    #[test]
    fn test_cap_below_two_still_keeps_boundaries() {
        let history = history_from_offsets(&[0, 1, 2]);
        let result = downsample(&history, 1);
        assert_eq!(offsets_of(&result), vec![0, 2]);
    }

    #[test]
    fn test_crowded_cluster_is_thinned_first() {
        // evenly spaced points plus a tight cluster around t=50
        let history = history_from_offsets(&[0, 20, 40, 50, 51, 52, 60, 80, 100]);
        let result = downsample(&history, 7);
        let kept = offsets_of(&result);
        assert_eq!(kept.len(), 7);
        assert!(kept.contains(&20));
        assert!(kept.contains(&80));
        // two of the three clustered points go
        let cluster = kept.iter().filter(|t| (50..=52).contains(*t)).count();
        assert_eq!(cluster, 1);
    }

    #[test]
    fn test_flat_range_evicts_earliest_interior_first() {
        let history = history_from_offsets(&[7, 7, 7, 7, 7]);
        let result = downsample(&history, 3);
        assert_eq!(result.len(), 3);
        assert_eq!(result.entries()[0], history.entries()[0]);
        assert_eq!(result.entries()[1], history.entries()[3]);
        assert_eq!(result.entries()[2], history.entries()[4]);
    }

    #[test]
    fn test_unparseable_entries_are_kept_past_cap() {
        let mut entries = history_from_offsets(&[0, 1, 2, 3]).into_entries();
        entries.insert(1, entry_at("garbage"));
        entries.insert(3, entry_at(""));
        let history = History::from(entries);
        // six entries, cap 2: only two interior points are scoreable
        let result = downsample(&history, 2);
        assert_eq!(result.len(), 4);
        let stamps: Vec<&str> = result.iter().map(|e| e.timestamp.as_str()).collect();
        assert!(stamps.contains(&"garbage"));
        assert!(stamps.contains(&""));
    }

    #[test]
    fn test_twice_equals_once_with_unparseable_entries() {
        let mut entries = history_from_offsets(&[0, 1, 2, 3, 4, 5]).into_entries();
        entries.insert(2, entry_at("garbage"));
        let history = History::from(entries);
        let once = downsample(&history, 2);
        assert_eq!(downsample(&once, 2), once);
    }

    fn arb_offsets() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0_i64..1_000, 0..40).prop_map(|mut v| {
            v.sort_unstable();
            v
        })
    }

    proptest! {
        #[test]
        fn prop_idempotent(offsets in arb_offsets(), cap in 2_usize..20) {
            let history = history_from_offsets(&offsets);
            let once = downsample(&history, cap);
            prop_assert_eq!(downsample(&once, cap), once);
        }

        #[test]
        fn prop_size_bound(offsets in arb_offsets(), cap in 2_usize..20) {
            let history = history_from_offsets(&offsets);
            prop_assert_eq!(downsample(&history, cap).len(), offsets.len().min(cap));
        }

        #[test]
        fn prop_boundaries_preserved(offsets in arb_offsets(), cap in 2_usize..20) {
            let history = history_from_offsets(&offsets);
            prop_assume!(history.len() > cap);
            let result = downsample(&history, cap);
            prop_assert_eq!(result.entries().first(), history.entries().first());
            prop_assert_eq!(result.last(), history.last());
        }

        #[test]
        fn prop_order_preserved(offsets in arb_offsets(), cap in 2_usize..20) {
            let history = history_from_offsets(&offsets);
            let result = downsample(&history, cap);
            // subsequence check
            let mut source = history.iter();
            for kept in &result {
                prop_assert!(source.any(|e| e == kept));
            }
        }

        #[test]
        fn prop_unparseable_always_kept(
            offsets in arb_offsets(),
            cap in 2_usize..20,
            slot in 0_usize..40,
        ) {
            let mut entries = history_from_offsets(&offsets).into_entries();
            let at = slot.min(entries.len());
            entries.insert(at, entry_at("not a timestamp"));
            let history = History::from(entries);
            let result = downsample(&history, cap);
            prop_assert!(result.iter().any(|e| e.timestamp == "not a timestamp"));
        }
    }
}
