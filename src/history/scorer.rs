//! Eviction scoring for interior history points.
//!
//! Each interior point gets a score in `[0, 1]` combining two factors:
//!
//! - **proximity**: how much closer the point sits to its nearest neighbour
//!   than the average spacing of the window (`1` = crowded, `0` = isolated);
//! - **age**: the point's position in the time window, `0` at the first
//!   timestamp and `1` at the last.
//!
//! Higher scores are evicted first.
//!
//! Note that the age factor grows toward the *recent* end of the window, so
//! on its own it biases eviction toward newer interior points rather than
//! older ones. Persisted dashboards were compacted with exactly this
//! arithmetic, so it is kept as-is; flipping it would change which
//! historical points survive.

/// Weight of the neighbour-proximity factor.
pub const PROXIMITY_WEIGHT: f64 = 0.6;

/// Weight of the position-in-window factor.
pub const AGE_WEIGHT: f64 = 0.4;

/// Score the point at `index` for eviction.
///
/// `timestamps` holds epoch seconds for the whole chronological sequence,
/// `None` where an entry's timestamp could not be parsed.
///
/// Returns `None` for the first and last index, for indices out of range and
/// for unparseable points; such points are never evicted.
///
/// Unparseable entries are skipped when looking for neighbours and for the
/// window bounds. The expected spacing always divides by the full sequence
/// length.
///
/// # Example
///
/// ```
/// use bench_history::history::score;
///
/// let t = [Some(0.0), Some(1.0), Some(2.0), Some(10.0)];
/// // gap 1 vs expected spacing 2.5 -> proximity 0.6; age 0.2
/// let s = score(2, &t).unwrap();
/// assert!((s - 0.44).abs() < 1e-9);
/// assert!(score(0, &t).is_none());
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(index: usize, timestamps: &[Option<f64>]) -> Option<f64> {
    let n = timestamps.len();
    if index == 0 || index + 1 >= n {
        return None;
    }
    let t = timestamps[index]?;

    let first = timestamps.iter().flatten().next().copied().unwrap_or(t);
    let last = timestamps.iter().rev().flatten().next().copied().unwrap_or(t);
    let range = last - first;
    if range <= 0.0 {
        return Some(0.0);
    }

    let prev_gap = timestamps[..index]
        .iter()
        .rev()
        .flatten()
        .next()
        .map(|prev| t - prev);
    let next_gap = timestamps[index + 1..]
        .iter()
        .flatten()
        .next()
        .map(|next| next - t);

    let proximity = match (prev_gap, next_gap) {
        (None, None) => 0.0,
        (gap, None) | (None, gap) => proximity_score(gap.unwrap_or(range), range, n),
        (Some(prev), Some(next)) => proximity_score(prev.min(next), range, n),
    };
    let age = (t - first) / range;

    Some(PROXIMITY_WEIGHT.mul_add(proximity, AGE_WEIGHT * age))
}

#[allow(clippy::cast_precision_loss)]
fn proximity_score(neighbor_gap: f64, range: f64, n: usize) -> f64 {
    let expected_spacing = range / n as f64;
    (1.0 - neighbor_gap / expected_spacing).clamp(0.0, 1.0)
}
