//! Neighbourhood radius selection from the k-distance curve.

/// Smallest radius ever returned.
pub const EPSILON_MIN: f64 = 0.05;
/// Largest radius ever returned.
pub const EPSILON_MAX: f64 = 0.5;

const FLAT_CURVE: f64 = 1e-9;

/// Pick `epsilon` for DBSCAN with the given `min_pts`.
///
/// With `k = max(1, min_pts - 1)`, each point's distance to its k-th nearest
/// neighbour is sorted ascending. The elbow is the value furthest from the
/// chord joining the first and last values (both axes scaled to `[0, 1]`).
/// The result is `max(elbow, median)` clamped to
/// `[EPSILON_MIN, EPSILON_MAX]`.
///
/// Fewer than `k + 1` points, or a flat curve, falls back to the largest
/// k-distance, clamped the same way. A single point (or none) yields
/// `EPSILON_MAX`.
pub fn auto_epsilon<V, F>(points: &[V], min_pts: usize, distance: F) -> f64
where
    V: AsRef<[f32]>,
    F: Fn(&[f32], &[f32]) -> f64,
{
    let k = min_pts.saturating_sub(1).max(1);
    let curve = k_distances(points, k, &distance);

    let Some(&largest) = curve.last() else {
        return EPSILON_MAX;
    };
    if points.len() < k + 1 {
        return clamp(largest);
    }

    let smallest = curve[0];
    let span = largest - smallest;
    if curve.len() < 3 || span < FLAT_CURVE {
        return clamp(largest);
    }

    #[allow(clippy::cast_precision_loss)]
    let last_index = (curve.len() - 1) as f64;
    let elbow = curve
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            #[allow(clippy::cast_precision_loss)]
            let x = idx as f64 / last_index;
            let y = (value - smallest) / span;
            // Distance to the diagonal chord y = x, up to a constant factor.
            ((x - y).abs(), *value)
        })
        .fold((f64::NEG_INFINITY, largest), |best, candidate| {
            if candidate.0 > best.0 { candidate } else { best }
        })
        .1;

    clamp(elbow.max(median(&curve)))
}

/// Sorted k-th nearest neighbour distances. When fewer than `k` other points
/// exist, the furthest available neighbour is used.
fn k_distances<V, F>(points: &[V], k: usize, distance: &F) -> Vec<f64>
where
    V: AsRef<[f32]>,
    F: Fn(&[f32], &[f32]) -> f64,
{
    let mut curve: Vec<f64> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let mut others: Vec<f64> = points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| distance(p.as_ref(), q.as_ref()))
                .filter(|d| d.is_finite())
                .collect();
            if others.is_empty() {
                return None;
            }
            others.sort_by(f64::total_cmp);
            Some(others[k.min(others.len()) - 1])
        })
        .collect();
    curve.sort_by(f64::total_cmp);
    curve
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        return EPSILON_MAX;
    }
    value.clamp(EPSILON_MIN, EPSILON_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::distance::{cosine_distance, euclidean_distance};

    #[test]
    fn tight_groups_clamp_to_minimum() {
        let points: Vec<Vec<f32>> = vec![vec![1.0, 0.0]; 6];
        assert!((auto_epsilon(&points, 3, cosine_distance) - EPSILON_MIN).abs() < 1e-12);
    }

    #[test]
    fn scattered_points_clamp_to_maximum() {
        let points: Vec<Vec<f32>> = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![-1.0, 0.0, 0.0],
        ];
        assert!((auto_epsilon(&points, 3, cosine_distance) - EPSILON_MAX).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        let none: Vec<Vec<f32>> = Vec::new();
        assert!((auto_epsilon(&none, 3, cosine_distance) - EPSILON_MAX).abs() < 1e-12);
        let one: Vec<Vec<f32>> = vec![vec![1.0]];
        assert!((auto_epsilon(&one, 3, cosine_distance) - EPSILON_MAX).abs() < 1e-12);
        // Two points with k = 2: only one neighbour each, so the largest
        // available distance is used.
        let two: Vec<Vec<f32>> = vec![vec![0.0], vec![0.2]];
        assert!((auto_epsilon(&two, 3, euclidean_distance) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn elbow_sits_between_dense_and_sparse() {
        // Dense run with spacing 0.1 and two far outliers.
        let mut points: Vec<Vec<f32>> = (0..10u8).map(|i| vec![f32::from(i) * 0.1]).collect();
        points.push(vec![5.0]);
        points.push(vec![9.0]);
        let eps = auto_epsilon(&points, 3, euclidean_distance);
        assert!((0.19..=0.21).contains(&eps), "eps = {eps}");
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert!((median(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
        assert!((median(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }
}
