//! Density-based clustering (DBSCAN).
//!
//! A point is *core* when at least `min_pts` points (itself included) lie
//! within `epsilon`. Clusters grow breadth-first from core points; points
//! reached from a core point but not core themselves join as border members.
//! Anything unreachable is noise.
//!
//! Cluster ids follow first discovery while scanning in input order, so the
//! result is fully determined by the input order.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Per-point labelling during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointState {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Clusters as lists of input indices (ascending), plus noise indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbscanResult {
    pub clusters: Vec<Vec<usize>>,
    pub noise: Vec<usize>,
}

impl DbscanResult {
    /// Cluster id of every input index, `None` for noise.
    pub fn labels(&self, len: usize) -> Vec<Option<usize>> {
        let mut labels = vec![None; len];
        for (id, members) in self.clusters.iter().enumerate() {
            for &idx in members {
                if let Some(slot) = labels.get_mut(idx) {
                    *slot = Some(id);
                }
            }
        }
        labels
    }
}

/// Run DBSCAN over `points`.
///
/// Every index ends up in exactly one cluster or in `noise`.
pub fn dbscan<V, F>(points: &[V], epsilon: f64, min_pts: usize, distance: F) -> DbscanResult
where
    V: AsRef<[f32]>,
    F: Fn(&[f32], &[f32]) -> f64,
{
    let region = |p: usize| -> Vec<usize> {
        let origin = points[p].as_ref();
        (0..points.len())
            .filter(|&q| distance(origin, points[q].as_ref()) <= epsilon)
            .collect()
    };

    let mut state = vec![PointState::Unvisited; points.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for p in 0..points.len() {
        if state[p] != PointState::Unvisited {
            continue;
        }
        let neighbours = region(p);
        if neighbours.len() < min_pts {
            // Provisional; a later cluster may still claim it as a border point.
            state[p] = PointState::Noise;
            continue;
        }

        let id = clusters.len();
        state[p] = PointState::Cluster(id);
        let mut members = vec![p];
        let mut queued: HashSet<usize> = neighbours.iter().copied().collect();
        queued.insert(p);
        let mut worklist: VecDeque<usize> = neighbours.into_iter().filter(|&q| q != p).collect();

        while let Some(q) = worklist.pop_front() {
            match state[q] {
                PointState::Cluster(_) => {}
                PointState::Noise => {
                    state[q] = PointState::Cluster(id);
                    members.push(q);
                }
                PointState::Unvisited => {
                    state[q] = PointState::Cluster(id);
                    members.push(q);
                    let reach = region(q);
                    if reach.len() >= min_pts {
                        for r in reach {
                            if queued.insert(r) {
                                worklist.push_back(r);
                            }
                        }
                    }
                }
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    let noise = state
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == PointState::Noise)
        .map(|(idx, _)| idx)
        .collect();

    DbscanResult { clusters, noise }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::distance::{cosine_distance, euclidean_distance};

    #[test]
    fn empty_input() {
        let points: Vec<Vec<f32>> = Vec::new();
        assert_eq!(dbscan(&points, 0.5, 3, cosine_distance), DbscanResult::default());
    }

    #[test]
    fn identical_points_form_one_cluster() {
        let points: Vec<Vec<f32>> = vec![vec![1.0, 2.0]; 5];
        let result = dbscan(&points, 0.01, 3, cosine_distance);
        assert_eq!(result.clusters, vec![vec![0, 1, 2, 3, 4]]);
        assert!(result.noise.is_empty());
    }

    #[test]
    fn orthogonal_and_opposite_points_are_noise() {
        let points: Vec<Vec<f32>> = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![-1.0, 0.0, 0.0],
        ];
        let result = dbscan(&points, 0.1, 2, cosine_distance);
        assert!(result.clusters.is_empty());
        assert_eq!(result.noise, vec![0, 1, 2, 3]);
    }

    #[test]
    fn two_groups_and_an_outlier() {
        let points: Vec<Vec<f32>> = vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.0],
            vec![50.0, 50.0],
            vec![10.1, 10.0],
            vec![0.0, 0.1],
            vec![10.0, 10.1],
        ];
        let result = dbscan(&points, 0.5, 3, euclidean_distance);
        assert_eq!(result.clusters, vec![vec![0, 2, 5], vec![1, 4, 6]]);
        assert_eq!(result.noise, vec![3]);
        assert_eq!(
            result.labels(points.len()),
            vec![Some(0), Some(1), Some(0), None, Some(1), Some(0), Some(1)]
        );
    }

    #[test]
    fn early_noise_is_reclaimed_as_border() {
        // Point 0 has only one neighbour (point 1) so it is provisionally
        // noise; point 1 is core and reaches it.
        let points: Vec<Vec<f32>> = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let result = dbscan(&points, 1.0, 3, euclidean_distance);
        assert_eq!(result.clusters, vec![vec![0, 1, 2, 3]]);
        assert!(result.noise.is_empty());
    }

    #[test]
    fn border_points_do_not_expand() {
        // 0..=3 are dense; 4 is a border of that group; 5 is only near 4.
        let points: Vec<Vec<f32>> = vec![
            vec![0.0],
            vec![0.1],
            vec![0.2],
            vec![0.3],
            vec![0.8],
            vec![1.3],
        ];
        let result = dbscan(&points, 0.55, 4, euclidean_distance);
        assert_eq!(result.clusters, vec![vec![0, 1, 2, 3, 4]]);
        assert_eq!(result.noise, vec![5]);
    }
}
