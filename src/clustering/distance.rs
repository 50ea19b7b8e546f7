//! Vector distance helpers.

/// Distance function accepted by [`super::dbscan::dbscan`].
pub type DistanceFn = fn(&[f32], &[f32]) -> f64;

/// Cosine similarity in `[-1, 1]`.
///
/// Length-mismatched, empty or zero-norm inputs have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// `1 - cosine_similarity`, in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// Straight-line distance. Mismatched lengths are infinitely far apart.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Mean of `vectors`. Vectors whose length differs from the first are ignored.
pub fn centroid<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let dim = first.as_ref().len();
    let mut sum = vec![0.0f64; dim];
    let mut count = 0usize;

    for vector in vectors.iter().map(|v| v.as_ref()) {
        if vector.len() != dim {
            continue;
        }
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*value);
        }
        count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    #[allow(clippy::cast_possible_truncation)]
    let mean = sum.into_iter().map(|total| (total / count) as f32).collect();
    mean
}
