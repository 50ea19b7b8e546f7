//! Property-based tests for the mining and clustering invariants.

use std::collections::BTreeSet;

use proptest::prelude::*;

use skillmine::clustering::{cosine_distance, cosine_similarity, dbscan, euclidean_distance};
use skillmine::patterns::scoring::frequency_score;
use skillmine::patterns::{
    PatternAggregator, SessionPatterns, extract_ngrams, generate_candidate_name,
    parse_pattern_key,
};

fn arb_vector(dims: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, dims)
}

fn arb_tools() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("Read".to_string()),
            Just("Edit".to_string()),
            Just("Bash".to_string()),
            Just("Grep".to_string()),
        ],
        0..12,
    )
}

fn session(idx: usize, project: &str, tools: &[String]) -> SessionPatterns {
    let mut patterns = SessionPatterns::new(format!("s{idx}"), project);
    patterns.tool_bigrams = extract_ngrams(tools, 2);
    patterns.tool_trigrams = extract_ngrams(tools, 3);
    patterns
}

fn snapshot(aggregator: &PatternAggregator) -> Vec<(String, usize, usize, usize)> {
    let mut rows: Vec<_> = aggregator
        .occurrences()
        .iter()
        .map(|(key, occ)| {
            (
                key.clone(),
                occ.total_count,
                occ.session_count,
                occ.project_count,
            )
        })
        .collect();
    rows.sort();
    rows
}

proptest! {
    #[test]
    fn dbscan_partitions_points(
        points in prop::collection::vec(arb_vector(3), 0..24),
        epsilon in 0.05f64..1.0,
        min_pts in 1usize..5,
    ) {
        let result = dbscan(&points, epsilon, min_pts, euclidean_distance);

        let mut seen = BTreeSet::new();
        for idx in result.clusters.iter().flatten().chain(&result.noise) {
            prop_assert!(seen.insert(*idx), "point {} assigned twice", idx);
        }
        prop_assert_eq!(seen.len(), points.len());
        for cluster in &result.clusters {
            prop_assert!(!cluster.is_empty());
        }
    }

    #[test]
    fn cosine_is_symmetric_and_bounded(a in arb_vector(8), b in arb_vector(8)) {
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert!((-1.0..=1.0).contains(&ab));
        prop_assert!((0.0..=2.0).contains(&cosine_distance(&a, &b)));
    }

    #[test]
    fn frequency_score_is_monotone_and_sublinear(count in 0usize..10_000) {
        let here = frequency_score(count);
        let next = frequency_score(count + 1);
        prop_assert!(next >= here);
        prop_assert!((0.0..=1.0).contains(&here));
        if count > 0 {
            prop_assert!(frequency_score(count * 2) <= 2.0 * here);
        }
    }

    #[test]
    fn aggregation_ignores_session_order(
        sessions in prop::collection::vec((arb_tools(), 0usize..3), 0..8),
        seed in any::<u64>(),
    ) {
        let built: Vec<SessionPatterns> = sessions
            .iter()
            .enumerate()
            .map(|(idx, (tools, project))| session(idx, &format!("p{project}"), tools))
            .collect();

        let mut forward = PatternAggregator::new();
        for patterns in built.clone() {
            forward.add_session_patterns(patterns);
        }

        // Deterministic shuffle driven by the seed.
        let mut order: Vec<usize> = (0..built.len()).collect();
        let mut state = seed;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            #[allow(clippy::cast_possible_truncation)]
            let j = (state >> 33) as usize % (i + 1);
            order.swap(i, j);
        }
        let mut shuffled = PatternAggregator::new();
        for idx in order {
            shuffled.add_session_patterns(built[idx].clone());
        }

        prop_assert_eq!(snapshot(&forward), snapshot(&shuffled));
        prop_assert_eq!(forward.total_sessions(), shuffled.total_sessions());
    }

    #[test]
    fn every_aggregated_key_parses(tools in arb_tools()) {
        let mut aggregator = PatternAggregator::new();
        aggregator.add_session_patterns(session(0, "p", &tools));
        for key in aggregator.occurrences().keys() {
            let parsed = parse_pattern_key(key).unwrap();
            prop_assert!(generate_candidate_name(&parsed).ends_with("-workflow"));
        }
    }
}
