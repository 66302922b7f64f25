//! Property tests for vector index search ordering and persistence.

use kisan_rag::index::{IndexEntry, VectorIndex};
use kisan_rag::types::{Passage, SourceRef};
use proptest::prelude::*;

const DIM: usize = 8;

/// Non-zero embedding of the given dimension.
fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter("non-zero embedding", |v| {
        v.iter().map(|x| x * x).sum::<f32>() > 1e-6
    })
}

fn passage(i: usize) -> Passage {
    let text = format!("passage {}", i);
    Passage {
        char_end: text.chars().count(),
        text,
        source: SourceRef::new("handbook.pdf", Some(i as u32 + 1)),
        chunk_index: 0,
        char_start: 0,
    }
}

fn build(vectors: Vec<Vec<f32>>) -> VectorIndex {
    let entries = vectors
        .into_iter()
        .enumerate()
        .map(|(i, v)| IndexEntry::new(v, passage(i)))
        .collect();
    VectorIndex::build(DIM, "prop-model", entries).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn results_descend_and_are_bounded_by_k(
        vectors in proptest::collection::vec(arb_embedding(DIM), 0..30),
        query in arb_embedding(DIM),
        k in 0usize..40,
    ) {
        let n = vectors.len();
        let index = build(vectors);
        let result = index.search(&query, k).unwrap();

        prop_assert_eq!(result.len(), k.min(n));
        for pair in result.hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for (i, hit) in result.iter().enumerate() {
            prop_assert_eq!(hit.rank, i + 1);
            prop_assert!(hit.score <= 1.0 + 1e-5 && hit.score >= -1.0 - 1e-5);
        }
    }

    #[test]
    fn persisted_index_returns_identical_results(
        vectors in proptest::collection::vec(arb_embedding(DIM), 1..20),
        query in arb_embedding(DIM),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let index = build(vectors);
        index.persist(dir.path()).unwrap();
        let loaded = VectorIndex::load(dir.path(), DIM).unwrap();

        prop_assert_eq!(loaded.len(), index.len());
        prop_assert_eq!(
            loaded.search(&query, index.len()).unwrap(),
            index.search(&query, index.len()).unwrap()
        );
    }
}
