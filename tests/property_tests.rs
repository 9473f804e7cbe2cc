//! Property-based tests for companion-core
//!
//! - Test mathematical invariants of the W statistic
//! - Test data integrity of the container codec
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use companion_core::embedding::{Compression, EmbeddingCodec, EmbeddingSet};
use companion_core::stats::{NormalityTester, NumericSample, SIGNIFICANCE_LEVEL};
use companion_core::NormalityResult;
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Generate a non-constant sample of 3..=200 values
fn arb_sample() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-1000.0f64..1000.0, 3..=200)
        .prop_filter("sample must not be constant", |values| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            max - min > 1.0
        })
}

/// Generate any finite f64, including subnormals and signed zero
fn arb_finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |v| v.is_finite())
}

/// Generate an embedding set with up to 8 entries and arbitrary keys
fn arb_embedding_set() -> impl Strategy<Value = EmbeddingSet> {
    proptest::collection::btree_map(
        "\\PC{0,12}",
        proptest::collection::vec(arb_finite_f64(), 0..64),
        0..8,
    )
    .prop_map(|vectors| EmbeddingSet::from_vectors(vectors))
}

fn arb_compression() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::None),
        Just(Compression::Lz4),
        Just(Compression::Zstd),
    ]
}

fn evaluate(values: Vec<f64>) -> NormalityResult {
    let sample = NumericSample::new(values).unwrap();
    NormalityTester::new().evaluate(&sample).unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Normality Properties
    // ========================================================================

    /// Property: W and p-value stay in range, and is_normal follows p
    #[test]
    fn prop_result_in_range(values in arb_sample()) {
        let result = evaluate(values);
        prop_assert!(result.statistic() > 0.0 && result.statistic() <= 1.0 + 1e-12);
        prop_assert!((0.0..=1.0).contains(&result.p_value()));
        prop_assert_eq!(result.is_normal(), result.p_value() > SIGNIFICANCE_LEVEL);
    }

    /// Property: evaluation is deterministic
    #[test]
    fn prop_evaluate_deterministic(values in arb_sample()) {
        prop_assert_eq!(evaluate(values.clone()), evaluate(values));
    }

    /// Property: W does not depend on input order
    #[test]
    fn prop_order_independent(values in arb_sample()) {
        let mut reversed = values.clone();
        reversed.reverse();
        let a = evaluate(values);
        let b = evaluate(reversed);
        prop_assert!((a.statistic() - b.statistic()).abs() < 1e-12);
    }

    /// Property: W is invariant under positive affine transforms
    #[test]
    fn prop_shift_scale_invariant(
        values in arb_sample(),
        scale in 0.01f64..100.0,
        shift in -1000.0f64..1000.0
    ) {
        let transformed: Vec<f64> = values.iter().map(|v| v * scale + shift).collect();
        let a = evaluate(values);
        let b = evaluate(transformed);
        prop_assert!(
            (a.statistic() - b.statistic()).abs() < 1e-6,
            "W changed: {} vs {}", a.statistic(), b.statistic()
        );
    }

    // ========================================================================
    // Codec Properties
    // ========================================================================

    /// Property: decode(encode(s)) == s for every compression and chunk size
    #[test]
    fn prop_codec_round_trip(
        set in arb_embedding_set(),
        compression in arb_compression(),
        chunk_elements in 1usize..100
    ) {
        let codec = EmbeddingCodec::builder()
            .compression(compression)
            .chunk_elements(chunk_elements)
            .build()
            .unwrap();
        let container = codec.encode(&set).unwrap();
        let decoded = codec.decode_base64(&container.to_base64()).unwrap();
        for (key, entry) in set.iter() {
            let other = decoded.get(key).unwrap();
            prop_assert_eq!(entry.original_id(), other.original_id());
            let expected: Vec<u64> = entry.vector().iter().map(|v| v.to_bits()).collect();
            let actual: Vec<u64> = other.vector().iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(expected, actual);
        }
        prop_assert_eq!(decoded.len(), set.len());
    }

    /// Property: encoding the same set twice yields identical bytes
    #[test]
    fn prop_encode_deterministic(set in arb_embedding_set(), compression in arb_compression()) {
        let codec = EmbeddingCodec::builder().compression(compression).build().unwrap();
        prop_assert_eq!(codec.encode(&set).unwrap(), codec.encode(&set).unwrap());
    }

    /// Property: truncating a container never decodes successfully
    #[test]
    fn prop_truncation_rejected(set in arb_embedding_set(), cut in 1usize..64) {
        let bytes = EmbeddingCodec::default().encode(&set).unwrap().into_bytes();
        let len = bytes.len().saturating_sub(cut);
        prop_assert!(EmbeddingCodec::default().decode_bytes(&bytes[..len]).is_err());
    }
}
