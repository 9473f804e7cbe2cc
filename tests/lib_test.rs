//! Tests for top-level Companion API

use companion_core::{Companion, Compression, EmbeddingSet, Error, NumericSample};

#[test]
fn test_companion_builder_defaults() {
    let companion = Companion::builder().build().unwrap();
    assert_eq!(companion.codec().compression(), Compression::Zstd);
    assert_eq!(companion.codec().chunk_elements(), 4096);
    assert_eq!(companion.codec(), Companion::default().codec());
}

#[test]
fn test_companion_builder_chain() {
    let companion = Companion::builder()
        .compression(Compression::Lz4)
        .chunk_elements(16)
        .build()
        .unwrap();
    assert_eq!(companion.codec().compression(), Compression::Lz4);
    assert_eq!(companion.codec().chunk_elements(), 16);
}

#[test]
fn test_companion_builder_rejects_bad_chunk_size() {
    for chunk_elements in [0, (1 << 20) + 1, usize::MAX] {
        let result = Companion::builder().chunk_elements(chunk_elements).build();
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "chunk_elements={chunk_elements} should be rejected"
        );
    }
}

#[test]
fn test_companion_test_normal() {
    let companion = Companion::default();
    let sample = NumericSample::new(vec![1.0, 2.0, 4.0]).unwrap();
    let result = companion.test_normal(&sample).unwrap();
    assert!((result.statistic() - 0.964_285_714_285_714_2).abs() < 1e-12);
    assert!(result.is_normal());
}

#[test]
fn test_companion_write_read() {
    let companion = Companion::builder()
        .compression(Compression::None)
        .chunk_elements(2)
        .build()
        .unwrap();
    let set = EmbeddingSet::from_vectors([("a", vec![1.0, 2.0, 3.0]), ("b", vec![])]);
    let container = companion.write(&set).unwrap();
    assert_eq!(companion.read(&container).unwrap(), set);
}
