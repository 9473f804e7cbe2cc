//! Embedding entries and sets

use std::collections::BTreeMap;

/// A single embedding vector plus the identifier it was written under.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    original_id: String,
    vector: Vec<f64>,
}

impl EmbeddingEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(original_id: impl Into<String>, vector: Vec<f64>) -> Self {
        Self {
            original_id: original_id.into(),
            vector,
        }
    }

    /// Identifier preserved verbatim through encode/decode.
    #[must_use]
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    /// Vector values.
    #[must_use]
    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    /// Consume the entry, returning `(original_id, vector)`.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<f64>) {
        (self.original_id, self.vector)
    }
}

/// Mapping storage key → [`EmbeddingEntry`].
///
/// Iteration is in key order, which keeps encoded bytes reproducible for the
/// same logical content regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingSet {
    entries: BTreeMap<String, EmbeddingEntry>,
}

impl EmbeddingSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `id → vector`, using each id as both storage key and
    /// `original_id`.
    #[must_use]
    pub fn from_vectors<I, K>(vectors: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
        K: Into<String>,
    {
        let entries = vectors
            .into_iter()
            .map(|(id, vector)| {
                let id = id.into();
                (id.clone(), EmbeddingEntry::new(id, vector))
            })
            .collect();
        Self { entries }
    }

    /// Insert an entry under `key`, returning the entry it replaced.
    pub fn insert(&mut self, key: impl Into<String>, entry: EmbeddingEntry) -> Option<EmbeddingEntry> {
        self.entries.insert(key.into(), entry)
    }

    /// Get an entry by storage key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EmbeddingEntry> {
        self.entries.get(key)
    }

    /// Check if a storage key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(storage key, entry)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmbeddingEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Total number of vector values across all entries.
    #[must_use]
    pub fn total_values(&self) -> usize {
        self.entries.values().map(|e| e.vector.len()).sum()
    }

    /// Consume the set into `original_id → vector`.
    ///
    /// If two entries share an `original_id`, the one with the greater
    /// storage key wins.
    #[must_use]
    pub fn into_id_map(self) -> BTreeMap<String, Vec<f64>> {
        self.entries
            .into_values()
            .map(EmbeddingEntry::into_parts)
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, EmbeddingEntry)> for EmbeddingSet {
    fn from_iter<T: IntoIterator<Item = (K, EmbeddingEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        }
    }
}
