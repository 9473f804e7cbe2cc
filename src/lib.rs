//! # companion-core: Normality Testing and Embedding Containers
//!
//! **Version**: 0.1.0
//!
//! Two services behind one command surface:
//!
//! - **Normality testing**: Shapiro-Wilk W statistic and p-value for a
//!   numeric sample, with an `is_normal` verdict at the 0.05 level.
//! - **Embedding containers**: a chunked, compressed, checksummed binary
//!   format for named `f64` vectors, carried as base64 text.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Inputs are validated once at the boundary into
//!   typed samples and sets; core code never sees raw JSON
//! - **Jidoka**: Corrupt containers stop decoding with a format error,
//!   never a partial result
//! - **Genchi Genbutsu**: Every command result is logged with the numbers
//!   that produced it
//!
//! ## Example Usage
//!
//! ```rust
//! use companion_core::Companion;
//! use serde_json::json;
//!
//! let companion = Companion::builder().build()?;
//!
//! let reply = companion.handle("test_normal", json!({"data": [2.1, 1.9, 2.4, 2.0, 2.2]}));
//! assert!(reply["p_value"].as_f64().is_some());
//!
//! let written = companion.handle("write_h5", json!({"embeddings": "{\"seq_42\": [0.1, 0.2]}"}));
//! let read = companion.handle("read_h5", json!({"h5_bytes": written["h5_bytes"]}));
//! assert_eq!(read["id2emb"]["seq_42"], json!([0.1, 0.2]));
//! # Ok::<(), companion_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod command;
pub mod embedding;
pub mod error;
pub mod stats;
pub mod telemetry;

pub use command::{Command, CommandOutput};
pub use embedding::{Compression, EmbeddingCodec, EmbeddingSet, EncodedContainer};
pub use error::{Error, ErrorKind, Result};
pub use stats::{NormalityResult, NormalityTester, NumericSample};

/// Entry point holding the normality tester and the container codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Companion {
    tester: NormalityTester,
    codec: EmbeddingCodec,
}

impl Companion {
    /// Create a new companion builder
    #[must_use]
    pub fn builder() -> CompanionBuilder {
        CompanionBuilder::default()
    }

    /// Configured container codec
    #[must_use]
    pub const fn codec(&self) -> &EmbeddingCodec {
        &self.codec
    }

    /// Run the Shapiro-Wilk test on a validated sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Computation`] if the sample has zero range.
    pub fn test_normal(&self, sample: &NumericSample) -> Result<NormalityResult> {
        self.tester.evaluate(sample)
    }

    /// Encode an embedding set into a container.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn write(&self, set: &EmbeddingSet) -> Result<EncodedContainer> {
        self.codec.encode(set)
    }

    /// Decode a container into an embedding set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the container is malformed.
    pub fn read(&self, container: &EncodedContainer) -> Result<EmbeddingSet> {
        self.codec.decode(container)
    }
}

/// Companion builder
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanionBuilder {
    codec: embedding::EmbeddingCodecBuilder,
}

impl CompanionBuilder {
    /// Set chunk compression for written containers
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.codec = self.codec.compression(compression);
        self
    }

    /// Set the number of vector elements per stored chunk
    #[must_use]
    pub const fn chunk_elements(mut self, chunk_elements: usize) -> Self {
        self.codec = self.codec.chunk_elements(chunk_elements);
        self
    }

    /// Build the companion
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the chunk size is out of range
    pub fn build(self) -> Result<Companion> {
        let codec = self.codec.build()?;
        tracing::debug!(
            compression = codec.compression().as_str(),
            chunk_elements = codec.chunk_elements(),
            "companion configured"
        );
        Ok(Companion {
            tester: NormalityTester::new(),
            codec,
        })
    }
}
