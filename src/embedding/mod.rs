//! Embedding container module
//!
//! Serializes a named collection of embedding vectors into one
//! self-describing binary blob:
//!
//! ```text
//! EmbeddingSet { key → EmbeddingEntry { original_id, vector } }
//!        │  EmbeddingCodec::encode   (chunk → compress → checksum)
//!        ▼
//! EncodedContainer (bytes)  ──to_base64──►  text-safe transport
//!        │  EmbeddingCodec::decode
//!        ▼
//! EmbeddingSet (identical keys, ids and bit patterns)
//! ```
//!
//! # Example
//!
//! ```rust
//! use companion_core::embedding::{Compression, EmbeddingCodec, EmbeddingSet};
//!
//! let codec = EmbeddingCodec::builder()
//!     .compression(Compression::Lz4)
//!     .chunk_elements(1024)
//!     .build()?;
//!
//! let set = EmbeddingSet::from_vectors([("seq_1", vec![0.5; 2048]), ("seq_2", vec![1.0])]);
//! let container = codec.encode(&set)?;
//! assert_eq!(codec.decode(&container)?, set);
//! # Ok::<(), companion_core::Error>(())
//! ```

mod codec;
mod compression;
pub mod format;
mod set;

pub use codec::{
    EmbeddingCodec, EmbeddingCodecBuilder, EncodedContainer, DEFAULT_CHUNK_ELEMENTS,
    ORIGINAL_ID_ATTR,
};
pub use compression::Compression;
pub use set::{EmbeddingEntry, EmbeddingSet};
