//! Chunk compression for embedding containers
//!
//! Each vector chunk is compressed independently, so a reader knows the
//! exact decompressed size up front and never inflates more than one chunk
//! at a time.

use crate::{Error, Result};

/// ZSTD level used for container chunks
const ZSTD_LEVEL: i32 = 3;

/// Compression algorithm for container chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Stored as raw little-endian bytes
    None,
    /// LZ4 - Fast compression, good for real-time
    Lz4,
    /// ZSTD - Better ratio, slower (default)
    #[default]
    Zstd,
}

impl Compression {
    /// Get algorithm name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Wire tag stored in the container header
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
            Self::Zstd => 2,
        }
    }

    /// Parse a wire tag
    ///
    /// # Errors
    /// Returns [`Error::Format`] for unknown tags
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            2 => Ok(Self::Zstd),
            other => Err(Error::Format(format!("Unknown compression tag: {other}"))),
        }
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails (e.g., ZSTD internal error)
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lz4 => Ok(lz4_flex::compress(data)),
            Self::Zstd => Ok(zstd::bulk::compress(data, ZSTD_LEVEL)?),
        }
    }

    /// Decompress data that is known to expand to exactly `expected_len` bytes
    ///
    /// # Errors
    /// Returns [`Error::Format`] if decompression fails or the output length
    /// differs from `expected_len` (corrupted data)
    pub fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        if data.is_empty() && expected_len == 0 {
            return Ok(Vec::new());
        }
        let decompressed = match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::decompress(data, expected_len)
                .map_err(|e| Error::Format(format!("LZ4 decompression failed: {e}")))?,
            Self::Zstd => zstd::bulk::decompress(data, expected_len)
                .map_err(|e| Error::Format(format!("ZSTD decompression failed: {e}")))?,
        };
        if decompressed.len() != expected_len {
            return Err(Error::Format(format!(
                "Chunk decompressed to {} bytes, expected {expected_len}",
                decompressed.len()
            )));
        }
        Ok(decompressed)
    }
}
