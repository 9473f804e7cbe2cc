//! Embedding container codec
//!
//! Encodes an [`EmbeddingSet`] into a single self-describing, checksummed
//! byte blob and back. Vectors are split into chunks of at most
//! `chunk_elements` values; each chunk is compressed on its own, so vectors
//! of different lengths share one container without padding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::compression::Compression;
use super::format::{
    f64s_to_le_bytes, le_bytes_to_f64s, verify_checksum, ByteReader, ByteWriter, Header,
    ELEMENT_F64, ELEMENT_SIZE, FORMAT_VERSION, HEADER_SIZE, MAX_CHUNK_ELEMENTS,
};
use super::set::{EmbeddingEntry, EmbeddingSet};
use crate::{Error, Result};

/// Attribute name carrying the entry identifier
pub const ORIGINAL_ID_ATTR: &str = "original_id";

const DEFAULT_CHUNK_ELEMENTS_U32: u32 = 4096;

/// Per-chunk element count and stored length
const CHUNK_PREFIX_SIZE: usize = 8;

/// Default number of values per chunk (32 KiB of `f64`)
pub const DEFAULT_CHUNK_ELEMENTS: usize = DEFAULT_CHUNK_ELEMENTS_U32 as usize;

/// Serialized embedding container.
///
/// Holds raw bytes; [`EncodedContainer::to_base64`] and
/// [`EncodedContainer::from_base64`] cover text-only transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    bytes: Vec<u8>,
}

impl EncodedContainer {
    /// Wrap raw container bytes (not validated until decoded)
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode the base64 text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `text` is not valid base64.
    pub fn from_base64(text: &str) -> Result<Self> {
        Ok(Self::new(STANDARD.decode(text.trim())?))
    }

    /// Base64 text form.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if there are no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for EncodedContainer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Encoder/decoder for embedding containers.
///
/// Immutable after construction; one instance can serve any number of
/// concurrent calls.
///
/// # Example
///
/// ```rust
/// use companion_core::embedding::{EmbeddingCodec, EmbeddingSet};
///
/// let set = EmbeddingSet::from_vectors([("seq_42", vec![0.25, -1.5, 3.0])]);
/// let codec = EmbeddingCodec::default();
///
/// let container = codec.encode(&set)?;
/// let decoded = codec.decode_base64(&container.to_base64())?;
/// assert_eq!(decoded, set);
/// # Ok::<(), companion_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingCodec {
    compression: Compression,
    chunk_elements: u32,
}

impl Default for EmbeddingCodec {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_elements: DEFAULT_CHUNK_ELEMENTS_U32,
        }
    }
}

impl EmbeddingCodec {
    /// Create a codec builder
    #[must_use]
    pub fn builder() -> EmbeddingCodecBuilder {
        EmbeddingCodecBuilder::default()
    }

    /// Compression applied when `compress` is requested
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Maximum values per chunk
    #[must_use]
    pub const fn chunk_elements(&self) -> usize {
        self.chunk_elements as usize
    }

    /// Encode with compression enabled.
    ///
    /// # Errors
    ///
    /// See [`EmbeddingCodec::encode_with`].
    pub fn encode(&self, set: &EmbeddingSet) -> Result<EncodedContainer> {
        self.encode_with(set, true)
    }

    /// Encode, optionally skipping compression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the set has more than `u32::MAX`
    /// entries or a key/identifier is too long to store, and [`Error::Io`]
    /// if the compressor fails.
    pub fn encode_with(&self, set: &EmbeddingSet, compress: bool) -> Result<EncodedContainer> {
        let compression = if compress {
            self.compression
        } else {
            Compression::None
        };
        let entry_count = u32::try_from(set.len())
            .map_err(|_| Error::Validation(format!("Too many entries: {}", set.len())))?;

        let mut writer = ByteWriter::with_capacity(HEADER_SIZE + set.total_values() * ELEMENT_SIZE);
        writer.put_bytes(
            &Header {
                version: FORMAT_VERSION,
                compression: compression.tag(),
                chunk_elements: self.chunk_elements,
                entry_count,
            }
            .to_bytes(),
        );

        for (key, entry) in set.iter() {
            writer.put_str(key)?;
            writer.put_u32(1);
            writer.put_str(ORIGINAL_ID_ATTR)?;
            writer.put_str(entry.original_id())?;
            self.write_vector(&mut writer, entry.vector(), compression)?;
        }

        let bytes = writer.finish();
        tracing::debug!(
            entries = set.len(),
            bytes = bytes.len(),
            compression = compression.as_str(),
            "encoded embedding container"
        );
        Ok(EncodedContainer::new(bytes))
    }

    fn write_vector(
        &self,
        writer: &mut ByteWriter,
        vector: &[f64],
        compression: Compression,
    ) -> Result<()> {
        let chunk_len = self.chunk_elements();
        let chunk_count = u32::try_from(vector.len().div_ceil(chunk_len))
            .map_err(|_| Error::Validation(format!("Vector too long: {}", vector.len())))?;

        writer.put_u8(ELEMENT_F64);
        writer.put_u64(vector.len() as u64);
        writer.put_u32(chunk_count);
        for chunk in vector.chunks(chunk_len) {
            let stored = compression.compress(&f64s_to_le_bytes(chunk))?;
            let stored_len = u32::try_from(stored.len())
                .map_err(|_| Error::Validation(format!("Chunk too large: {}", stored.len())))?;
            // chunk.len() <= chunk_elements, which fits in u32
            #[allow(clippy::cast_possible_truncation)]
            let elements = chunk.len() as u32;
            writer.put_u32(elements);
            writer.put_u32(stored_len);
            writer.put_bytes(&stored);
        }
        Ok(())
    }

    /// Decode a container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the bytes are not a valid container.
    pub fn decode(&self, container: &EncodedContainer) -> Result<EmbeddingSet> {
        self.decode_bytes(container.as_bytes())
    }

    /// Decode a container from its base64 text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for malformed base64 and
    /// [`Error::Format`] if the decoded bytes are not a valid container.
    pub fn decode_base64(&self, text: &str) -> Result<EmbeddingSet> {
        self.decode(&EncodedContainer::from_base64(text)?)
    }

    /// Decode raw container bytes.
    ///
    /// The format is self-describing, so decoding does not depend on this
    /// codec's own compression or chunk settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the bytes are not a valid container.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<EmbeddingSet> {
        let body = verify_checksum(bytes)?;
        let header = Header::from_bytes(body)?;
        let compression = Compression::from_tag(header.compression)?;
        let chunk_cap = header.chunk_elements as usize;

        let mut reader = ByteReader::new(&body[HEADER_SIZE..]);
        let mut set = EmbeddingSet::new();
        for _ in 0..header.entry_count {
            let key = reader.read_str("entry key")?;
            let original_id = read_original_id(&mut reader, &key)?;
            let vector = read_vector(&mut reader, &key, compression, chunk_cap)?;
            if set.contains_key(&key) {
                return Err(Error::Format(format!("Duplicate entry key '{key}'")));
            }
            set.insert(key, EmbeddingEntry::new(original_id, vector));
        }

        if reader.remaining() != 0 {
            return Err(Error::Format(format!(
                "{} unexpected bytes after last entry",
                reader.remaining()
            )));
        }

        tracing::debug!(
            entries = set.len(),
            bytes = bytes.len(),
            compression = compression.as_str(),
            "decoded embedding container"
        );
        Ok(set)
    }
}

fn read_original_id(reader: &mut ByteReader<'_>, key: &str) -> Result<String> {
    let attribute_count = reader.read_u32("attribute count")?;
    let mut original_id = None;
    for _ in 0..attribute_count {
        let name = reader.read_str("attribute name")?;
        let value = reader.read_str("attribute value")?;
        if name == ORIGINAL_ID_ATTR {
            if original_id.is_some() {
                return Err(Error::Format(format!(
                    "Entry '{key}' has more than one '{ORIGINAL_ID_ATTR}' attribute"
                )));
            }
            original_id = Some(value);
        }
    }
    original_id.ok_or_else(|| {
        Error::Format(format!("Entry '{key}' is missing the '{ORIGINAL_ID_ATTR}' attribute"))
    })
}

fn read_vector(
    reader: &mut ByteReader<'_>,
    key: &str,
    compression: Compression,
    chunk_cap: usize,
) -> Result<Vec<f64>> {
    let element_type = reader.read_u8("element type")?;
    if element_type != ELEMENT_F64 {
        return Err(Error::Format(format!(
            "Entry '{key}' has unsupported element type {element_type}"
        )));
    }
    let len = usize::try_from(reader.read_u64("element count")?)
        .map_err(|_| Error::Format(format!("Entry '{key}' is too long for this platform")))?;
    let chunk_count = reader.read_u32("chunk count")? as usize;

    // Layout is fixed by len and chunk_cap: full chunks, then one short tail.
    // Each chunk also needs its 8-byte prefix, so a count the remaining input
    // cannot hold is rejected before anything is inflated.
    let expected_chunks = len.div_ceil(chunk_cap);
    if chunk_count != expected_chunks || chunk_count > reader.remaining() / CHUNK_PREFIX_SIZE {
        return Err(Error::Format(format!(
            "Entry '{key}' declares {len} values in {chunk_count} chunks, \
             expected {expected_chunks} chunks of at most {chunk_cap}"
        )));
    }

    let mut vector = Vec::with_capacity(len.min(chunk_cap));
    for index in 0..chunk_count {
        let expected = chunk_cap.min(len - index * chunk_cap);
        let elements = reader.read_u32("chunk element count")? as usize;
        if elements != expected {
            return Err(Error::Format(format!(
                "Entry '{key}' declares {len} values but chunk {index} holds {elements} \
                 (expected {expected})"
            )));
        }
        let stored_len = reader.read_u32("chunk length")? as usize;
        let stored = reader.take(stored_len, "chunk payload")?;
        let raw = compression.decompress(stored, elements * ELEMENT_SIZE)?;
        vector.extend(le_bytes_to_f64s(&raw));
    }
    Ok(vector)
}


/// Builder for [`EmbeddingCodec`]
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingCodecBuilder {
    compression: Compression,
    chunk_elements: usize,
}

impl Default for EmbeddingCodecBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_elements: DEFAULT_CHUNK_ELEMENTS,
        }
    }
}

impl EmbeddingCodecBuilder {
    /// Set the compression used when encoding with compression enabled
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the maximum number of values per chunk
    #[must_use]
    pub const fn chunk_elements(mut self, chunk_elements: usize) -> Self {
        self.chunk_elements = chunk_elements;
        self
    }

    /// Build the codec
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `chunk_elements` is zero or above
    /// [`MAX_CHUNK_ELEMENTS`]
    pub fn build(self) -> Result<EmbeddingCodec> {
        let chunk_elements = u32::try_from(self.chunk_elements)
            .ok()
            .filter(|n| (1..=MAX_CHUNK_ELEMENTS).contains(n))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "chunk_elements must be in 1..={MAX_CHUNK_ELEMENTS}, got {}",
                    self.chunk_elements
                ))
            })?;
        Ok(EmbeddingCodec {
            compression: self.compression,
            chunk_elements,
        })
    }
}
