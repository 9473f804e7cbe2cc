//! Container wire format primitives
//!
//! ```text
//! header (16 bytes)
//!   0x00 magic           [u8; 4] = b"EMBC"
//!   0x04 version         u8
//!   0x05 compression     u8
//!   0x06 reserved        u16
//!   0x08 chunk_elements  u32
//!   0x0C entry_count     u32
//! entries ...
//! trailer
//!   crc32                u32 over every preceding byte
//! ```
//!
//! All integers little-endian.

use crate::{Error, Result};

/// Container magic bytes
pub const MAGIC: [u8; 4] = *b"EMBC";

/// Current container format version
pub const FORMAT_VERSION: u8 = 1;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Trailer (CRC32) size in bytes
pub const TRAILER_SIZE: usize = 4;

/// Upper bound on elements per chunk; bounds the allocation a single
/// chunk can request during decompression (8 MiB of `f64`)
pub const MAX_CHUNK_ELEMENTS: u32 = 1 << 20;

/// Element type tag for little-endian `f64` values
pub const ELEMENT_F64: u8 = 1;

/// Size of one stored element
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// CRC32 lookup table (IEEE polynomial 0xEDB88320)
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC32 checksum (IEEE)
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[idx];
    }
    !crc
}

/// Container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version
    pub version: u8,
    /// Compression tag (see [`super::Compression::tag`])
    pub compression: u8,
    /// Maximum elements per chunk
    pub chunk_elements: u32,
    /// Number of entries that follow
    pub entry_count: u32,
}

impl Header {
    /// Serialize into exactly [`HEADER_SIZE`] bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0x00..0x04].copy_from_slice(&MAGIC);
        buf[0x04] = self.version;
        buf[0x05] = self.compression;
        // 0x06..0x08 reserved
        buf[0x08..0x0C].copy_from_slice(&self.chunk_elements.to_le_bytes());
        buf[0x0C..0x10].copy_from_slice(&self.entry_count.to_le_bytes());
        buf
    }

    /// Parse and validate a header
    ///
    /// # Errors
    /// Returns [`Error::Format`] on short input, wrong magic, unsupported
    /// version, or a chunk size outside `1..=MAX_CHUNK_ELEMENTS`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.take(4, "magic")?;
        if magic != MAGIC {
            return Err(Error::Format(format!(
                "Not an embedding container: bad magic {magic:02x?}"
            )));
        }
        let version = reader.read_u8("version")?;
        if version != FORMAT_VERSION {
            return Err(Error::Format(format!(
                "Unsupported container version {version} (expected {FORMAT_VERSION})"
            )));
        }
        let compression = reader.read_u8("compression")?;
        let _reserved = reader.read_u16("reserved")?;
        let chunk_elements = reader.read_u32("chunk size")?;
        if chunk_elements == 0 || chunk_elements > MAX_CHUNK_ELEMENTS {
            return Err(Error::Format(format!(
                "Chunk size {chunk_elements} outside 1..={MAX_CHUNK_ELEMENTS}"
            )));
        }
        let entry_count = reader.read_u32("entry count")?;
        Ok(Self {
            version,
            compression,
            chunk_elements,
            entry_count,
        })
    }
}

/// Little-endian append helpers over a growing buffer
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a writer with pre-allocated capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a `u8`
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a little-endian `u32`
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `u64`
    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a `u32` length prefix followed by UTF-8 bytes
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if the string exceeds `u32::MAX` bytes
    pub fn put_str(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len()).map_err(|_| {
            Error::Validation(format!("String of {} bytes is too long to store", value.len()))
        })?;
        self.put_u32(len);
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    /// Append the CRC32 trailer and return the finished buffer
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        let checksum = crc32(&self.buf);
        self.put_u32(checksum);
        self.buf
    }
}

/// Bounds-checked little-endian cursor; every short read is a format error
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader at offset 0
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `len` bytes
    ///
    /// # Errors
    /// Returns [`Error::Format`] naming `what` if fewer than `len` bytes remain
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Format(format!(
                "Truncated container: need {len} bytes for {what} at offset {}, {} available",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    /// Read a `u8`
    ///
    /// # Errors
    /// Returns [`Error::Format`] on truncation
    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take_array::<1>(what)?[0])
    }

    /// Read a little-endian `u16`
    ///
    /// # Errors
    /// Returns [`Error::Format`] on truncation
    pub fn read_u16(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array(what)?))
    }

    /// Read a little-endian `u32`
    ///
    /// # Errors
    /// Returns [`Error::Format`] on truncation
    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array(what)?))
    }

    /// Read a little-endian `u64`
    ///
    /// # Errors
    /// Returns [`Error::Format`] on truncation
    pub fn read_u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array(what)?))
    }

    /// Read a `u32`-length-prefixed UTF-8 string
    ///
    /// # Errors
    /// Returns [`Error::Format`] on truncation or invalid UTF-8
    pub fn read_str(&mut self, what: &str) -> Result<String> {
        let len = self.read_u32(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Format(format!("Invalid UTF-8 in {what}: {e}")))
    }
}

/// Verify size and CRC32 trailer, returning the checked body (header + entries)
///
/// # Errors
/// Returns [`Error::Format`] if the buffer is too small or the checksum
/// does not match
pub fn verify_checksum(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(Error::Format(format!(
            "Container too small: {} bytes",
            bytes.len()
        )));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - TRAILER_SIZE);
    let mut stored = [0u8; TRAILER_SIZE];
    stored.copy_from_slice(trailer);
    let stored = u32::from_le_bytes(stored);
    let computed = crc32(body);
    if stored != computed {
        return Err(Error::Format(format!(
            "Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"
        )));
    }
    Ok(body)
}

/// Encode `f64` values as little-endian bytes
#[must_use]
pub fn f64s_to_le_bytes(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode little-endian bytes into `f64` values (length must be a multiple of 8)
#[must_use]
pub fn le_bytes_to_f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(ELEMENT_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; ELEMENT_SIZE];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}
