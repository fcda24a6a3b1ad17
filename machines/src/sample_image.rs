//! Waveform table loading and validation.
//!
//! Tables come from raw files, byte slices (for testing) or a registered
//! pattern. Bytes are played in order, four to a RAM word, low byte first.
//! A CRC-32 can be checked for tables shipped alongside a known checksum.

use std::path::Path;

use thiserror::Error;

use crate::registry::PatternEntry;

/// Largest table the 8-bit `max_address` field can cover.
pub const MAX_IMAGE_WORDS: usize = 255;
pub const MAX_IMAGE_BYTES: usize = MAX_IMAGE_WORDS * 4;

/// Errors that can occur when building a sample image.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sample image is empty")]
    Empty,

    #[error("sample image spans {words} words, at most {limit} fit")]
    TooLarge { words: usize, limit: usize },

    #[error("CRC32 expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// CRC-32 (reflected, polynomial 0xEDB88320) as used by zip and PNG.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

/// A validated waveform table, ready to be packed into sample RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleImage {
    bytes: Vec<u8>,
}

impl SampleImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SampleLoadError> {
        if bytes.is_empty() {
            return Err(SampleLoadError::Empty);
        }
        let words = bytes.len().div_ceil(4);
        if words > MAX_IMAGE_WORDS {
            return Err(SampleLoadError::TooLarge {
                words,
                limit: MAX_IMAGE_WORDS,
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Read a raw 8-bit table from disk.
    pub fn from_file(path: &Path) -> Result<Self, SampleLoadError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Render `len` samples of a registered pattern.
    pub fn from_pattern(pattern: &PatternEntry, len: usize) -> Result<Self, SampleLoadError> {
        Self::from_bytes(&(pattern.generate)(len))
    }

    /// Fail with [`SampleLoadError::ChecksumMismatch`] unless the table's
    /// CRC-32 equals `expected`.
    pub fn verify_crc32(&self, expected: u32) -> Result<(), SampleLoadError> {
        let actual = self.crc32();
        if actual != expected {
            return Err(SampleLoadError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn crc32(&self) -> u32 {
        crc32(&self.bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of RAM words the table spans, a trailing partial word included.
    /// This is the `max_address` that plays the whole table.
    pub fn max_address(&self) -> u8 {
        self.bytes.len().div_ceil(4) as u8
    }

    /// Bytes in the order playback emits them, including the zero padding
    /// of a trailing partial word.
    pub fn playback_order(&self) -> impl Iterator<Item = u8> + Clone + '_ {
        let padded = self.max_address() as usize * 4;
        self.bytes
            .iter()
            .copied()
            .chain(std::iter::repeat(0))
            .take(padded)
    }
}
