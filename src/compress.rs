//! Cel payload compression

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use thiserror::Error;

/// Default zlib level for cel payloads.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Error raised by a [`Compressor`].
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Compression failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid compression level {0} (expected 0-9)")]
    InvalidLevel(u32),
}

/// Turns raw bytes into a zlib-compatible stream.
///
/// Called once per cel, strictly in sequence.
pub trait Compressor {
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CompressError>;
}

/// zlib compression via `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: Compression,
}

impl ZlibCompressor {
    pub fn new(level: u32) -> Result<Self, CompressError> {
        if level > 9 {
            return Err(CompressError::InvalidLevel(level));
        }
        Ok(Self { level: Compression::new(level) })
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self { level: Compression::new(DEFAULT_COMPRESSION_LEVEL) }
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2 + 16), self.level);
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }
}
