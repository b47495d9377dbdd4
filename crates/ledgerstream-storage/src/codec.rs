//! Byte-to-byte compression for stored-event payloads.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use ledgerstream_types::{PersistenceError, PersistenceResult};

/// A reversible byte-to-byte size reduction, applied after transcoding and
/// before ciphering in the mapper pipeline.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>>;
}

/// DEFLATE/zlib compression via `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCompressor {
    level: Compression,
}

impl DeflateCompressor {
    pub fn new() -> Self {
        Self { level: Compression::default() }
    }

    pub fn with_level(level: u32) -> Self {
        Self { level: Compression::new(level) }
    }
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for DeflateCompressor {
    fn compress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(data)
            .map_err(|e| PersistenceError::serialization(format!("compression failed: {e}")))?;
        encoder
            .finish()
            .map_err(|e| PersistenceError::serialization(format!("compression failed: {e}")))
    }

    fn decompress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| PersistenceError::serialization(format!("corrupted compressed data: {e}")))?;
        Ok(out)
    }
}
