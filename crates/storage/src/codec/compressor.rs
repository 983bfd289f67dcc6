//! Byte compressors backed by optional crates.
//!
//! Each backend sits behind its own Cargo feature. A store asking for a
//! backend that is compiled out fails at construction, see
//! [`resolve_compressor`](super::resolve_compressor).

#[cfg(feature = "deflate")]
use std::io::{Read, Write};

#[cfg(any(feature = "deflate", feature = "lz4", feature = "zstd"))]
use super::traits::Compressor;
#[cfg(any(feature = "deflate", feature = "lz4", feature = "zstd"))]
use spillvec_core::{Error, Result};

/// Raw DEFLATE (RFC 1951), no zlib or gzip header.
#[cfg(feature = "deflate")]
#[derive(Debug, Clone, Copy)]
pub struct DeflateCompressor {
    level: u32,
}

#[cfg(feature = "deflate")]
impl DeflateCompressor {
    /// Create a compressor with the given level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

#[cfg(feature = "deflate")]
impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "deflate")]
impl Compressor for DeflateCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = flate2::write::DeflateEncoder::new(
            Vec::with_capacity(data.len() / 2 + 16),
            flate2::Compression::new(self.level),
        );
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::encoding(self.codec_id(), e))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = flate2::read::DeflateDecoder::new(data);
        let mut decompressed = Vec::with_capacity(data.len() * 2);
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::decoding(self.codec_id(), e, data.len()))?;
        Ok(decompressed)
    }

    fn codec_id(&self) -> &'static str {
        "deflate"
    }
}

/// Upper bound on how many output bytes one LZ4 input byte can produce.
#[cfg(feature = "lz4")]
const LZ4_MAX_EXPANSION: usize = 255;

/// LZ4 block format with the uncompressed size prepended.
#[cfg(feature = "lz4")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4BlockCompressor;

#[cfg(feature = "lz4")]
impl Compressor for Lz4BlockCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (prefix, block) = match data {
            [a, b, c, d, block @ ..] => (u32::from_le_bytes([*a, *b, *c, *d]) as usize, block),
            _ => {
                return Err(Error::decoding(
                    self.codec_id(),
                    "missing size prefix",
                    data.len(),
                ))
            }
        };

        // A block can never expand by more than LZ4_MAX_EXPANSION.
        let bound = block
            .len()
            .saturating_mul(LZ4_MAX_EXPANSION)
            .saturating_add(LZ4_MAX_EXPANSION);
        if prefix > bound {
            return Err(Error::decoding(
                self.codec_id(),
                format!("size prefix {} exceeds bound {} for block", prefix, bound),
                data.len(),
            ));
        }

        let decompressed = lz4_flex::block::decompress(block, prefix)
            .map_err(|e| Error::decoding(self.codec_id(), e, data.len()))?;
        if decompressed.len() != prefix {
            return Err(Error::decoding(
                self.codec_id(),
                format!(
                    "decompressed {} bytes, size prefix says {}",
                    decompressed.len(),
                    prefix
                ),
                data.len(),
            ));
        }
        Ok(decompressed)
    }

    fn codec_id(&self) -> &'static str {
        "lz4-block"
    }
}

/// Zstandard frame compression.
#[cfg(feature = "zstd")]
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

#[cfg(feature = "zstd")]
impl ZstdCompressor {
    /// Create a compressor with the given level (0 means the zstd default).
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

#[cfg(feature = "zstd")]
impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(zstd::DEFAULT_COMPRESSION_LEVEL)
    }
}

#[cfg(feature = "zstd")]
impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::encode_all(data, self.level).map_err(|e| Error::encoding(self.codec_id(), e))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| Error::decoding(self.codec_id(), e, data.len()))
    }

    fn codec_id(&self) -> &'static str {
        "zstd"
    }
}
