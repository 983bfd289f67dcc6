//! Identity compressor (no transformation).
//!
//! This is the default compressor. Serialized bytes pass through unchanged;
//! only the line framing is applied on top.

use super::traits::Compressor;
use spillvec_core::Result;

/// Identity compressor - no transformation.
///
/// # Example
///
/// ```
/// use spillvec_storage::codec::{Compressor, IdentityCompressor};
///
/// let codec = IdentityCompressor;
/// let data = b"hello world";
///
/// let compressed = codec.compress(data).unwrap();
/// assert_eq!(data.as_slice(), compressed.as_slice());
///
/// let decompressed = codec.decompress(&compressed).unwrap();
/// assert_eq!(data.as_slice(), decompressed.as_slice());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompressor;

impl Compressor for IdentityCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &'static str {
        "identity"
    }
}
