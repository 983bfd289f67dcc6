//! Codec trait definitions.

use spillvec_core::Result;

/// Value serializer trait.
///
/// Turns a value into a byte string and back. Implementations must satisfy
/// `deserialize(serialize(v)) == v` for every value in their supported domain.
///
/// Generic over the value type, not per method, so it can be held as a
/// `Box<dyn ValueSerializer<T>>`.
pub trait ValueSerializer<T>: Send + Sync {
    /// Serialize a value.
    ///
    /// Failures are reported as [`spillvec_core::Error::Encoding`].
    fn serialize(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value.
    ///
    /// Failures are reported as [`spillvec_core::Error::Decoding`].
    fn deserialize(&self, bytes: &[u8]) -> Result<T>;

    /// Unique serializer identifier, used in error messages and logs.
    fn serializer_id(&self) -> &'static str;
}

/// Byte compressor trait.
///
/// Every serialized record passes through the compressor before framing.
/// Implementations must satisfy `decompress(compress(b)) == b` for every byte
/// string, including the empty one.
pub trait Compressor: Send + Sync {
    /// Compress bytes for storage.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Reverse the compress operation.
    ///
    /// Returns a decoding error if the data is not valid output of this
    /// compressor (corruption or codec mismatch).
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Unique compressor identifier.
    fn codec_id(&self) -> &'static str;
}
