//! Record codec pipeline.
//!
//! Every record written to a spill stream goes through a serializer and then a
//! compressor; reads apply the exact inverse:
//!
//! ```text
//! write:  value --serialize--> bytes --compress--> bytes --frame--> line
//! read:   line --unframe--> bytes --decompress--> bytes --deserialize--> value
//! ```
//!
//! The pair is chosen by [`SerializerKind`] and [`CompressionKind`] and is
//! resolved once, when a store is constructed, into a [`Codec`] holding two
//! trait objects. Asking for a backend whose Cargo feature is disabled is a
//! configuration error at that point and can never surface during push or
//! read.
//!
//! # Usage
//!
//! ```
//! use spillvec_storage::codec::Codec;
//! use spillvec_core::{CompressionKind, SerializerKind};
//!
//! let codec = Codec::<Vec<String>>::resolve(SerializerKind::Native, CompressionKind::None).unwrap();
//! let value = vec!["a\\b\rc\nd".to_string()];
//!
//! let bytes = codec.encode(&value).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), value);
//! ```

mod compressor;
mod identity;
mod serializer;
mod traits;

#[cfg(feature = "deflate")]
pub use compressor::DeflateCompressor;
#[cfg(feature = "lz4")]
pub use compressor::Lz4BlockCompressor;
#[cfg(feature = "zstd")]
pub use compressor::ZstdCompressor;
pub use identity::IdentityCompressor;
#[cfg(feature = "compact")]
pub use serializer::BincodeSerializer;
pub use serializer::JsonSerializer;
#[cfg(feature = "msgpack")]
pub use serializer::MsgpackSerializer;
pub use traits::{Compressor, ValueSerializer};

use serde::{de::DeserializeOwned, Serialize};
use spillvec_core::{CompressionKind, Error, Result, SerializerKind};
use std::fmt;

/// Cargo feature that gates a serializer, if any.
fn serializer_feature(kind: SerializerKind) -> Option<&'static str> {
    match kind {
        SerializerKind::Native => None,
        SerializerKind::Compact => Some("compact"),
        SerializerKind::SchemaLessBinary => Some("msgpack"),
    }
}

/// Cargo feature that gates a compressor, if any.
fn compression_feature(kind: CompressionKind) -> Option<&'static str> {
    match kind {
        CompressionKind::None => None,
        CompressionKind::Deflate => Some("deflate"),
        CompressionKind::Block => Some("lz4"),
        CompressionKind::Zstd => Some("zstd"),
    }
}

/// Returns true if the serializer backend is compiled in.
pub fn serializer_available(kind: SerializerKind) -> bool {
    match kind {
        SerializerKind::Native => true,
        SerializerKind::Compact => cfg!(feature = "compact"),
        SerializerKind::SchemaLessBinary => cfg!(feature = "msgpack"),
    }
}

/// Returns true if the compression backend is compiled in.
pub fn compression_available(kind: CompressionKind) -> bool {
    match kind {
        CompressionKind::None => true,
        CompressionKind::Deflate => cfg!(feature = "deflate"),
        CompressionKind::Block => cfg!(feature = "lz4"),
        CompressionKind::Zstd => cfg!(feature = "zstd"),
    }
}

/// Resolve a serializer kind into a strategy object.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the backend is compiled out.
pub fn resolve_serializer<T>(kind: SerializerKind) -> Result<Box<dyn ValueSerializer<T>>>
where
    T: Serialize + DeserializeOwned,
{
    match kind {
        SerializerKind::Native => Ok(Box::new(JsonSerializer)),
        #[cfg(feature = "compact")]
        SerializerKind::Compact => Ok(Box::new(BincodeSerializer)),
        #[cfg(feature = "msgpack")]
        SerializerKind::SchemaLessBinary => Ok(Box::new(MsgpackSerializer)),
        #[allow(unreachable_patterns)]
        other => Err(Error::configuration(format!(
            "serializer '{}' is not available (enable the '{}' feature)",
            other,
            serializer_feature(other).unwrap_or("default")
        ))),
    }
}

/// Resolve a compression kind into a strategy object.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the backend is compiled out.
pub fn resolve_compressor(kind: CompressionKind) -> Result<Box<dyn Compressor>> {
    match kind {
        CompressionKind::None => Ok(Box::new(IdentityCompressor)),
        #[cfg(feature = "deflate")]
        CompressionKind::Deflate => Ok(Box::new(DeflateCompressor::default())),
        #[cfg(feature = "lz4")]
        CompressionKind::Block => Ok(Box::new(Lz4BlockCompressor)),
        #[cfg(feature = "zstd")]
        CompressionKind::Zstd => Ok(Box::new(ZstdCompressor::default())),
        #[allow(unreachable_patterns)]
        other => Err(Error::configuration(format!(
            "compression '{}' is not available (enable the '{}' feature)",
            other,
            compression_feature(other).unwrap_or("default")
        ))),
    }
}

/// A resolved serializer + compressor pair.
pub struct Codec<T> {
    serializer: Box<dyn ValueSerializer<T>>,
    compressor: Box<dyn Compressor>,
}

impl<T> Codec<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Resolve both halves of the pipeline.
    pub fn resolve(serializer: SerializerKind, compression: CompressionKind) -> Result<Self> {
        Ok(Self {
            serializer: resolve_serializer(serializer)?,
            compressor: resolve_compressor(compression)?,
        })
    }

    /// Build a codec from explicit strategy objects.
    pub fn from_parts(
        serializer: Box<dyn ValueSerializer<T>>,
        compressor: Box<dyn Compressor>,
    ) -> Self {
        Self {
            serializer,
            compressor,
        }
    }

    /// Serialize, then compress.
    pub fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let serialized = self.serializer.serialize(value)?;
        self.compressor.compress(&serialized)
    }

    /// Decompress, then deserialize.
    pub fn decode(&self, bytes: &[u8]) -> Result<T> {
        let serialized = self.compressor.decompress(bytes)?;
        self.serializer.deserialize(&serialized)
    }
}

impl<T> Codec<T> {
    /// Identifier of the form `serializer+compressor`, e.g. `json+deflate`.
    pub fn codec_id(&self) -> String {
        format!(
            "{}+{}",
            self.serializer.serializer_id(),
            self.compressor.codec_id()
        )
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("serializer", &self.serializer.serializer_id())
            .field("compressor", &self.compressor.codec_id())
            .finish()
    }
}
