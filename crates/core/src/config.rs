//! Buffer configuration
//!
//! Configuration is plain data: codec selection, the spill stream's memory cap
//! and the hybrid buffer's item threshold. It can be built in code with the
//! `with_*` setters or loaded from TOML:
//!
//! ```toml
//! item_threshold = 10000
//! memory_cap_mib = 64
//! serializer = "compact"
//! compression = "deflate"
//! ```
//!
//! Omitted keys take their defaults. Whether a codec backend is actually
//! compiled in is checked later, when a store or buffer is constructed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Bytes per MiB, used to turn `memory_cap_mib` into a byte budget.
pub const BYTES_PER_MIB: usize = 1024 * 1024;

/// Default in-memory budget of a spill stream before it rolls over to disk.
pub const DEFAULT_MEMORY_CAP_MIB: usize = 1024;

/// Default number of items a hybrid buffer keeps in memory before spilling.
pub const DEFAULT_ITEM_THRESHOLD: usize = 10_000;

/// Value serializer applied to each record before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    /// Self-describing JSON. Round-trips any serde value.
    #[default]
    Native,
    /// bincode. Smallest and fastest, but not self-describing.
    Compact,
    /// MessagePack with named fields.
    SchemaLessBinary,
}

impl SerializerKind {
    /// All serializer kinds, in declaration order.
    pub const ALL: [SerializerKind; 3] = [
        SerializerKind::Native,
        SerializerKind::Compact,
        SerializerKind::SchemaLessBinary,
    ];

    /// Stable name, matching the TOML spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SerializerKind::Native => "native",
            SerializerKind::Compact => "compact",
            SerializerKind::SchemaLessBinary => "schema_less_binary",
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte compressor applied to each serialized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    /// No compression.
    #[default]
    None,
    /// Raw DEFLATE (no zlib or gzip header).
    Deflate,
    /// LZ4 block format with a prepended size.
    Block,
    /// Zstandard frame.
    Zstd,
}

impl CompressionKind {
    /// All compression kinds, in declaration order.
    pub const ALL: [CompressionKind; 4] = [
        CompressionKind::None,
        CompressionKind::Deflate,
        CompressionKind::Block,
        CompressionKind::Zstd,
    ];

    /// Stable name, matching the TOML spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionKind::None => "none",
            CompressionKind::Deflate => "deflate",
            CompressionKind::Block => "block",
            CompressionKind::Zstd => "zstd",
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of a single record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// In-memory budget of the spill stream in MiB before it rolls over to a
    /// temporary file.
    pub memory_cap_mib: usize,
    /// Value serializer.
    pub serializer: SerializerKind,
    /// Record compressor.
    pub compression: CompressionKind,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            memory_cap_mib: DEFAULT_MEMORY_CAP_MIB,
            serializer: SerializerKind::default(),
            compression: CompressionKind::default(),
        }
    }
}

impl StoreConfig {
    /// Set the in-memory budget in MiB
    pub fn with_memory_cap_mib(mut self, mib: usize) -> Self {
        self.memory_cap_mib = mib;
        self
    }

    /// Set the serializer
    pub fn with_serializer(mut self, serializer: SerializerKind) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set the compressor
    pub fn with_compression(mut self, compression: CompressionKind) -> Self {
        self.compression = compression;
        self
    }

    /// In-memory budget in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the cap is zero or overflows `usize`.
    pub fn memory_cap_bytes(&self) -> Result<usize> {
        if self.memory_cap_mib == 0 {
            return Err(Error::configuration("memory_cap_mib must be at least 1"));
        }
        self.memory_cap_mib
            .checked_mul(BYTES_PER_MIB)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "memory_cap_mib {} overflows the addressable size",
                    self.memory_cap_mib
                ))
            })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.memory_cap_bytes().map(|_| ())
    }
}

/// Configuration of a hybrid buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Number of items held in memory before every item moves to the spill
    /// stream. Must be at least 1.
    pub item_threshold: usize,
    /// In-memory budget of the spill stream in MiB.
    pub memory_cap_mib: usize,
    /// Value serializer.
    pub serializer: SerializerKind,
    /// Record compressor.
    pub compression: CompressionKind,
}

impl Default for BufferConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        BufferConfig {
            item_threshold: DEFAULT_ITEM_THRESHOLD,
            memory_cap_mib: store.memory_cap_mib,
            serializer: store.serializer,
            compression: store.compression,
        }
    }
}

impl BufferConfig {
    /// Create config with the given item threshold and default codecs
    pub fn new(item_threshold: usize) -> Self {
        BufferConfig {
            item_threshold,
            ..Default::default()
        }
    }

    /// Set the item threshold
    pub fn with_item_threshold(mut self, item_threshold: usize) -> Self {
        self.item_threshold = item_threshold;
        self
    }

    /// Set the in-memory budget of the spill stream in MiB
    pub fn with_memory_cap_mib(mut self, mib: usize) -> Self {
        self.memory_cap_mib = mib;
        self
    }

    /// Set the serializer
    pub fn with_serializer(mut self, serializer: SerializerKind) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set the compressor
    pub fn with_compression(mut self, compression: CompressionKind) -> Self {
        self.compression = compression;
        self
    }

    /// The configuration of the store this buffer spills into.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            memory_cap_mib: self.memory_cap_mib,
            serializer: self.serializer,
            compression: self.compression,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.item_threshold == 0 {
            return Err(Error::configuration("item_threshold must be at least 1"));
        }
        self.store_config().validate()
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BufferConfig = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("failed to serialize config: {}", e)))
    }
}
