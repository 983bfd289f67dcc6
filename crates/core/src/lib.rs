//! Core types for spillvec
//!
//! This crate defines the foundational pieces shared by the storage layer:
//! - Error: Error type hierarchy and `Result` alias
//! - Config: codec selection, memory cap and item threshold (`BufferConfig`, `StoreConfig`)
//! - Framing: escaping of arbitrary record bytes into exactly one line
//!
//! Nothing in this crate performs I/O on the spill stream.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod framing;

pub use config::{
    BufferConfig, CompressionKind, SerializerKind, StoreConfig, BYTES_PER_MIB,
    DEFAULT_ITEM_THRESHOLD, DEFAULT_MEMORY_CAP_MIB,
};
pub use error::{Error, Result};
pub use framing::{frame, frame_into, unframe, LINE_TERMINATOR};
