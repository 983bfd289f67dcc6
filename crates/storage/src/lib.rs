//! Storage layer for spillvec
//!
//! This crate implements the spill-to-disk sequence with:
//! - Codec: pluggable serializer + compressor pipeline, one backend per Cargo feature
//! - SpillStream: append-only byte stream spooled in memory, then in a temporary file
//! - RecordStore: framed, encoded records on a spill stream with a single read cursor
//! - HybridBuffer: in-memory list that migrates one-way to a record store past a threshold
//! - Streaming JSON export of either container

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod export;
pub mod hybrid;
mod memory;
pub mod record_store;
pub mod spill;

pub use codec::{compression_available, serializer_available, Codec, Compressor, ValueSerializer};
pub use hybrid::{BufferRecords, HybridBuffer};
pub use record_store::{RecordStore, Records};
pub use spill::SpillStream;
