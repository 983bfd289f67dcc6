//! spillvec - an ordered sequence that spills to disk
//!
//! Push values one at a time and read them back in push order. A
//! [`HybridBuffer`] keeps items in memory until it holds `item_threshold` of
//! them, then moves everything into a [`RecordStore`]: one encoded record per
//! line on a stream that lives in memory up to a cap and in a temporary file
//! beyond it.
//!
//! # Quick Start
//!
//! ```
//! use spillvec::{BufferConfig, CompressionKind, HybridBuffer};
//!
//! let config = BufferConfig::new(2).with_compression(CompressionKind::None);
//! let mut buffer = HybridBuffer::new(config)?;
//! for n in 0..5u32 {
//!     buffer.push(n)?;
//! }
//!
//! buffer.rewind();
//! let mut seen = Vec::new();
//! while buffer.peek()? {
//!     seen.push((buffer.key(), *buffer.current()?));
//!     buffer.advance()?;
//! }
//! assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
//!
//! let mut json = Vec::new();
//! buffer.write_json(&mut json, false)?;
//! assert_eq!(json, b"[0,1,2,3,4]");
//! # Ok::<(), spillvec::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `spillvec-core`: error type, configuration, line framing
//! - `spillvec-storage`: codecs, spill stream, record store, hybrid buffer

pub use spillvec_core::*;
pub use spillvec_storage::*;
