//! Streaming JSON export
//!
//! Writes a sequence as a JSON array one element at a time, so the whole
//! collection is never materialized. The bytes are identical to what
//! `serde_json::to_writer` (or `to_writer_pretty`) produces for a `Vec` of the
//! same elements.
//!
//! The export is not atomic: if an element fails to decode or encode, the
//! error is returned and the sink keeps whatever was already written.

use serde::ser::{SerializeSeq, Serializer as _};
use serde::Serialize;
use spillvec_core::{Error, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

const JSON_ID: &str = "json";

fn json_error(e: serde_json::Error) -> Error {
    if e.is_io() {
        Error::Io(io::Error::from(e))
    } else {
        Error::encoding(JSON_ID, e)
    }
}

/// Write `items` to `sink` as a JSON array.
///
/// With `pretty`, the output uses `serde_json`'s pretty printer (two-space
/// indent, one element per line). The sink is flushed on success.
pub fn write_json_array<W, T, I>(sink: W, items: I, pretty: bool) -> Result<u64>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = Result<T>>,
{
    let written = if pretty {
        stream_array(serde_json::Serializer::pretty(sink), items)?
    } else {
        stream_array(serde_json::Serializer::new(sink), items)?
    };
    debug!(elements = written, pretty, "Exported sequence as JSON");
    Ok(written)
}

/// Create (or truncate) the file at `path` and write `items` into it as a JSON
/// array.
pub fn write_json_file<P, T, I>(path: P, items: I, pretty: bool) -> Result<u64>
where
    P: AsRef<Path>,
    T: Serialize,
    I: IntoIterator<Item = Result<T>>,
{
    let file = File::create(path.as_ref())?;
    write_json_array(BufWriter::new(file), items, pretty)
}

fn stream_array<W, F, T, I>(mut ser: serde_json::Serializer<W, F>, items: I) -> Result<u64>
where
    W: Write,
    F: serde_json::ser::Formatter,
    T: Serialize,
    I: IntoIterator<Item = Result<T>>,
{
    let mut written = 0u64;
    let mut seq = ser.serialize_seq(None).map_err(json_error)?;
    for item in items {
        seq.serialize_element(&item?).map_err(json_error)?;
        written += 1;
    }
    seq.end().map_err(json_error)?;
    ser.into_inner().flush()?;
    Ok(written)
}
