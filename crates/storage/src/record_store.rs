//! Record store: the spill-backed, single-cursor sequence
//!
//! A [`RecordStore`] appends every pushed value to a [`SpillStream`] as one
//! framed line and reads them back in push order:
//!
//! ```text
//! push:    value -> Codec::encode -> frame -> SpillStream::append
//! advance: SpillStream::read_line -> unframe -> Codec::decode -> current
//! ```
//!
//! ## Cursor protocol
//!
//! The store is its own (and only) cursor:
//!
//! - [`rewind`](RecordStore::rewind) moves back to the first record.
//! - [`advance`](RecordStore::advance) decodes the next record into the cursor,
//!   or clears it when every record has been produced.
//! - [`peek`](RecordStore::peek) advances only if the cursor is empty, then
//!   reports whether a value is available. Calling it before the first
//!   `advance` therefore consumes the first record; treat "is there a value"
//!   and "advance" as one coupled step.
//! - [`current`](RecordStore::current) borrows the decoded value.
//! - [`key`](RecordStore::key) is the 0-based index of that value.
//!
//! ```text
//! store.rewind();
//! while store.peek()? {
//!     let value = store.current()?;
//!     let index = store.key();
//!     store.advance()?;
//! }
//! ```
//!
//! Bulk exports ([`records`](RecordStore::records), [`to_vec`](RecordStore::to_vec),
//! [`write_json`](RecordStore::write_json), ...) run their own pass from the
//! start and put the cursor back where it was afterwards.

use crate::codec::Codec;
use crate::export;
use crate::spill::SpillStream;
use serde::{de::DeserializeOwned, Serialize};
use spillvec_core::{frame_into, unframe, Error, Result, StoreConfig};
use std::fmt;
use std::io::Write;
use std::iter::FusedIterator;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Append-only sequence of encoded records on a spill stream.
pub struct RecordStore<T> {
    /// Spill medium, owned exclusively and released on drop
    stream: SpillStream,

    /// Resolved serializer + compressor
    codec: Codec<T>,

    /// Configuration the store was opened with
    config: StoreConfig,

    /// Records appended; only ever grows
    write_count: u64,

    /// Records produced since the last rewind
    read_index: u64,

    /// Most recently produced value
    current: Option<T>,

    /// Scratch buffer for framing and line reads
    line: Vec<u8>,
}

/// Cursor state set aside while an export pass runs.
struct SavedCursor<T> {
    read_pos: u64,
    read_index: u64,
    current: Option<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the memory cap is invalid or a codec
    /// backend is not compiled in.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let memory_cap = config.memory_cap_bytes()?;
        let codec = Codec::resolve(config.serializer, config.compression)?;
        debug!(codec = %codec.codec_id(), memory_cap, "Opened record store");

        Ok(Self {
            stream: SpillStream::new(memory_cap),
            codec,
            config,
            write_count: 0,
            read_index: 0,
            current: None,
            line: Vec::new(),
        })
    }

    /// Encode `value` and append it as one record.
    ///
    /// # Errors
    ///
    /// [`Error::Encoding`] if serialization or compression fails,
    /// [`Error::Io`] if the append fails. The count is unchanged on error.
    pub fn push(&mut self, value: &T) -> Result<()> {
        let encoded = self.codec.encode(value)?;
        self.line.clear();
        frame_into(&encoded, &mut self.line);
        self.stream.append(&self.line)?;
        self.write_count += 1;

        trace!(
            index = self.write_count - 1,
            bytes = self.line.len(),
            "Record appended"
        );
        Ok(())
    }

    /// Encode every value and append them with a single write.
    ///
    /// Either every record is appended or none is: the count only moves once
    /// the whole batch is on the stream. Returns the number of records
    /// appended.
    pub fn extend<'a, I>(&mut self, values: I) -> Result<u64>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut batch = Vec::new();
        let mut records = 0u64;
        for value in values {
            let encoded = self.codec.encode(value)?;
            frame_into(&encoded, &mut batch);
            records += 1;
        }
        if records == 0 {
            return Ok(0);
        }

        self.stream.append(&batch)?;
        self.write_count += records;
        debug!(records, bytes = batch.len(), "Record batch appended");
        Ok(records)
    }

    /// Move the cursor back before the first record.
    ///
    /// Clears the current value. Stored data is never touched, so any number
    /// of full passes can be made.
    pub fn rewind(&mut self) {
        self.stream.rewind();
        self.read_index = 0;
        self.current = None;
    }

    /// Decode the next record into the cursor.
    ///
    /// Once every record has been produced the cursor is cleared and `Ok(())`
    /// is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the read fails, [`Error::Decoding`] if the record
    /// cannot be unframed, decompressed or deserialized. The cursor is empty
    /// after an error.
    pub fn advance(&mut self) -> Result<()> {
        self.current = None;
        self.current = self.read_next()?;
        Ok(())
    }

    /// Report whether a value is available, advancing first if the cursor is
    /// empty.
    ///
    /// Never returns a state error: an empty or exhausted store simply
    /// reports `false`.
    pub fn peek(&mut self) -> Result<bool> {
        if self.current.is_none() {
            self.advance()?;
        }
        Ok(self.current.is_some())
    }

    /// Read and decode the record at the read position, if any is left.
    fn read_next(&mut self) -> Result<Option<T>> {
        if self.read_index >= self.write_count {
            return Ok(None);
        }
        self.line.clear();
        if self.stream.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }

        let index = self.read_index;
        self.read_index += 1;

        let codec = &self.codec;
        match unframe(&self.line).and_then(|payload| codec.decode(&payload)) {
            Ok(value) => {
                trace!(index, bytes = self.line.len(), "Record read");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(index, codec = %codec.codec_id(), error = %e, "Failed to decode spilled record");
                Err(e)
            }
        }
    }

    /// Lazily decode every record from the start.
    ///
    /// The pass is independent of the cursor: the cursor's position and
    /// current value are restored when the returned iterator is dropped. Call
    /// [`Records::cancel`] to stop early.
    pub fn records(&mut self) -> Records<'_, T> {
        let saved = SavedCursor {
            read_pos: self.stream.read_position(),
            read_index: self.read_index,
            current: self.current.take(),
        };
        self.stream.rewind();
        self.read_index = 0;

        Records {
            store: self,
            saved: Some(saved),
            done: false,
        }
    }

    /// Decode every record into a `Vec`, in push order.
    pub fn to_vec(&mut self) -> Result<Vec<T>> {
        self.records().collect()
    }

    /// Decode every record into a fixed-length boxed slice, in push order.
    pub fn to_boxed_slice(&mut self) -> Result<Box<[T]>> {
        Ok(self.to_vec()?.into_boxed_slice())
    }

    /// Stream every record to `sink` as a JSON array.
    ///
    /// Not atomic: on error the sink keeps whatever was already written.
    pub fn write_json<W: Write>(&mut self, sink: W, pretty: bool) -> Result<()> {
        export::write_json_array(sink, self.records(), pretty).map(|_| ())
    }

    /// Create the file at `path` and stream every record into it as a JSON
    /// array.
    pub fn write_json_file<P: AsRef<Path>>(&mut self, path: P, pretty: bool) -> Result<()> {
        export::write_json_file(path, self.records(), pretty).map(|_| ())
    }
}

impl<T> RecordStore<T> {
    /// The value at the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::State`] if no value has been produced since the last rewind,
    /// or the records are exhausted.
    pub fn current(&self) -> Result<&T> {
        self.current.as_ref().ok_or_else(|| {
            Error::State(
                "no current record (call advance() or peek() first, or the store is exhausted)"
                    .to_string(),
            )
        })
    }

    /// 0-based index of the value at the cursor.
    pub fn key(&self) -> u64 {
        self.read_index.saturating_sub(1)
    }

    /// Number of records ever pushed, independent of the cursor.
    pub fn count(&self) -> u64 {
        self.write_count
    }

    /// Returns true if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.write_count == 0
    }

    /// Byte length of the spill stream as reported by the medium, or `None` if
    /// the medium cannot tell.
    pub fn size_in_bytes(&mut self) -> Option<u64> {
        self.stream.medium_len()
    }

    /// Returns true once the spill stream has outgrown its memory cap and
    /// moved to a temporary file.
    pub fn is_on_disk(&self) -> bool {
        self.stream.is_rolled()
    }

    /// Configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Identifier of the codec pair, e.g. `json+deflate`.
    pub fn codec_id(&self) -> String {
        self.codec.codec_id()
    }

    fn restore_cursor(&mut self, saved: SavedCursor<T>) {
        self.stream.set_read_position(saved.read_pos);
        self.read_index = saved.read_index;
        self.current = saved.current;
    }
}

impl<T> fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("codec", &self.codec)
            .field("stream", &self.stream)
            .field("write_count", &self.write_count)
            .field("read_index", &self.read_index)
            .field("positioned", &self.current.is_some())
            .finish()
    }
}

/// Lazy, forward-only pass over a [`RecordStore`].
///
/// Created by [`RecordStore::records`]. Yields `Result<T>` in push order and
/// stops after the first error. The store's own cursor is restored on drop.
pub struct Records<'a, T> {
    store: &'a mut RecordStore<T>,
    saved: Option<SavedCursor<T>>,
    done: bool,
}

impl<T> Records<'_, T> {
    /// Stop the pass. No further records are produced.
    pub fn cancel(&mut self) {
        self.done = true;
    }

    /// Returns true once the pass is exhausted, failed or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.done
    }
}

impl<T> Iterator for Records<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.read_next() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.store.write_count.saturating_sub(self.store.read_index);
        (0, usize::try_from(remaining).ok())
    }
}

impl<T> FusedIterator for Records<'_, T> where T: Serialize + DeserializeOwned {}

impl<T> Drop for Records<'_, T> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.store.restore_cursor(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use spillvec_core::SerializerKind;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        idx: u32,
        text: String,
    }

    fn entry(idx: u32) -> Entry {
        Entry {
            idx,
            text: format!("entry {}\r\n\\", idx),
        }
    }

    fn store() -> RecordStore<Entry> {
        RecordStore::open(StoreConfig::default()).unwrap()
    }

    fn filled(n: u32) -> RecordStore<Entry> {
        let mut store = store();
        for i in 0..n {
            store.push(&entry(i)).unwrap();
        }
        store
    }

    /// Drive the cursor protocol the way a `for` loop over the store would.
    fn drain(store: &mut RecordStore<Entry>) -> Vec<(u64, Entry)> {
        let mut out = Vec::new();
        store.rewind();
        while store.peek().unwrap() {
            out.push((store.key(), store.current().unwrap().clone()));
            store.advance().unwrap();
        }
        out
    }

    #[test]
    fn test_empty_store_peek_is_false() {
        let mut store = store();
        assert!(!store.peek().unwrap());
        assert!(!store.peek().unwrap());
        assert_eq!(store.count(), 0);
        assert!(store.is_empty());
        assert!(drain(&mut store).is_empty());
    }

    #[test]
    fn test_current_before_advance_is_state_error() {
        let mut store = filled(1);
        assert!(matches!(store.current(), Err(Error::State(_))));
        store.rewind();
        assert!(matches!(store.current(), Err(Error::State(_))));
    }

    #[test]
    fn test_push_rewind_advance_current() {
        let mut store = filled(1);
        store.rewind();
        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), &entry(0));
        assert_eq!(store.key(), 0);
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_deflate_special_bytes() {
        let config =
            StoreConfig::default().with_compression(spillvec_core::CompressionKind::Deflate);
        let mut store: RecordStore<String> = RecordStore::open(config).unwrap();
        store.push(&"a\\b\rc\nd".to_string()).unwrap();
        store.rewind();
        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), "a\\b\rc\nd");
    }

    /// Store holding `1`, an undecodable line, then `3`.
    fn store_with_corrupt_record() -> RecordStore<u32> {
        let mut store = RecordStore::open(StoreConfig::default()).unwrap();
        store.push(&1).unwrap();
        store.stream.append(b"not json\n").unwrap();
        store.write_count += 1;
        store.push(&3).unwrap();
        store
    }

    #[test]
    fn test_corrupt_record_is_decoding_error() {
        let mut store = store_with_corrupt_record();
        store.rewind();
        assert!(store.peek().unwrap());
        assert_eq!(store.current().unwrap(), &1);

        let err = store.advance().unwrap_err();
        assert!(err.is_decoding(), "{}", err);
        assert!(matches!(store.current(), Err(Error::State(_))));
        assert_eq!(store.key(), 1);

        // The bad line was consumed; the cursor moves on to the next record.
        assert!(store.peek().unwrap());
        assert_eq!(store.current().unwrap(), &3);
        assert_eq!(store.key(), 2);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_records_stop_after_decoding_error() {
        let mut store = store_with_corrupt_record();
        let mut records = store.records();
        assert_eq!(records.next().unwrap().unwrap(), 1);
        assert!(records.next().unwrap().unwrap_err().is_decoding());
        assert!(records.next().is_none());
        assert!(records.is_finished());
        drop(records);

        assert!(store.to_vec().unwrap_err().is_decoding());
        let mut out = Vec::new();
        assert!(store.write_json(&mut out, false).unwrap_err().is_decoding());
        assert_eq!(out, b"[1");
    }

    #[test]
    fn test_exhaustion_clears_current() {
        let mut store = filled(1);
        store.rewind();
        store.advance().unwrap();
        store.advance().unwrap();
        assert!(matches!(store.current(), Err(Error::State(_))));
        assert!(!store.peek().unwrap());
    }

    #[test]
    fn test_keys_in_order() {
        let mut store = filled(15);
        let drained = drain(&mut store);
        let keys: Vec<u64> = drained.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..15).collect::<Vec<u64>>());
        for (key, value) in drained {
            assert_eq!(value, entry(key as u32));
        }
    }

    #[test]
    fn test_repeatable_passes() {
        let mut store = filled(5);
        let first = drain(&mut store);
        let second = drain(&mut store);
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_peek_consumes_first_record_once() {
        let mut store = filled(2);
        store.rewind();
        assert!(store.peek().unwrap());
        assert!(store.peek().unwrap());
        assert_eq!(store.current().unwrap(), &entry(0));
        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), &entry(1));
    }

    #[test]
    fn test_count_independent_of_cursor() {
        let mut store = filled(3);
        store.rewind();
        store.advance().unwrap();
        assert_eq!(store.count(), 3);
        store.push(&entry(3)).unwrap();
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn test_push_during_iteration_appends_at_end() {
        let mut store = filled(2);
        store.rewind();
        store.advance().unwrap();
        store.push(&entry(2)).unwrap();

        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), &entry(1));
        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), &entry(2));
        store.advance().unwrap();
        assert!(store.current().is_err());
    }

    #[test]
    fn test_extend_appends_batch_in_order() {
        let mut store = store();
        let values: Vec<Entry> = (0..4).map(entry).collect();
        assert_eq!(store.extend(&values).unwrap(), 4);
        assert_eq!(store.extend(std::iter::empty()).unwrap(), 0);
        assert_eq!(store.count(), 4);
        assert_eq!(store.to_vec().unwrap(), values);
    }

    #[test]
    fn test_extend_is_all_or_nothing_on_encoding_error() {
        use std::collections::BTreeMap;

        let mut store: RecordStore<BTreeMap<Vec<u8>, u8>> =
            RecordStore::open(StoreConfig::default()).unwrap();
        let good = BTreeMap::new();
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1u8);

        let err = store.extend([&good, &bad]).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
        assert_eq!(store.count(), 0);
        assert_eq!(store.size_in_bytes(), Some(0));

        assert!(store.push(&bad).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_to_vec_restores_cursor() {
        let mut store = filled(4);
        store.rewind();
        store.advance().unwrap();
        store.advance().unwrap();

        assert_eq!(store.to_vec().unwrap(), (0..4).map(entry).collect::<Vec<_>>());
        assert_eq!(store.current().unwrap(), &entry(1));
        assert_eq!(store.key(), 1);
        store.advance().unwrap();
        assert_eq!(store.current().unwrap(), &entry(2));
    }

    #[test]
    fn test_to_boxed_slice() {
        let mut store = filled(3);
        let fixed = store.to_boxed_slice().unwrap();
        assert_eq!(fixed.len(), 3);
        assert_eq!(fixed[2], entry(2));
    }

    #[test]
    fn test_records_cancel_stops_pass() {
        let mut store = filled(10);
        let mut records = store.records();
        assert_eq!(records.next().unwrap().unwrap(), entry(0));
        assert_eq!(records.next().unwrap().unwrap(), entry(1));
        records.cancel();
        assert!(records.is_finished());
        assert!(records.next().is_none());
        drop(records);

        // Each call starts a fresh pass.
        assert_eq!(store.records().count(), 10);
    }

    #[test]
    fn test_records_size_hint() {
        let mut store = filled(3);
        let mut records = store.records();
        assert_eq!(records.size_hint(), (0, Some(3)));
        records.next();
        assert_eq!(records.size_hint(), (0, Some(2)));
    }

    #[test]
    fn test_size_in_bytes_grows() {
        let mut store = store();
        assert_eq!(store.size_in_bytes(), Some(0));
        store.push(&entry(0)).unwrap();
        let one = store.size_in_bytes().unwrap();
        assert!(one > 0);
        store.push(&entry(1)).unwrap();
        assert!(store.size_in_bytes().unwrap() > one);

        // Querying the size does not disturb reads.
        assert_eq!(drain(&mut store).len(), 2);
    }

    #[test]
    fn test_spills_to_disk_past_memory_cap() {
        let config = StoreConfig::default().with_memory_cap_mib(1);
        let mut store: RecordStore<String> = RecordStore::open(config).unwrap();
        let big = "x".repeat(64 * 1024);
        for _ in 0..20 {
            store.push(&big).unwrap();
        }
        assert!(store.is_on_disk());
        assert_eq!(store.count(), 20);
        assert!(store.to_vec().unwrap().iter().all(|s| s == &big));
    }

    #[test]
    fn test_codec_id() {
        let store = store();
        assert_eq!(store.codec_id(), "json+identity");
        assert_eq!(store.config().serializer, SerializerKind::Native);
    }

    #[test]
    fn test_write_json_matches_serde_json() {
        let mut store = filled(2);
        let mut out = Vec::new();
        store.write_json(&mut out, true).unwrap();
        let expected = serde_json::to_vec_pretty(&vec![entry(0), entry(1)]).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_open_rejects_zero_memory_cap() {
        let err = RecordStore::<Entry>::open(StoreConfig::default().with_memory_cap_mib(0))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
