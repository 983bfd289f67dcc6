//! Hybrid buffer: an in-memory list that spills to a record store
//!
//! A [`HybridBuffer`] starts out as a plain `Vec`. The push that would take it
//! past `item_threshold` items migrates every buffered item, plus the pushed
//! value, into a [`RecordStore`] and from then on the store is the only
//! backing. The migration is one-way.
//!
//! ```text
//! InMemory(list) --push #threshold+1--> Spilled(store)
//! ```
//!
//! The new store is built and filled off to the side and only swapped in once
//! every record has been written, so a failed migration leaves the buffer
//! exactly as it was.
//!
//! ## Iteration
//!
//! Both backings follow the record store's cursor protocol, so reads behave
//! the same before and after migration. Pushing while a manual pass
//! (`rewind`/`peek`/`advance`) is in progress is not supported if the push
//! crosses the threshold: the pass is left on the new store's fresh cursor.
//! [`records`](HybridBuffer::records) borrows the buffer mutably, so that case
//! cannot arise for lazy passes.

use crate::codec::Codec;
use crate::export;
use crate::memory::MemoryList;
use crate::record_store::{RecordStore, Records};
use serde::{de::DeserializeOwned, Serialize};
use spillvec_core::{BufferConfig, Result, StoreConfig};
use std::fmt;
use std::io::Write;
use std::iter::FusedIterator;
use std::path::Path;
use tracing::debug;

/// Where a buffer's items currently live.
enum Backing<T> {
    InMemory(MemoryList<T>),
    Spilled(RecordStore<T>),
}

/// Ordered sequence that holds items in memory up to a threshold, then
/// spills all of them to a [`RecordStore`].
///
/// # Example
///
/// ```
/// use spillvec_storage::HybridBuffer;
///
/// let mut buffer = HybridBuffer::with_threshold(2).unwrap();
/// for word in ["alpha", "beta", "gamma"] {
///     buffer.push(word.to_string()).unwrap();
/// }
/// assert!(buffer.is_spilled());
/// assert_eq!(buffer.to_vec().unwrap(), vec!["alpha", "beta", "gamma"]);
/// ```
pub struct HybridBuffer<T> {
    backing: Backing<T>,
    config: BufferConfig,
}

impl<T> HybridBuffer<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create an empty buffer.
    ///
    /// The configuration and codec pair are checked here; the spill store
    /// itself is only opened when the buffer migrates.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`](spillvec_core::Error::Configuration) for a zero
    /// threshold or memory cap, or a codec backend that is not compiled in.
    pub fn new(config: BufferConfig) -> Result<Self> {
        config.validate()?;
        Codec::<T>::resolve(config.serializer, config.compression)?;

        Ok(Self {
            backing: Backing::InMemory(MemoryList::new()),
            config,
        })
    }

    /// Create an empty buffer with the given threshold and default codecs.
    pub fn with_threshold(item_threshold: usize) -> Result<Self> {
        Self::new(BufferConfig::new(item_threshold))
    }

    /// Append a value.
    ///
    /// Once `item_threshold` items are buffered, the next push migrates all of
    /// them, followed by `value`, into a spill store.
    ///
    /// # Errors
    ///
    /// Encoding and I/O errors from the store. A failed migration leaves the
    /// buffer in memory and `value` is not added.
    pub fn push(&mut self, value: T) -> Result<()> {
        let threshold = self.config.item_threshold;
        let store = match &mut self.backing {
            Backing::Spilled(store) => return store.push(&value),
            Backing::InMemory(list) if list.len() < threshold => {
                list.push(value);
                return Ok(());
            }
            Backing::InMemory(list) => {
                Self::migrate(list.as_slice(), &value, self.config.store_config())?
            }
        };
        self.backing = Backing::Spilled(store);
        Ok(())
    }

    /// Write `items` followed by `value` into a new store.
    fn migrate(items: &[T], value: &T, config: StoreConfig) -> Result<RecordStore<T>> {
        let mut store = RecordStore::open(config)?;
        let records = store.extend(items.iter().chain(std::iter::once(value)))?;
        debug!(
            records,
            bytes = ?store.size_in_bytes(),
            codec = %store.codec_id(),
            "Buffer crossed its item threshold, migrated to spill store"
        );
        Ok(store)
    }

    /// Move the cursor back before the first item.
    pub fn rewind(&mut self) {
        match &mut self.backing {
            Backing::InMemory(list) => list.rewind(),
            Backing::Spilled(store) => store.rewind(),
        }
    }

    /// Position the cursor on the next item, or clear it at the end.
    pub fn advance(&mut self) -> Result<()> {
        match &mut self.backing {
            Backing::InMemory(list) => {
                list.advance();
                Ok(())
            }
            Backing::Spilled(store) => store.advance(),
        }
    }

    /// Report whether an item is available, advancing first if the cursor is
    /// empty. See [`RecordStore::peek`].
    pub fn peek(&mut self) -> Result<bool> {
        match &mut self.backing {
            Backing::InMemory(list) => Ok(list.peek()),
            Backing::Spilled(store) => store.peek(),
        }
    }

    /// Byte length of the spill stream, or `None` while the buffer is still in
    /// memory (or the medium cannot tell).
    pub fn size_in_bytes(&mut self) -> Option<u64> {
        match &mut self.backing {
            Backing::InMemory(_) => None,
            Backing::Spilled(store) => store.size_in_bytes(),
        }
    }
}

impl<T> HybridBuffer<T> {
    /// The item at the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::State`](spillvec_core::Error::State) if the cursor is not on an
    /// item.
    pub fn current(&self) -> Result<&T> {
        match &self.backing {
            Backing::InMemory(list) => list.current(),
            Backing::Spilled(store) => store.current(),
        }
    }

    /// 0-based index of the item at the cursor.
    pub fn key(&self) -> u64 {
        match &self.backing {
            Backing::InMemory(list) => list.key(),
            Backing::Spilled(store) => store.key(),
        }
    }

    /// Number of items pushed.
    pub fn count(&self) -> u64 {
        match &self.backing {
            Backing::InMemory(list) => list.len() as u64,
            Backing::Spilled(store) => store.count(),
        }
    }

    /// Returns true if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true once the buffer has migrated to its spill store.
    pub fn is_spilled(&self) -> bool {
        matches!(self.backing, Backing::Spilled(_))
    }

    /// The spill store, once migrated.
    pub fn spilled_store(&self) -> Option<&RecordStore<T>> {
        match &self.backing {
            Backing::InMemory(_) => None,
            Backing::Spilled(store) => Some(store),
        }
    }

    /// Number of items held in memory before migrating.
    pub fn threshold(&self) -> usize {
        self.config.item_threshold
    }

    /// Configuration the buffer was created with.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }
}

impl<T> HybridBuffer<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Lazily produce every item from the start, without moving the cursor.
    pub fn records(&mut self) -> BufferRecords<'_, T> {
        let inner = match &mut self.backing {
            Backing::InMemory(list) => BufferRecordsInner::InMemory(list.as_slice().iter()),
            Backing::Spilled(store) => BufferRecordsInner::Spilled(store.records()),
        };
        BufferRecords { inner, done: false }
    }

    /// Collect every item into a `Vec`, in push order.
    pub fn to_vec(&mut self) -> Result<Vec<T>> {
        self.records().collect()
    }

    /// Collect every item into a fixed-length boxed slice, in push order.
    pub fn to_boxed_slice(&mut self) -> Result<Box<[T]>> {
        Ok(self.to_vec()?.into_boxed_slice())
    }

    /// Stream every item to `sink` as a JSON array.
    pub fn write_json<W: Write>(&mut self, sink: W, pretty: bool) -> Result<()> {
        export::write_json_array(sink, self.records(), pretty).map(|_| ())
    }

    /// Create the file at `path` and stream every item into it as a JSON
    /// array.
    pub fn write_json_file<P: AsRef<Path>>(&mut self, path: P, pretty: bool) -> Result<()> {
        export::write_json_file(path, self.records(), pretty).map(|_| ())
    }
}

impl<T> fmt::Debug for HybridBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("HybridBuffer");
        s.field("threshold", &self.config.item_threshold)
            .field("count", &self.count());
        match &self.backing {
            Backing::InMemory(_) => s.field("backing", &"in-memory"),
            Backing::Spilled(store) => s.field("backing", store),
        };
        s.finish()
    }
}

/// Lazy pass over a [`HybridBuffer`], created by [`HybridBuffer::records`].
pub struct BufferRecords<'a, T> {
    inner: BufferRecordsInner<'a, T>,
    done: bool,
}

enum BufferRecordsInner<'a, T> {
    InMemory(std::slice::Iter<'a, T>),
    Spilled(Records<'a, T>),
}

impl<T> BufferRecords<'_, T> {
    /// Stop the pass. No further items are produced.
    pub fn cancel(&mut self) {
        self.done = true;
        if let BufferRecordsInner::Spilled(records) = &mut self.inner {
            records.cancel();
        }
    }
}

impl<T> Iterator for BufferRecords<'_, T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = match &mut self.inner {
            BufferRecordsInner::InMemory(items) => items.next().cloned().map(Ok),
            BufferRecordsInner::Spilled(records) => records.next(),
        };
        if next.is_none() {
            self.done = true;
        }
        next
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        match &self.inner {
            BufferRecordsInner::InMemory(items) => items.size_hint(),
            BufferRecordsInner::Spilled(records) => records.size_hint(),
        }
    }
}

impl<T> FusedIterator for BufferRecords<'_, T> where T: Serialize + DeserializeOwned + Clone {}
