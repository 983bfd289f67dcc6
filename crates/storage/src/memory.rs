//! In-memory backing for a hybrid buffer
//!
//! Holds items in a `Vec` and follows the same cursor protocol as
//! [`RecordStore`](crate::RecordStore), so a buffer behaves identically before
//! and after it spills.

use spillvec_core::{Error, Result};

/// Vec-backed sequence with a record-store style cursor.
#[derive(Debug)]
pub(crate) struct MemoryList<T> {
    items: Vec<T>,

    /// Items produced since the last rewind
    read_index: usize,

    /// Index of the current item, if positioned
    current: Option<usize>,
}

impl<T> MemoryList<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            read_index: 0,
            current: None,
        }
    }

    pub(crate) fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub(crate) fn rewind(&mut self) {
        self.read_index = 0;
        self.current = None;
    }

    pub(crate) fn advance(&mut self) {
        if self.read_index < self.items.len() {
            self.current = Some(self.read_index);
            self.read_index += 1;
        } else {
            self.current = None;
        }
    }

    pub(crate) fn peek(&mut self) -> bool {
        if self.current.is_none() {
            self.advance();
        }
        self.current.is_some()
    }

    pub(crate) fn current(&self) -> Result<&T> {
        self.current
            .and_then(|index| self.items.get(index))
            .ok_or_else(|| {
                Error::State(
                    "no current item (call advance() or peek() first, or the buffer is exhausted)"
                        .to_string(),
                )
            })
    }

    pub(crate) fn key(&self) -> u64 {
        self.read_index.saturating_sub(1) as u64
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items
    }
}
