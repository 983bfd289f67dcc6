//! Spill stream: the byte medium under a record store
//!
//! A [`SpillStream`] is an append-only byte stream held in process memory up
//! to a configured cap and transparently moved to an anonymous temporary file
//! beyond it (`tempfile::SpooledTempFile`). It is ephemeral: nothing survives
//! the owning store, and the temporary file is removed when the stream drops.
//!
//! ## Positions
//!
//! The stream keeps two positions:
//!
//! - **write end** (`len`): every append lands here, regardless of where the
//!   reader is.
//! - **read position**: where the next line is read from.
//!
//! Reads go through a `BufReader`. An append moves the underlying file
//! position, so it marks the reader for a re-seek to the logical read position
//! before the next read. Rewinding and restoring a saved position are recorded
//! the same way, which keeps them infallible; any seek error surfaces from the
//! next read.

use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;
use tracing::{debug, warn};

/// Append-only byte stream spooled in memory up to a cap, then on disk.
pub struct SpillStream {
    /// Buffered reader over the spooled medium
    reader: BufReader<SpooledTempFile>,

    /// Bytes successfully appended (logical end of data)
    len: u64,

    /// Logical position of the next read
    read_pos: u64,

    /// Underlying position no longer matches `read_pos`
    needs_seek: bool,

    /// In-memory budget in bytes
    memory_cap: usize,
}

impl SpillStream {
    /// Open an empty stream that stays in memory up to `memory_cap` bytes.
    pub fn new(memory_cap: usize) -> Self {
        debug!(memory_cap, "Opened spill stream");
        Self {
            reader: BufReader::new(SpooledTempFile::new(memory_cap)),
            len: 0,
            read_pos: 0,
            needs_seek: false,
            memory_cap,
        }
    }

    /// Append `bytes` at the write end.
    ///
    /// On failure the logical length is unchanged and the medium is truncated
    /// back to it, so a later append overwrites any partial data.
    ///
    /// The failure path has no unit test: the medium is a concrete
    /// `SpooledTempFile`, which offers no way to inject a write error.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let was_rolled = self.is_rolled();
        let len = self.len;
        let file = self.reader.get_mut();
        self.needs_seek = true;

        let result = file
            .seek(SeekFrom::Start(len))
            .and_then(|_| file.write_all(bytes));
        if let Err(e) = result {
            if let Err(truncate_err) = file.set_len(len) {
                warn!(len, error = %truncate_err, "Failed to truncate spill stream after write error");
            }
            return Err(e);
        }

        self.len += bytes.len() as u64;
        if !was_rolled && self.is_rolled() {
            debug!(
                len = self.len,
                memory_cap = self.memory_cap,
                "Spill stream exceeded its memory cap, rolled over to a temporary file"
            );
        }
        Ok(())
    }

    /// Read the next line, including its terminator, into `buf`.
    ///
    /// Returns the number of bytes read, or 0 at end of data. The final line
    /// is returned without a terminator if the data does not end with one.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        if self.read_pos >= self.len {
            return Ok(0);
        }
        if self.needs_seek {
            self.reader.seek(SeekFrom::Start(self.read_pos))?;
            self.needs_seek = false;
        }

        let start = buf.len();
        let read = self.reader.read_until(spillvec_core::LINE_TERMINATOR, buf)?;

        // Never hand out bytes past the logical end (left by a failed append).
        let remaining = (self.len - self.read_pos) as usize;
        let read = if read > remaining {
            buf.truncate(start + remaining);
            self.needs_seek = true;
            remaining
        } else {
            read
        };
        self.read_pos += read as u64;
        Ok(read)
    }

    /// Move the read position back to the start of the stream.
    pub fn rewind(&mut self) {
        self.set_read_position(0);
    }

    /// Logical position of the next read.
    pub fn read_position(&self) -> u64 {
        self.read_pos
    }

    /// Move the read position to a position previously returned by
    /// [`read_position`](Self::read_position).
    pub fn set_read_position(&mut self, pos: u64) {
        self.read_pos = pos.min(self.len);
        self.needs_seek = true;
    }

    /// Bytes appended so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current byte length as reported by the medium itself.
    ///
    /// Returns `None` if the medium cannot report its size.
    pub fn medium_len(&mut self) -> Option<u64> {
        self.needs_seek = true;
        match self.reader.get_mut().seek(SeekFrom::End(0)) {
            Ok(len) => Some(len),
            Err(e) => {
                debug!(error = %e, "Spill stream size unavailable");
                None
            }
        }
    }

    /// Returns true once the data has moved from memory to a temporary file.
    pub fn is_rolled(&self) -> bool {
        self.reader.get_ref().is_rolled()
    }

    /// In-memory budget in bytes.
    pub fn memory_cap(&self) -> usize {
        self.memory_cap
    }
}

impl std::fmt::Debug for SpillStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpillStream")
            .field("len", &self.len)
            .field("read_pos", &self.read_pos)
            .field("memory_cap", &self.memory_cap)
            .field("rolled", &self.is_rolled())
            .finish()
    }
}
