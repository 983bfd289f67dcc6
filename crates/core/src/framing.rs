//! Line framing for spilled records
//!
//! Each encoded record is stored as exactly one line so a sequential reader can
//! delimit records without a length prefix. The record bytes are escaped so
//! they never contain a raw line terminator:
//!
//! ```text
//! 0x5C '\'  ->  '\' '\'
//! 0x0D CR   ->  '\' 'r'
//! 0x0A LF   ->  '\' 'n'
//! ```
//!
//! followed by a single `\n`. Every other byte is written as-is, so the framing
//! overhead for compressed or binary payloads is proportional to the number of
//! special bytes only.

use crate::error::{Error, Result};

/// Line terminator appended to every framed record.
pub const LINE_TERMINATOR: u8 = b'\n';

const ESCAPE: u8 = b'\\';
const CR: u8 = b'\r';

const FRAMING_ID: &str = "framing";

/// Frame `bytes` as a single terminated line.
pub fn frame(bytes: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(bytes.len() + 1);
    frame_into(bytes, &mut line);
    line
}

/// Append the framed form of `bytes` to `out`.
///
/// Lets batch writers build one contiguous buffer for many records.
pub fn frame_into(bytes: &[u8], out: &mut Vec<u8>) {
    out.reserve(bytes.len() + 1);
    for &byte in bytes {
        match byte {
            ESCAPE => out.extend_from_slice(b"\\\\"),
            CR => out.extend_from_slice(b"\\r"),
            LINE_TERMINATOR => out.extend_from_slice(b"\\n"),
            other => out.push(other),
        }
    }
    out.push(LINE_TERMINATOR);
}

/// Reverse [`frame`].
///
/// The trailing terminator is optional since the last line of a stream may
/// lack one.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the line contains a raw CR or LF before its
/// end, an unknown escape sequence, or a dangling trailing backslash.
pub fn unframe(line: &[u8]) -> Result<Vec<u8>> {
    let body = match line.split_last() {
        Some((&LINE_TERMINATOR, body)) => body,
        _ => line,
    };

    let mut out = Vec::with_capacity(body.len());
    let mut bytes = body.iter().copied().enumerate();
    while let Some((offset, byte)) = bytes.next() {
        match byte {
            ESCAPE => match bytes.next() {
                Some((_, ESCAPE)) => out.push(ESCAPE),
                Some((_, b'r')) => out.push(CR),
                Some((_, b'n')) => out.push(LINE_TERMINATOR),
                Some((_, other)) => {
                    return Err(Error::decoding(
                        FRAMING_ID,
                        format!("unknown escape 0x{:02x} at offset {}", other, offset),
                        line.len(),
                    ))
                }
                None => {
                    return Err(Error::decoding(
                        FRAMING_ID,
                        "dangling escape at end of record",
                        line.len(),
                    ))
                }
            },
            CR | LINE_TERMINATOR => {
                return Err(Error::decoding(
                    FRAMING_ID,
                    format!("unescaped line break at offset {}", offset),
                    line.len(),
                ))
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
