//! Bounded-buffer stream copying.
//!
//! [`copy`] sizes its buffer from the source: a fully in-memory source is
//! drained in a single pass, anything else uses the larger of the caller's
//! hint and the bytes the source reports as immediately available. The
//! buffer never exceeds [`MAX_BUFFER_SIZE`].

use std::io::{self, Cursor, ErrorKind, Read, Write};

/// Buffer size used when neither the hint nor the source suggest one.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 4096;

/// Upper bound on the copy buffer, regardless of hints.
pub const MAX_BUFFER_SIZE: usize = 262_144;

/// A byte source that can describe how much data it holds.
pub trait CopySource: Read {
    /// Bytes that can be read without blocking.
    fn available(&self) -> usize {
        0
    }

    /// True when the whole remaining content is held in memory.
    fn is_buffered(&self) -> bool {
        false
    }
}

impl<T: AsRef<[u8]>> CopySource for Cursor<T> {
    fn available(&self) -> usize {
        let len = self.get_ref().as_ref().len() as u64;
        len.saturating_sub(self.position()) as usize
    }

    fn is_buffered(&self) -> bool {
        true
    }
}

impl CopySource for &[u8] {
    fn available(&self) -> usize {
        self.len()
    }

    fn is_buffered(&self) -> bool {
        true
    }
}

impl<S: CopySource + ?Sized> CopySource for Box<S> {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn is_buffered(&self) -> bool {
        (**self).is_buffered()
    }
}

impl<S: CopySource + ?Sized> CopySource for &mut S {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn is_buffered(&self) -> bool {
        (**self).is_buffered()
    }
}

/// Adapts any reader that cannot report its size.
#[derive(Debug)]
pub struct Streamed<R>(pub R);

impl<R: Read> Read for Streamed<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read> CopySource for Streamed<R> {}

/// Buffer size [`copy`] will use for `source` given `hint`.
pub fn effective_buffer_size<S: CopySource + ?Sized>(source: &S, hint: usize) -> usize {
    let size = if source.is_buffered() {
        source.available()
    } else {
        hint.max(source.available())
    };
    let size = if size == 0 {
        DEFAULT_COPY_BUFFER_SIZE
    } else {
        size
    };
    size.min(MAX_BUFFER_SIZE)
}

/// Copy `source` into `sink` until end of stream, returning the byte count.
///
/// With `flush_per_write` the sink is flushed after every write; otherwise
/// once at the end. Any read or write error aborts the copy.
pub fn copy<S, W>(
    source: &mut S,
    sink: &mut W,
    buffer_size_hint: usize,
    flush_per_write: bool,
) -> io::Result<u64>
where
    S: CopySource + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; effective_buffer_size(source, buffer_size_hint)];
    pump(source, sink, &mut buffer, flush_per_write)
}

/// The copy loop over a caller-provided, non-empty buffer.
pub fn pump<R, W>(
    source: &mut R,
    sink: &mut W,
    buffer: &mut [u8],
    flush_per_write: bool,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    debug_assert!(!buffer.is_empty(), "copy buffer must not be empty");

    let mut total = 0u64;
    loop {
        let n = match source.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buffer[..n])?;
        if flush_per_write {
            sink.flush()?;
        }
        total += n as u64;
    }

    if !flush_per_write {
        sink.flush()?;
    }
    Ok(total)
}
