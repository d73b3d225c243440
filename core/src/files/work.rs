//! The pipeline's in-flight unit of work.
//!
//! A [`WorkItem`] travels through the pipeline carrying a file's relative
//! path, its modification time and its body. Retrieval attaches a
//! [`SharedBuffer`] that the pipeline keeps reading after the call returns;
//! storing consumes a byte stream.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Growable byte buffer shared between the adapter and the pipeline.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A writer appending to this buffer.
    pub fn writer(&self) -> BufferWriter {
        BufferWriter {
            buffer: self.clone(),
        }
    }

    /// Snapshot of the bytes written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Appending writer over a [`SharedBuffer`].
#[derive(Debug)]
pub struct BufferWriter {
    buffer: SharedBuffer,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Body attached to a work item.
pub enum Body {
    /// Filled by a retrieval.
    Buffer(SharedBuffer),
    /// Consumed by a store.
    Stream(Box<dyn Read + Send>),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Buffer(buffer) => f.debug_tuple("Buffer").field(&buffer.len()).finish(),
            Body::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A file moving through the pipeline.
#[derive(Debug, Default)]
pub struct WorkItem {
    relative_path: String,
    last_modified: Option<i64>,
    body: Option<Body>,
}

impl WorkItem {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            ..Default::default()
        }
    }

    /// A work item whose body is the given stream.
    pub fn with_stream(relative_path: impl Into<String>, stream: impl Read + Send + 'static) -> Self {
        Self {
            relative_path: relative_path.into(),
            last_modified: None,
            body: Some(Body::Stream(Box::new(stream))),
        }
    }

    /// Set the modification time in epoch milliseconds.
    pub fn last_modified_at(mut self, epoch_millis: i64) -> Self {
        self.last_modified = Some(epoch_millis);
        self
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// The attached buffer, if the body is one.
    pub fn buffer(&self) -> Option<&SharedBuffer> {
        match &self.body {
            Some(Body::Buffer(buffer)) => Some(buffer),
            _ => None,
        }
    }

    /// Detach the body if it is a stream.
    pub fn take_stream(&mut self) -> Option<Box<dyn Read + Send>> {
        match self.body.take() {
            Some(Body::Stream(stream)) => Some(stream),
            other => {
                self.body = other;
                None
            }
        }
    }
}
