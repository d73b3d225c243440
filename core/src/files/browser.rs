//! Async file browsing over an SMB share.
//!
//! [`SmbFileOperations`] is blocking and `&mut self`. [`ShareFileBrowser`]
//! puts it behind a mutex and runs each call on
//! `tokio::task::spawn_blocking`, so async callers can share one adapter
//! (and its single session) across tasks.

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::FileError;

use super::smb::SmbFileOperations;
use super::work::WorkItem;
use super::{FileOperations, RemoteEntry};

/// Async file browsing capability.
#[async_trait::async_trait]
pub trait FileBrowser: Send + Sync {
    /// List directory contents at the given path.
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, FileError>;

    /// Whether a file exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool, FileError>;

    /// Create a directory and any missing parents.
    async fn create_dir_all(&self, path: &str) -> Result<(), FileError>;

    /// Read a file's contents, returning raw bytes.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FileError>;

    /// Write raw bytes to a file below the endpoint's base path.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FileError>;

    /// Log off the underlying session.
    async fn close(&self) -> Result<(), FileError>;
}

/// [`FileBrowser`] backed by a shared [`SmbFileOperations`].
#[derive(Clone)]
pub struct ShareFileBrowser {
    ops: Arc<Mutex<SmbFileOperations>>,
}

impl ShareFileBrowser {
    pub fn new(ops: SmbFileOperations) -> Self {
        Self {
            ops: Arc::new(Mutex::new(ops)),
        }
    }

    fn lock(ops: &Mutex<SmbFileOperations>) -> Result<MutexGuard<'_, SmbFileOperations>, FileError> {
        ops.lock().map_err(|e| {
            FileError::Io(std::io::Error::other(format!(
                "Failed to lock share operations: {e}"
            )))
        })
    }

    /// Run `f` against the adapter on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, FileError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SmbFileOperations) -> Result<T, FileError> + Send + 'static,
    {
        let ops = self.ops.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = Self::lock(&ops)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| FileError::Io(std::io::Error::other(format!("Task join failed: {e}"))))?
    }
}

#[async_trait::async_trait]
impl FileBrowser for ShareFileBrowser {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, FileError> {
        let path = path.to_string();
        self.run(move |ops| ops.list_files(&path)).await
    }

    async fn exists(&self, path: &str) -> Result<bool, FileError> {
        let path = path.to_string();
        self.run(move |ops| ops.exists_file(&path)).await
    }

    async fn create_dir_all(&self, path: &str) -> Result<(), FileError> {
        let path = path.to_string();
        self.run(move |ops| ops.build_directory(&path, false).map(|_| ()))
            .await
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FileError> {
        let path = path.to_string();
        self.run(move |ops| {
            let mut item = WorkItem::new(path.as_str());
            ops.retrieve_file(&path, &mut item)?;
            let data = item.buffer().map(|b| b.contents()).unwrap_or_default();
            ops.release_retrieved_file_resources(&mut item)?;
            Ok(data)
        })
        .await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FileError> {
        let path = path.to_string();
        let data = data.to_vec();
        self.run(move |ops| {
            let mut item = WorkItem::with_stream(path.as_str(), Cursor::new(data));
            ops.store_file(&path, &mut item).map(|_| ())
        })
        .await
    }

    async fn close(&self) -> Result<(), FileError> {
        self.run(|ops| {
            ops.close();
            Ok(())
        })
        .await
    }
}
