//! [`FileOperations`] over an SMB share.
//!
//! Every operation normalizes its path, makes sure the adapter's session is
//! up, connects the configured share and performs one remote call. Reads
//! and writes stream through [`copy`](super::copy).

use tracing::{debug, info};

use crate::client::{CreateDisposition, DiskShare, OpenOptions, ShareClient};
use crate::config::{SmbConfig, StoreDisposition};
use crate::errors::FileError;
use crate::session::SessionManager;

use super::copy::{copy, pump};
use super::directory;
use super::path::{join_base, strip_share_name, to_protocol_separators};
use super::work::{Body, SharedBuffer, WorkItem};
use super::{FileOperations, RemoteEntry};

/// Transfer buffer used when storing files.
pub const STORE_BUFFER_SIZE: usize = 512 * 1024;

/// File operations against one SMB share.
///
/// Holds a single session for its whole lifetime (see [`SessionManager`]).
/// Operations take `&mut self`; wrap the adapter in a mutex to share it.
pub struct SmbFileOperations {
    config: Option<SmbConfig>,
    sessions: SessionManager,
}

impl SmbFileOperations {
    /// An adapter with no endpoint yet; call
    /// [`set_endpoint`](FileOperations::set_endpoint) before use.
    pub fn new(client: impl ShareClient + 'static) -> Self {
        Self {
            config: None,
            sessions: SessionManager::new(Box::new(client)),
        }
    }

    pub fn with_endpoint(
        client: impl ShareClient + 'static,
        config: SmbConfig,
    ) -> Result<Self, FileError> {
        let mut ops = Self::new(client);
        ops.set_endpoint(config)?;
        Ok(ops)
    }

    pub fn config(&self) -> Option<&SmbConfig> {
        self.config.as_ref()
    }

    /// Whether the adapter currently holds an authenticated session.
    pub fn is_connected(&self) -> bool {
        self.sessions.is_established()
    }

    /// Log off the session. The next operation reconnects.
    pub fn close(&mut self) {
        self.sessions.close();
    }

    fn share(&mut self) -> Result<(&SmbConfig, Box<dyn DiskShare>), FileError> {
        let config = self.config.as_ref().ok_or(FileError::NotConfigured)?;
        let share = self.sessions.connect_share(config)?;
        Ok((config, share))
    }

    fn retrieve_into(&mut self, name: &str, buffer: &SharedBuffer) -> Result<u64, FileError> {
        const ACTION: &str = "Cannot retrieve file";

        let (config, share) = self.share()?;
        let path = share_relative(name, &config.share);

        let mut file = share
            .open_file(&path, OpenOptions::read())
            .map_err(|e| FileError::failed(ACTION, name, e))?;
        let mut input = file
            .input_stream()
            .map_err(|e| FileError::failed(ACTION, name, e))?;

        let mut sink = buffer.writer();
        copy(&mut *input, &mut sink, config.buffer_size, false)
            .map_err(|e| FileError::failed(ACTION, name, e))
    }
}

/// Protocol separators, share name removed.
fn share_relative(name: &str, share: &str) -> String {
    strip_share_name(&to_protocol_separators(name), share, true)
}

fn create_disposition(disposition: StoreDisposition) -> CreateDisposition {
    match disposition {
        StoreDisposition::Create => CreateDisposition::Create,
        StoreDisposition::Overwrite => CreateDisposition::OverwriteIf,
    }
}

impl FileOperations for SmbFileOperations {
    type Endpoint = SmbConfig;

    /// Point the adapter at a new endpoint, logging off any live session.
    ///
    /// `${env:..}` placeholders are expanded before validation.
    fn set_endpoint(&mut self, endpoint: SmbConfig) -> Result<(), FileError> {
        let endpoint = endpoint.expand();
        let problems = endpoint.validate();
        if !problems.is_empty() {
            return Err(FileError::InvalidEndpoint(problems));
        }
        self.sessions.close();
        self.config = Some(endpoint);
        Ok(())
    }

    fn exists_file(&mut self, name: &str) -> Result<bool, FileError> {
        let (config, share) = self.share()?;
        let path = share_relative(name, &config.share);
        share
            .file_exists(&path)
            .map_err(|e| FileError::failed("Cannot check file", name, e))
    }

    fn build_directory(&mut self, directory: &str, _absolute: bool) -> Result<bool, FileError> {
        let (config, share) = self.share()?;
        let created = directory::build_directory(share.as_ref(), &config.share, directory)?;
        if created > 0 {
            debug!("Built {directory} ({created} new)");
        }
        Ok(true)
    }

    fn retrieve_file(&mut self, name: &str, item: &mut WorkItem) -> Result<bool, FileError> {
        // Attached up front so the pipeline sees partial content on failure.
        let buffer = SharedBuffer::new();
        item.set_body(Body::Buffer(buffer.clone()));

        let bytes = self.retrieve_into(name, &buffer)?;
        debug!("Retrieved {name} ({bytes} bytes)");
        Ok(true)
    }

    fn store_file(&mut self, name: &str, item: &mut WorkItem) -> Result<bool, FileError> {
        const ACTION: &str = "Cannot store file";

        let config = self.config.as_ref().ok_or(FileError::NotConfigured)?;
        let store_name = config.smb_host_path(name);
        // Owned here, so it is released on every return path below.
        let mut source = item
            .take_stream()
            .ok_or_else(|| FileError::MissingBody(store_name.clone()))?;

        let relative = match item.relative_path() {
            "" => name,
            path => path,
        };
        let destination = join_base(&config.path, relative);

        let share = self.sessions.connect_share(config)?;
        let options = OpenOptions::write(create_disposition(config.store_disposition));
        let bytes = {
            let mut file = share
                .open_file(&destination, options)
                .map_err(|e| FileError::failed(ACTION, store_name.as_str(), e))?;
            let mut out = file
                .output_stream()
                .map_err(|e| FileError::failed(ACTION, store_name.as_str(), e))?;
            let mut buffer = vec![0u8; STORE_BUFFER_SIZE];
            pump(&mut source, &mut out, &mut buffer, false)
                .map_err(|e| FileError::failed(ACTION, store_name.as_str(), e))?
        };

        if config.keep_last_modified {
            if let Some(modified) = item.last_modified() {
                share
                    .set_last_write_time(&destination, modified)
                    .map_err(|e| FileError::failed(ACTION, store_name.as_str(), e))?;
            }
        }

        info!("Stored {store_name} ({bytes} bytes)");
        Ok(true)
    }

    fn list_files(&mut self, path: &str) -> Result<Vec<RemoteEntry>, FileError> {
        let (config, share) = self.share()?;
        let actual = share_relative(path, &config.share);

        let entries = share
            .list(&actual)
            .map_err(|e| FileError::failed("Could not get files", path, e))?;

        Ok(entries
            .into_iter()
            .filter(|e| !(e.is_directory() && (e.file_name == "." || e.file_name == "..")))
            .map(|e| RemoteEntry {
                is_directory: e.is_directory(),
                name: e.file_name,
                size: e.end_of_file,
                last_modified: e.last_write_time,
            })
            .collect())
    }
}
