//! Share-client capability consumed by the adapter.
//!
//! The wire protocol lives outside this crate. A client implementation
//! provides the connect → authenticate → connect share → file operations
//! chain through the traits below. The `memory` feature adds
//! `memory::MemoryShareClient`, a complete in-process implementation.

#[cfg(any(test, feature = "memory"))]
pub mod memory;

use std::io::Write;

use crate::errors::ClientError;
use crate::files::copy::CopySource;

/// Attribute bit marking a directory entry.
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;

/// Attribute bit marking a plain file with no other attributes set.
pub const FILE_ATTRIBUTE_NORMAL: u32 = 0x80;

/// Identity presented when authenticating a session.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub domain: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// One raw entry from a directory listing, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub file_name: String,
    pub attributes: u32,
    /// End-of-file position, i.e. the size in bytes.
    pub end_of_file: u64,
    /// Last write time in milliseconds since the Unix epoch.
    pub last_write_time: i64,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_DIRECTORY == FILE_ATTRIBUTE_DIRECTORY
    }
}

/// Requested access to an opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMask {
    GenericRead,
    GenericWrite,
}

/// What to do depending on whether the path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    /// Open an existing file; fail if it is missing.
    Open,
    /// Create a new file; fail if it exists.
    Create,
    /// Open and truncate an existing file, or create it.
    OverwriteIf,
}

/// Parameters for [`DiskShare::open_file`].
///
/// Handles are always opened with full share access, so other openers can
/// read, write and delete while one is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub access: AccessMask,
    pub disposition: CreateDisposition,
}

impl OpenOptions {
    /// Read an existing file.
    pub fn read() -> Self {
        Self {
            access: AccessMask::GenericRead,
            disposition: CreateDisposition::Open,
        }
    }

    /// Write a file with the given create disposition.
    pub fn write(disposition: CreateDisposition) -> Self {
        Self {
            access: AccessMask::GenericWrite,
            disposition,
        }
    }
}

/// Entry point of a share client: opens transport connections to hosts.
pub trait ShareClient: Send {
    fn connect(&self, host: &str) -> Result<Box<dyn Connection>, ClientError>;
}

/// A transport connection to one host.
pub trait Connection: Send {
    fn authenticate(&self, credentials: &Credentials) -> Result<Box<dyn Session>, ClientError>;
}

/// An authenticated session.
pub trait Session: Send {
    fn connect_share(&self, name: &str) -> Result<Box<dyn DiskShare>, ClientError>;

    /// End the session on the server.
    fn logoff(&self) -> Result<(), ClientError>;
}

/// A connected disk share. Paths are share-relative and backslash-delimited.
pub trait DiskShare: Send {
    fn file_exists(&self, path: &str) -> Result<bool, ClientError>;

    fn folder_exists(&self, path: &str) -> Result<bool, ClientError>;

    fn mkdir(&self, path: &str) -> Result<(), ClientError>;

    /// List a directory, including the `.` and `..` markers.
    fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, ClientError>;

    fn open_file(
        &self,
        path: &str,
        options: OpenOptions,
    ) -> Result<Box<dyn RemoteFile>, ClientError>;

    /// Set the last write time (epoch milliseconds) of an existing file.
    fn set_last_write_time(&self, path: &str, epoch_millis: i64) -> Result<(), ClientError>;
}

/// An open remote file handle.
pub trait RemoteFile: Send {
    fn input_stream(&mut self) -> Result<Box<dyn CopySource + Send + '_>, ClientError>;

    fn output_stream(&mut self) -> Result<Box<dyn Write + Send + '_>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(attributes: u32) -> DirectoryEntry {
        DirectoryEntry {
            file_name: "x".to_string(),
            attributes,
            end_of_file: 0,
            last_write_time: 0,
        }
    }

    #[test]
    fn directory_attribute_detection() {
        assert!(entry(FILE_ATTRIBUTE_DIRECTORY).is_directory());
        assert!(entry(FILE_ATTRIBUTE_DIRECTORY | 0x01).is_directory());
        assert!(!entry(FILE_ATTRIBUTE_NORMAL).is_directory());
        assert!(!entry(0x20).is_directory());
    }

    #[test]
    fn read_options_open_existing() {
        let opts = OpenOptions::read();
        assert_eq!(opts.access, AccessMask::GenericRead);
        assert_eq!(opts.disposition, CreateDisposition::Open);
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            domain: "CORP".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
    }

    // The capability traits are used as trait objects throughout the crate.
    fn _assert_object_safe(
        _: &dyn ShareClient,
        _: &dyn Connection,
        _: &dyn Session,
        _: &dyn DiskShare,
        _: &dyn RemoteFile,
    ) {
    }
}
