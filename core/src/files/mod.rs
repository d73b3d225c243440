pub mod browser;
pub mod copy;
pub mod directory;
pub mod path;
pub mod smb;
pub mod work;

use serde::{Deserialize, Serialize};

use crate::errors::FileError;

pub use browser::{FileBrowser, ShareFileBrowser};
pub use smb::SmbFileOperations;
pub use work::{Body, SharedBuffer, WorkItem};

/// A file or directory entry returned by [`FileOperations::list_files`].
///
/// Field names are serialized as camelCase for pipeline consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

/// File operations a pipeline endpoint can perform.
///
/// The contract covers directory navigation, deletion and renaming too.
/// Implementations that cannot offer those keep the default bodies, which
/// fail with [`FileError::NotSupported`].
pub trait FileOperations {
    /// Endpoint configuration accepted by [`set_endpoint`](Self::set_endpoint).
    type Endpoint;

    /// Point the implementation at `endpoint`. A rejected endpoint leaves
    /// the previous one in place.
    fn set_endpoint(&mut self, endpoint: Self::Endpoint) -> Result<(), FileError>;

    fn exists_file(&mut self, name: &str) -> Result<bool, FileError>;

    /// Create `directory` and its missing ancestors.
    fn build_directory(&mut self, directory: &str, absolute: bool) -> Result<bool, FileError>;

    /// Read `name` into a buffer attached to `item`'s body.
    ///
    /// The buffer is attached before any remote call and stays attached when
    /// the retrieval fails.
    fn retrieve_file(&mut self, name: &str, item: &mut WorkItem) -> Result<bool, FileError>;

    /// Drop whatever a retrieval attached to `item`.
    fn release_retrieved_file_resources(&mut self, item: &mut WorkItem) -> Result<(), FileError> {
        item.take_body();
        Ok(())
    }

    /// Write `item`'s stream body to the endpoint.
    fn store_file(&mut self, name: &str, item: &mut WorkItem) -> Result<bool, FileError>;

    fn list_files(&mut self, path: &str) -> Result<Vec<RemoteEntry>, FileError>;

    fn delete_file(&mut self, _name: &str) -> Result<bool, FileError> {
        Err(FileError::NotSupported("deleteFile"))
    }

    fn rename_file(&mut self, _from: &str, _to: &str) -> Result<bool, FileError> {
        Err(FileError::NotSupported("renameFile"))
    }

    fn current_directory(&mut self) -> Result<String, FileError> {
        Err(FileError::NotSupported("getCurrentDirectory"))
    }

    fn change_current_directory(&mut self, _path: &str) -> Result<(), FileError> {
        Err(FileError::NotSupported("changeCurrentDirectory"))
    }

    fn change_to_parent_directory(&mut self) -> Result<(), FileError> {
        Err(FileError::NotSupported("changeToParentDirectory"))
    }

    fn list_current_files(&mut self) -> Result<Vec<RemoteEntry>, FileError> {
        Err(FileError::NotSupported("listFiles"))
    }
}
