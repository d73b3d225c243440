//! Component-wise directory creation on a share.

use tracing::debug;

use crate::client::DiskShare;
use crate::errors::FileError;

use super::path::{split_components, strip_share_name};

/// Create `directory` and every missing ancestor, root first.
///
/// A leading share segment is stripped before walking. Existing components are
/// skipped, so repeated calls create nothing. The first failing check or
/// `mkdir` aborts the walk; components created before it are kept.
///
/// Returns the number of directories created.
pub fn build_directory(
    share: &dyn DiskShare,
    share_name: &str,
    directory: &str,
) -> Result<usize, FileError> {
    let relative = strip_share_name(directory, share_name, true);
    let components = split_components(&relative);

    let mut created = 0;
    for depth in 1..=components.len() {
        let partial = components[..depth].join("\\");
        let exists = share
            .folder_exists(&partial)
            .map_err(|e| FileError::failed("Cannot check directory", partial.as_str(), e))?;
        if exists {
            continue;
        }
        share
            .mkdir(&partial)
            .map_err(|e| FileError::failed("Cannot create directory", partial.as_str(), e))?;
        debug!("Created directory {partial}");
        created += 1;
    }
    Ok(created)
}
