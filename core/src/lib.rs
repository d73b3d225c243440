//! File operations over SMB shares for integration pipelines.
//!
//! [`files::SmbFileOperations`] implements the pipeline-facing
//! [`files::FileOperations`] contract on top of a [`client::ShareClient`].
//! [`files::ShareFileBrowser`] exposes the same adapter to async callers.

pub mod client;
pub mod config;
pub mod errors;
pub mod files;
pub mod session;
