//! Error types for the smbridge core crate.
//!
//! Share-client failures surface as [`ClientError`]; the session layer and
//! the file-operations facade wrap them into [`SessionError`] and
//! [`FileError`] so that every message carries the host or path involved
//! together with the underlying cause.

use thiserror::Error;

/// Top-level error type encompassing all core error categories.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A session-related error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A file-operation error.
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// A configuration error (invalid values, missing fields, parse failures).
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a share client implementation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The remote path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote path exists and the create disposition forbids reuse.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The server refused access (bad credentials, ACLs, share permissions).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Any other protocol-level failure reported by the server.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport or stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to establishing the authenticated session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The transport connection to the host could not be opened.
    #[error("Connection to {host} failed: {source}")]
    ConnectFailed {
        host: String,
        #[source]
        source: ClientError,
    },

    /// The host rejected the supplied credentials.
    #[error("Authentication of {username} on {host} failed: {source}")]
    AuthenticationFailed {
        username: String,
        host: String,
        #[source]
        source: ClientError,
    },
}

/// Errors related to file operations against the share.
#[derive(Error, Debug)]
pub enum FileError {
    /// No authenticated session could be established.
    #[error("Session unavailable: {0}")]
    SessionUnavailable(#[from] SessionError),

    /// A remote call failed against an established session.
    #[error("{action}: {path}: {source}")]
    OperationFailed {
        action: &'static str,
        path: String,
        #[source]
        source: ClientError,
    },

    /// The work item carries no body to store.
    #[error("No body to store for {0}")]
    MissingBody(String),

    /// The endpoint passed to `set_endpoint` failed validation.
    #[error("Invalid endpoint: {}", describe_problems(.0))]
    InvalidEndpoint(Vec<ConfigError>),

    /// An operation was invoked before `set_endpoint`.
    #[error("No endpoint configured")]
    NotConfigured,

    /// The operation is part of the capability contract but not implemented
    /// by this adapter.
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    /// A low-level I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_problems(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FileError {
    pub(crate) fn failed(
        action: &'static str,
        path: impl Into<String>,
        source: impl Into<ClientError>,
    ) -> Self {
        FileError::OperationFailed {
            action,
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A single configuration validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// camelCase name of the offending setting.
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}
