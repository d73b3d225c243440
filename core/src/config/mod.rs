pub mod expand;

use serde::{Deserialize, Serialize};

use crate::client::Credentials;
use crate::errors::ConfigError;

/// Create disposition used when storing a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreDisposition {
    /// Fail if the destination already exists.
    #[default]
    Create,
    /// Create the destination, or truncate it if it exists.
    Overwrite,
}

/// Endpoint configuration for one SMB share.
///
/// - `path`: base directory inside the share that stored files land in.
/// - `buffer_size`: copy buffer hint for retrieval (defaults to 128 KiB).
/// - `store_disposition`: defaults to [`StoreDisposition::Create`].
/// - `keep_last_modified`: copy the work item's modification time onto
///   stored files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmbConfig {
    pub host: String,
    pub share: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default)]
    pub store_disposition: StoreDisposition,
    #[serde(default)]
    pub keep_last_modified: bool,
}

impl Default for SmbConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            share: String::new(),
            path: String::new(),
            username: String::new(),
            password: String::new(),
            domain: String::new(),
            buffer_size: default_buffer_size(),
            store_disposition: StoreDisposition::default(),
            keep_last_modified: false,
        }
    }
}

impl SmbConfig {
    /// Parse endpoint settings JSON.
    pub fn from_settings(settings: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(settings).map_err(|e| ConfigError {
            field: "settings".to_string(),
            message: e.to_string(),
        })
    }

    /// Return a copy with all `${env:...}` placeholders expanded.
    pub fn expand(mut self) -> Self {
        self.host = expand::expand_env_placeholders(&self.host);
        self.share = expand::expand_env_placeholders(&self.share);
        self.path = expand::expand_env_placeholders(&self.path);
        self.username = expand::expand_env_placeholders(&self.username);
        self.password = expand::expand_env_placeholders(&self.password);
        self.domain = expand::expand_env_placeholders(&self.domain);
        self
    }

    /// Check the settings, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: &str| {
            errors.push(ConfigError {
                field: field.to_string(),
                message: message.to_string(),
            });
        };

        if self.host.trim().is_empty() {
            push("host", "Host must not be empty");
        }
        if self.share.trim().is_empty() {
            push("share", "Share must not be empty");
        } else if self.share.contains(['/', '\\']) {
            push("share", "Share must be a single name without separators");
        }
        if self.buffer_size == 0 {
            push("bufferSize", "Buffer size must be greater than zero");
        }
        errors
    }

    /// Human-readable location of a file on this endpoint, used in messages.
    ///
    /// Always uses forward slashes: `//host/share/name`.
    pub fn smb_host_path(&self, name: &str) -> String {
        format!("//{}/{}/{}", self.host, self.share, name).replace('\\', "/")
    }

    /// Credentials for session authentication.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            domain: self.domain.clone(),
        }
    }
}

// --- Default value functions ---

fn default_buffer_size() -> usize {
    128 * 1024
}
