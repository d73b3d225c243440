//! Authenticated session ownership.
//!
//! [`SessionManager`] holds at most one authenticated session per adapter.
//! The session is opened lazily by [`SessionManager::ensure()`], reused by
//! every later call, and logged off by [`SessionManager::close()`] or when
//! the manager is dropped.
//!
//! The manager takes `&mut self` and has no internal locking; callers that
//! share an adapter across threads must serialize access (see
//! [`ShareFileBrowser`](crate::files::browser::ShareFileBrowser)).

use tracing::{debug, info, warn};

use crate::client::{Connection, DiskShare, Session, ShareClient};
use crate::config::SmbConfig;
use crate::errors::{FileError, SessionError};

/// State of an established session.
struct SessionState {
    /// Kept alive for as long as the session is in use.
    _connection: Box<dyn Connection>,
    session: Box<dyn Session>,
    host: String,
}

/// Owns the share client and the adapter's single session.
pub struct SessionManager {
    client: Box<dyn ShareClient>,
    state: Option<SessionState>,
}

impl SessionManager {
    pub fn new(client: Box<dyn ShareClient>) -> Self {
        Self {
            client,
            state: None,
        }
    }

    /// Whether an authenticated session is currently held.
    pub fn is_established(&self) -> bool {
        self.state.is_some()
    }

    /// Return the session, connecting and authenticating first if needed.
    ///
    /// On failure no session is stored, so the next call retries.
    pub fn ensure(&mut self, config: &SmbConfig) -> Result<&dyn Session, SessionError> {
        let state = match self.state.take() {
            Some(state) => state,
            None => establish(self.client.as_ref(), config)?,
        };
        Ok(self.state.insert(state).session.as_ref())
    }

    /// Connect the configured share on the (possibly new) session.
    ///
    /// Share handles are cheap and are not cached.
    pub fn connect_share(&mut self, config: &SmbConfig) -> Result<Box<dyn DiskShare>, FileError> {
        let session = self.ensure(config)?;
        session
            .connect_share(&config.share)
            .map_err(|e| FileError::failed("Cannot connect share", config.share.as_str(), e))
    }

    /// Log off the current session, if any.
    ///
    /// A logoff failure is logged; the session is discarded either way.
    pub fn close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        match state.session.logoff() {
            Ok(()) => debug!("Logged off session on {}", state.host),
            Err(e) => warn!("Logoff from {} failed: {e}", state.host),
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}

fn establish(client: &dyn ShareClient, config: &SmbConfig) -> Result<SessionState, SessionError> {
    let host = config.host.clone();
    debug!("Connecting to {host}");
    let connection = client
        .connect(&host)
        .map_err(|source| SessionError::ConnectFailed {
            host: host.clone(),
            source,
        })?;

    let session = connection
        .authenticate(&config.credentials())
        .map_err(|source| SessionError::AuthenticationFailed {
            username: config.username.clone(),
            host: host.clone(),
            source,
        })?;

    info!("Authenticated {} on {host}", display_user(config));
    Ok(SessionState {
        _connection: connection,
        session,
        host,
    })
}

fn display_user(config: &SmbConfig) -> String {
    match (config.domain.is_empty(), config.username.is_empty()) {
        (_, true) => "anonymous".to_string(),
        (true, false) => config.username.clone(),
        (false, false) => format!("{}\\{}", config.domain, config.username),
    }
}
