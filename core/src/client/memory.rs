//! In-process share client.
//!
//! [`MemoryShareClient`] serves one host with any number of shares, each a
//! directory tree held in memory. It follows the same rules a real server
//! enforces (parents must exist, create dispositions, access masks) and
//! records connects, logoffs and directory creations so callers can assert
//! on the traffic an adapter produced.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::ClientError;
use crate::files::copy::CopySource;
use crate::files::path::split_components;

use super::{
    AccessMask, Connection, CreateDisposition, Credentials, DirectoryEntry, DiskShare,
    OpenOptions, RemoteFile, Session, ShareClient, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_NORMAL,
};

#[derive(Debug, Clone)]
enum Node {
    Directory { modified: i64 },
    File { data: Vec<u8>, modified: i64 },
}

/// A share's tree, keyed by backslash-joined component path. The root
/// (`""`) is implicit.
type Tree = BTreeMap<String, Node>;

#[derive(Default)]
struct ServerState {
    reachable: bool,
    users: HashMap<String, String>,
    shares: HashMap<String, Tree>,
    connect_count: usize,
    logoff_count: usize,
    mkdir_log: Vec<String>,
    failing_mkdirs: HashSet<String>,
    failing_reads: HashSet<String>,
    failing_logoffs: bool,
}

/// In-memory share server and client in one.
///
/// Clones share the same server state.
#[derive(Clone)]
pub struct MemoryShareClient {
    host: String,
    state: Arc<Mutex<ServerState>>,
}

impl MemoryShareClient {
    /// A reachable server named `host` with no shares and no users.
    ///
    /// While no users are registered any credentials are accepted.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            state: Arc::new(Mutex::new(ServerState {
                reachable: true,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        lock(&self.state)
    }

    pub fn add_user(&self, username: &str, password: &str) {
        self.lock()
            .users
            .insert(username.to_string(), password.to_string());
    }

    pub fn add_share(&self, name: &str) {
        self.lock().shares.entry(name.to_string()).or_default();
    }

    /// Make connection attempts fail (or succeed again).
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Create a directory and all its parents.
    pub fn create_dir_all(&self, share: &str, path: &str) {
        let mut state = self.lock();
        let tree = state.shares.entry(share.to_string()).or_default();
        let components = split_components(path);
        for depth in 1..=components.len() {
            tree.entry(components[..depth].join("\\"))
                .or_insert(Node::Directory {
                    modified: now_millis(),
                });
        }
    }

    /// Store a file, creating parent directories.
    pub fn put_file(&self, share: &str, path: &str, data: &[u8]) {
        self.put_file_modified(share, path, data, now_millis());
    }

    /// Store a file with an explicit last write time.
    pub fn put_file_modified(&self, share: &str, path: &str, data: &[u8], modified: i64) {
        let key = key(path);
        if let Some((parent, _)) = key.rsplit_once('\\') {
            self.create_dir_all(share, parent);
        }
        self.lock()
            .shares
            .entry(share.to_string())
            .or_default()
            .insert(
                key,
                Node::File {
                    data: data.to_vec(),
                    modified,
                },
            );
    }

    /// Contents of a file, `None` if it is missing or a directory.
    pub fn file_contents(&self, share: &str, path: &str) -> Option<Vec<u8>> {
        match self.lock().shares.get(share)?.get(&key(path))? {
            Node::File { data, .. } => Some(data.clone()),
            Node::Directory { .. } => None,
        }
    }

    /// Last write time of a file or directory.
    pub fn last_write_time(&self, share: &str, path: &str) -> Option<i64> {
        match self.lock().shares.get(share)?.get(&key(path))? {
            Node::File { modified, .. } | Node::Directory { modified } => Some(*modified),
        }
    }

    pub fn is_directory(&self, share: &str, path: &str) -> bool {
        let key = key(path);
        let state = self.lock();
        let Some(tree) = state.shares.get(share) else {
            return false;
        };
        key.is_empty() || matches!(tree.get(&key), Some(Node::Directory { .. }))
    }

    /// Make `mkdir` of this path fail with access denied.
    pub fn fail_mkdir_at(&self, path: &str) {
        self.lock().failing_mkdirs.insert(key(path));
    }

    /// Make reads of this file fail with a connection reset.
    pub fn fail_reads_of(&self, path: &str) {
        self.lock().failing_reads.insert(key(path));
    }

    /// Make every logoff fail with a protocol error.
    pub fn fail_logoffs(&self) {
        self.lock().failing_logoffs = true;
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connect_count
    }

    pub fn logoff_count(&self) -> usize {
        self.lock().logoff_count
    }

    /// Every directory created through `mkdir`, in call order.
    pub fn mkdir_log(&self) -> Vec<String> {
        self.lock().mkdir_log.clone()
    }
}

impl ShareClient for MemoryShareClient {
    fn connect(&self, host: &str) -> Result<Box<dyn Connection>, ClientError> {
        let mut state = self.lock();
        if !state.reachable || !host.eq_ignore_ascii_case(&self.host) {
            return Err(ClientError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{host}: connection refused"),
            )));
        }
        state.connect_count += 1;
        Ok(Box::new(MemoryConnection {
            state: self.state.clone(),
        }))
    }
}

struct MemoryConnection {
    state: Arc<Mutex<ServerState>>,
}

impl Connection for MemoryConnection {
    fn authenticate(&self, credentials: &Credentials) -> Result<Box<dyn Session>, ClientError> {
        let state = lock(&self.state);
        if !state.users.is_empty()
            && state.users.get(&credentials.username) != Some(&credentials.password)
        {
            return Err(ClientError::AccessDenied(format!(
                "logon failure for {}",
                credentials.username
            )));
        }
        Ok(Box::new(MemorySession {
            state: self.state.clone(),
        }))
    }
}

struct MemorySession {
    state: Arc<Mutex<ServerState>>,
}

impl Session for MemorySession {
    fn connect_share(&self, name: &str) -> Result<Box<dyn DiskShare>, ClientError> {
        if !lock(&self.state).shares.contains_key(name) {
            return Err(ClientError::NotFound(format!("share {name}")));
        }
        Ok(Box::new(MemoryShare {
            state: self.state.clone(),
            share: name.to_string(),
        }))
    }

    fn logoff(&self) -> Result<(), ClientError> {
        let mut state = lock(&self.state);
        if state.failing_logoffs {
            return Err(ClientError::Protocol("logoff rejected".to_string()));
        }
        state.logoff_count += 1;
        Ok(())
    }
}

struct MemoryShare {
    state: Arc<Mutex<ServerState>>,
    share: String,
}

impl MemoryShare {
    fn with_tree<T>(
        &self,
        f: impl FnOnce(&mut Tree, &mut ServerState) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let mut tree = state
            .shares
            .remove(&self.share)
            .ok_or_else(|| ClientError::NotFound(format!("share {}", self.share)))?;
        let result = f(&mut tree, state);
        state.shares.insert(self.share.clone(), tree);
        result
    }
}

fn parent_exists(tree: &Tree, key: &str) -> bool {
    match key.rsplit_once('\\') {
        None => true,
        Some((parent, _)) => matches!(tree.get(parent), Some(Node::Directory { .. })),
    }
}

impl DiskShare for MemoryShare {
    fn file_exists(&self, path: &str) -> Result<bool, ClientError> {
        let key = key(path);
        self.with_tree(|tree, _| Ok(matches!(tree.get(&key), Some(Node::File { .. }))))
    }

    fn folder_exists(&self, path: &str) -> Result<bool, ClientError> {
        let key = key(path);
        self.with_tree(|tree, _| {
            Ok(key.is_empty() || matches!(tree.get(&key), Some(Node::Directory { .. })))
        })
    }

    fn mkdir(&self, path: &str) -> Result<(), ClientError> {
        let key = key(path);
        self.with_tree(|tree, state| {
            if key.is_empty() || tree.contains_key(&key) {
                return Err(ClientError::AlreadyExists(path.to_string()));
            }
            if state.failing_mkdirs.contains(&key) {
                return Err(ClientError::AccessDenied(path.to_string()));
            }
            if !parent_exists(tree, &key) {
                return Err(ClientError::NotFound(format!("parent of {path}")));
            }
            tree.insert(
                key.clone(),
                Node::Directory {
                    modified: now_millis(),
                },
            );
            state.mkdir_log.push(key);
            Ok(())
        })
    }

    fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, ClientError> {
        let key = key(path);
        self.with_tree(|tree, _| {
            let own_modified = match tree.get(&key) {
                Some(Node::Directory { modified }) => *modified,
                None if key.is_empty() => 0,
                _ => return Err(ClientError::NotFound(path.to_string())),
            };

            let marker = |name: &str| DirectoryEntry {
                file_name: name.to_string(),
                attributes: FILE_ATTRIBUTE_DIRECTORY,
                end_of_file: 0,
                last_write_time: own_modified,
            };
            let mut entries = vec![marker("."), marker("..")];

            for (child, node) in tree.iter() {
                let name = match child.rsplit_once('\\') {
                    Some((parent, name)) if parent == key => name,
                    None if key.is_empty() => child.as_str(),
                    _ => continue,
                };
                entries.push(match node {
                    Node::Directory { modified } => DirectoryEntry {
                        file_name: name.to_string(),
                        attributes: FILE_ATTRIBUTE_DIRECTORY,
                        end_of_file: 0,
                        last_write_time: *modified,
                    },
                    Node::File { data, modified } => DirectoryEntry {
                        file_name: name.to_string(),
                        attributes: FILE_ATTRIBUTE_NORMAL,
                        end_of_file: data.len() as u64,
                        last_write_time: *modified,
                    },
                });
            }
            Ok(entries)
        })
    }

    fn open_file(
        &self,
        path: &str,
        options: OpenOptions,
    ) -> Result<Box<dyn RemoteFile>, ClientError> {
        let key = key(path);
        self.with_tree(|tree, _| {
            match (tree.get(&key), options.disposition) {
                (Some(Node::Directory { .. }), _) => {
                    return Err(ClientError::AccessDenied(format!("{path} is a directory")));
                }
                (None, _) if key.is_empty() => {
                    return Err(ClientError::AccessDenied(format!("{path} is a directory")));
                }
                (Some(Node::File { .. }), CreateDisposition::Open) => {}
                (None, CreateDisposition::Open) => {
                    return Err(ClientError::NotFound(path.to_string()));
                }
                (Some(Node::File { .. }), CreateDisposition::Create) => {
                    return Err(ClientError::AlreadyExists(path.to_string()));
                }
                (_, CreateDisposition::Create | CreateDisposition::OverwriteIf) => {
                    if !parent_exists(tree, &key) {
                        return Err(ClientError::NotFound(format!("parent of {path}")));
                    }
                    tree.insert(
                        key.clone(),
                        Node::File {
                            data: Vec::new(),
                            modified: now_millis(),
                        },
                    );
                }
            }
            Ok(())
        })?;

        Ok(Box::new(MemoryFile {
            state: self.state.clone(),
            share: self.share.clone(),
            key,
            access: options.access,
        }))
    }

    fn set_last_write_time(&self, path: &str, epoch_millis: i64) -> Result<(), ClientError> {
        let key = key(path);
        self.with_tree(|tree, _| match tree.get_mut(&key) {
            Some(Node::File { modified, .. } | Node::Directory { modified }) => {
                *modified = epoch_millis;
                Ok(())
            }
            None => Err(ClientError::NotFound(path.to_string())),
        })
    }
}

struct MemoryFile {
    state: Arc<Mutex<ServerState>>,
    share: String,
    key: String,
    access: AccessMask,
}

impl RemoteFile for MemoryFile {
    fn input_stream(&mut self) -> Result<Box<dyn CopySource + Send + '_>, ClientError> {
        if self.access != AccessMask::GenericRead {
            return Err(ClientError::AccessDenied(format!(
                "{} not opened for reading",
                self.key
            )));
        }
        let state = lock(&self.state);
        let data = match state.shares.get(&self.share).and_then(|t| t.get(&self.key)) {
            Some(Node::File { data, .. }) => data.clone(),
            _ => return Err(ClientError::NotFound(self.key.clone())),
        };
        Ok(Box::new(MemoryReader {
            data: Cursor::new(data),
            fail: state.failing_reads.contains(&self.key),
        }))
    }

    fn output_stream(&mut self) -> Result<Box<dyn Write + Send + '_>, ClientError> {
        if self.access != AccessMask::GenericWrite {
            return Err(ClientError::AccessDenied(format!(
                "{} not opened for writing",
                self.key
            )));
        }
        Ok(Box::new(MemoryWriter { file: &*self }))
    }
}

/// Reads behave like a network stream: the size is never announced.
struct MemoryReader {
    data: Cursor<Vec<u8>>,
    fail: bool,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        self.data.read(buf)
    }
}

impl CopySource for MemoryReader {}

/// Appends straight into the stored file.
struct MemoryWriter<'a> {
    file: &'a MemoryFile,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = lock(&self.file.state);
        match state
            .shares
            .get_mut(&self.file.share)
            .and_then(|t| t.get_mut(&self.file.key))
        {
            Some(Node::File { data, modified }) => {
                data.extend_from_slice(buf);
                *modified = now_millis();
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was removed", self.file.key),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn lock(state: &Mutex<ServerState>) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(path: &str) -> String {
    split_components(path).join("\\")
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
